//! Key derivation using PBKDF2-HMAC-SHA256
//!
//! Stretches a passphrase and a random salt into a one-shot AES-256-GCM key.
//! Only the salt travels with the ciphertext; the iteration count is the
//! global `PBKDF2_ITERATIONS`.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{VaultError, VaultResult};

use super::Passphrase;

/// PBKDF2 rounds used for every envelope and verifier
pub const PBKDF2_ITERATIONS: u32 = 310_000;

/// Size of the derived AES-256 key in bytes
pub const KEY_SIZE: usize = 32;
/// Size of the PBKDF2 salt in bytes
pub const SALT_SIZE: usize = 16;
/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;
/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Fresh random salt
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// A derived encryption key bound to the salt it came from.
///
/// Not `Clone`: `seal` consumes the key and draws its own nonce, so a key
/// encrypts exactly one message.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SealingKey {
    key: [u8; KEY_SIZE],
    salt: [u8; SALT_SIZE],
}

impl SealingKey {
    /// Derive a key for a new message under a fresh salt
    pub fn generate(passphrase: &Passphrase) -> Self {
        Self::derive(passphrase, generate_salt())
    }

    /// Re-derive the key for a stored salt
    pub fn derive(passphrase: &Passphrase, salt: [u8; SALT_SIZE]) -> Self {
        let mut key = [0u8; KEY_SIZE];
        pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut key);
        Self { key, salt }
    }

    pub fn salt(&self) -> &[u8; SALT_SIZE] {
        &self.salt
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }

    /// Encrypt one message into `[salt][nonce][ciphertext || tag]`
    pub fn seal(self, plaintext: &[u8]) -> VaultResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| VaultError::Validation("plaintext too large to encrypt".into()))?;

        let mut envelope = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
        envelope.extend_from_slice(&self.salt);
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&ciphertext);
        Ok(envelope)
    }

    /// Authenticate and decrypt `ciphertext || tag` under `nonce`
    pub(crate) fn open(&self, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> VaultResult<Vec<u8>> {
        self.cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| VaultError::Decryption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_passphrase_and_salt_same_key() {
        let salt = generate_salt();
        let passphrase = Passphrase::new("test_passphrase");
        let key1 = SealingKey::derive(&passphrase, salt);
        let key2 = SealingKey::derive(&passphrase, salt);
        assert_eq!(key1.key, key2.key);
    }

    #[test]
    fn test_different_passphrase_different_key() {
        let salt = generate_salt();
        let key1 = SealingKey::derive(&Passphrase::new("passphrase1"), salt);
        let key2 = SealingKey::derive(&Passphrase::new("passphrase2"), salt);
        assert_ne!(key1.key, key2.key);
    }

    #[test]
    fn test_generate_uses_fresh_salt() {
        let passphrase = Passphrase::new("same_passphrase");
        let key1 = SealingKey::generate(&passphrase);
        let key2 = SealingKey::generate(&passphrase);
        assert_ne!(key1.salt(), key2.salt());
        assert_ne!(key1.key, key2.key);
    }

    #[test]
    fn test_seal_layout() {
        let passphrase = Passphrase::new("layout");
        let key = SealingKey::generate(&passphrase);
        let salt = *key.salt();

        let envelope = key.seal(b"hello").unwrap();
        assert_eq!(envelope.len(), SALT_SIZE + NONCE_SIZE + 5 + TAG_SIZE);
        assert_eq!(&envelope[..SALT_SIZE], &salt);

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&envelope[SALT_SIZE..SALT_SIZE + NONCE_SIZE]);
        let reopened = SealingKey::derive(&passphrase, salt);
        let plaintext = reopened
            .open(&nonce, &envelope[SALT_SIZE + NONCE_SIZE..])
            .unwrap();
        assert_eq!(plaintext, b"hello");
    }
}
