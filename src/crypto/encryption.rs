//! Passphrase envelopes
//!
//! An envelope is `[16B salt][12B nonce][ciphertext || 16B tag]`, carried as
//! standard base64 in JSON documents. Opening re-derives the key from the
//! embedded salt. Every failure, whether a wrong passphrase, a truncated or
//! corrupted envelope or bad base64, is the same `VaultError::Decryption`.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{VaultError, VaultResult};

use super::key_derivation::{SealingKey, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use super::Passphrase;

/// Smallest possible envelope: salt, nonce and tag around an empty message
pub const MIN_ENVELOPE_SIZE: usize = SALT_SIZE + NONCE_SIZE + TAG_SIZE;

/// Encrypt under a fresh salt and nonce, returning raw envelope bytes
pub fn seal_envelope(plaintext: &[u8], passphrase: &Passphrase) -> VaultResult<Vec<u8>> {
    SealingKey::generate(passphrase).seal(plaintext)
}

/// Decrypt raw envelope bytes
pub fn open_envelope(envelope: &[u8], passphrase: &Passphrase) -> VaultResult<Vec<u8>> {
    if envelope.len() < MIN_ENVELOPE_SIZE {
        return Err(VaultError::Decryption);
    }

    let (salt_bytes, rest) = envelope.split_at(SALT_SIZE);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(salt_bytes);
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(nonce_bytes);

    SealingKey::derive(passphrase, salt).open(&nonce, ciphertext)
}

/// Encrypt and base64-encode
pub fn encrypt(plaintext: &[u8], passphrase: &Passphrase) -> VaultResult<String> {
    Ok(STANDARD.encode(seal_envelope(plaintext, passphrase)?))
}

/// Decode and decrypt a base64 envelope
pub fn decrypt(envelope: &str, passphrase: &Passphrase) -> VaultResult<Vec<u8>> {
    let bytes = STANDARD
        .decode(envelope.trim())
        .map_err(|_| VaultError::Decryption)?;
    open_envelope(&bytes, passphrase)
}

/// Encrypt a string
pub fn encrypt_string(plaintext: &str, passphrase: &Passphrase) -> VaultResult<String> {
    encrypt(plaintext.as_bytes(), passphrase)
}

/// Decrypt to a string
pub fn decrypt_string(envelope: &str, passphrase: &Passphrase) -> VaultResult<String> {
    let plaintext = decrypt(envelope, passphrase)?;
    String::from_utf8(plaintext).map_err(|_| VaultError::Decryption)
}
