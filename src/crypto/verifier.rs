//! Passphrase verifiers
//!
//! A verifier is an envelope of a fixed sentinel. Holding it lets the app
//! check a passphrase later without ever storing the passphrase or a key.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::VaultResult;

use super::encryption::{open_envelope, seal_envelope};
use super::Passphrase;

const SENTINEL: &[u8] = b"finvault-passphrase-check";

/// Produce a base64 verifier for `passphrase` under a fresh salt.
///
/// Layout before encoding: `salt (16) | nonce (12) | ciphertext + tag (16)`.
pub fn hash_passphrase(passphrase: &Passphrase) -> VaultResult<String> {
    Ok(STANDARD.encode(seal_envelope(SENTINEL, passphrase)?))
}

/// True iff `verifier` was made from `passphrase`. Never errors.
pub fn verify_passphrase(passphrase: &Passphrase, verifier: &str) -> bool {
    let Ok(bytes) = STANDARD.decode(verifier.trim()) else {
        return false;
    };
    match open_envelope(&bytes, passphrase) {
        Ok(plaintext) => plaintext == SENTINEL,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifier_accepts_right_and_rejects_wrong() {
        let right = Passphrase::new("open sesame");
        let verifier = hash_passphrase(&right).unwrap();

        assert!(verify_passphrase(&right, &verifier));
        assert!(!verify_passphrase(&Passphrase::new("open sesame!"), &verifier));
        assert!(!verify_passphrase(&Passphrase::new(""), &verifier));
    }

    #[test]
    fn test_verifiers_are_salted() {
        let passphrase = Passphrase::new("same");
        assert_ne!(
            hash_passphrase(&passphrase).unwrap(),
            hash_passphrase(&passphrase).unwrap()
        );
    }

    #[test]
    fn test_garbage_verifier_is_false() {
        let passphrase = Passphrase::new("p");
        assert!(!verify_passphrase(&passphrase, "%%%"));
        assert!(!verify_passphrase(&passphrase, ""));
        assert!(!verify_passphrase(&passphrase, &STANDARD.encode([0u8; 8])));
    }

    #[test]
    fn test_envelope_of_other_plaintext_is_not_a_verifier() {
        let passphrase = Passphrase::new("p");
        let other = STANDARD.encode(seal_envelope(b"something else", &passphrase).unwrap());
        assert!(!verify_passphrase(&passphrase, &other));
    }
}
