//! Cryptographic functions for finvault
//!
//! Provides AES-256-GCM envelopes keyed by PBKDF2-HMAC-SHA256 for encrypted
//! exports, plus passphrase verifiers. Passphrases, derived keys and
//! plaintext are never logged.

pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;
pub mod verifier;

pub use encryption::{
    decrypt, decrypt_string, encrypt, encrypt_string, open_envelope, seal_envelope,
};
pub use key_derivation::{SealingKey, PBKDF2_ITERATIONS};
pub use secure_memory::Passphrase;
pub use verifier::{hash_passphrase, verify_passphrase};
