//! Encrypted export documents
//!
//! `{"version": 1, "encrypted": "<base64 envelope>"}` where the envelope
//! decrypts to a plaintext export document. Import only takes plaintext, so
//! an encrypted export has to pass through `decrypt_export` first.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::{self, Passphrase};
use crate::error::{VaultError, VaultResult};

use super::codec::BackupCodec;
use super::payload::SUPPORTED_VERSION;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedExport {
    pub version: u32,
    pub encrypted: String,
}

/// Wrap an already rendered plaintext export
pub fn encrypt_export(plaintext: &str, passphrase: &Passphrase) -> VaultResult<String> {
    let document = EncryptedExport {
        version: SUPPORTED_VERSION,
        encrypted: crypto::encrypt_string(plaintext, passphrase)?,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Export the whole store and encrypt it
pub fn export_encrypted(codec: &BackupCodec<'_>, passphrase: &Passphrase) -> VaultResult<String> {
    let plaintext = codec.export_json(false)?;
    encrypt_export(&plaintext, passphrase)
}

/// Recover the plaintext export document
pub fn decrypt_export(text: &str, passphrase: &Passphrase) -> VaultResult<String> {
    let document: EncryptedExport = serde_json::from_str(text)
        .map_err(|e| VaultError::MalformedPayload(format!("not an encrypted export: {}", e)))?;
    if document.version != SUPPORTED_VERSION {
        return Err(VaultError::VersionMismatch {
            expected: SUPPORTED_VERSION,
            found: i64::from(document.version),
        });
    }
    crypto::decrypt_string(&document.encrypted, passphrase)
}

/// Whether a document looks like an encrypted export
pub fn is_encrypted(text: &str) -> bool {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| value.get("encrypted").map(Value::is_string))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::VaultPaths;
    use crate::models::{Account, AccountKind};
    use crate::storage::Store;
    use tempfile::TempDir;

    #[test]
    fn test_encrypted_export_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::open(VaultPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        let account = Account::new("Checking", AccountKind::Checking, "USD");
        store.add(account.clone()).unwrap();

        let codec = BackupCodec::new(&store);
        let passphrase = Passphrase::new("backup pass");
        let document = export_encrypted(&codec, &passphrase).unwrap();

        assert!(is_encrypted(&document));
        assert!(!document.contains("Checking"));

        let plaintext = decrypt_export(&document, &passphrase).unwrap();
        assert!(!is_encrypted(&plaintext));

        codec.wipe_all().unwrap();
        codec.import_json(&plaintext).unwrap();
        assert_eq!(store.list::<Account>().unwrap().len(), 1);
    }

    #[test]
    fn test_wrong_passphrase_is_decryption_error() {
        let document = encrypt_export("{}", &Passphrase::new("right")).unwrap();
        let err = decrypt_export(&document, &Passphrase::new("wrong")).unwrap_err();
        assert!(matches!(err, VaultError::Decryption));
    }

    #[test]
    fn test_not_an_encrypted_document() {
        let err = decrypt_export(r#"{"version": 1}"#, &Passphrase::new("p")).unwrap_err();
        assert!(matches!(err, VaultError::MalformedPayload(_)));

        let err = decrypt_export(r#"{"version": 3, "encrypted": "AAAA"}"#, &Passphrase::new("p"))
            .unwrap_err();
        assert!(matches!(err, VaultError::VersionMismatch { found: 3, .. }));

        assert!(!is_encrypted("not json"));
        assert!(!is_encrypted(r#"{"encrypted": 5}"#));
    }
}
