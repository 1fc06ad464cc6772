//! Custom error types for finvault
//!
//! This module defines the error hierarchy for the store, the backup codec and
//! the crypto envelope using thiserror for ergonomic error definitions.

use thiserror::Error;

/// The main error type for finvault operations
#[derive(Error, Debug)]
pub enum VaultError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Backup payload was produced by an unsupported format version
    #[error("Unsupported backup version: expected {expected}, got {found}")]
    VersionMismatch { expected: u32, found: i64 },

    /// Backup payload failed to parse or has the wrong shape
    #[error("Malformed backup payload: {0}")]
    MalformedPayload(String),

    /// Storage engine errors (lock poisoning, disk failures, schema problems)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Wrong passphrase, corrupted or tampered ciphertext.
    ///
    /// Deliberately carries no detail.
    #[error("Decryption failed")]
    Decryption,
}

impl VaultError {
    /// Create a "not found" error for any entity table
    pub fn not_found(entity_type: &'static str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            identifier: identifier.into(),
        }
    }

    /// Create a "duplicate" error for any entity table
    pub fn duplicate(entity_type: &'static str, identifier: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type,
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a storage engine error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for finvault operations
pub type VaultResult<T> = Result<T, VaultError>;
