//! Secure memory handling for passphrases
//!
//! `Passphrase` zeroizes its buffer on drop and never prints its contents,
//! so it can be passed through logging and error paths safely.

use std::fmt;

use zeroize::Zeroizing;

/// A user passphrase
///
/// The bytes are wiped when the value is dropped.
pub struct Passphrase {
    inner: Zeroizing<String>,
}

impl Passphrase {
    pub fn new(s: impl Into<String>) -> Self {
        Self {
            inner: Zeroizing::new(s.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<String> for Passphrase {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Passphrase {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq for Passphrase {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Passphrase {}

// Don't print the contents in Debug output
impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passphrase")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl fmt::Display for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {} bytes]", self.inner.len())
    }
}
