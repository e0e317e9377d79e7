//! Password digests.

use crate::validation::{validate_password, ValidationResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Lowercase hex SHA-256 digest of a password. Plaintext never reaches the
/// stores, only this value is persisted and compared.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn from_plaintext(plain: &str) -> ValidationResult<Self> {
        validate_password(plain)?;
        Ok(Self(format!("{:x}", Sha256::digest(plain.as_bytes()))))
    }

    /// Wraps a digest that was already computed, e.g. one read back from
    /// storage. The value is lowercased.
    pub fn from_hex(hex: impl AsRef<str>) -> Self {
        Self(hex.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn digests_known_passwords() {
        assert_eq!(
            PasswordDigest::from_plaintext("hello").unwrap().as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            PasswordDigest::from_plaintext("test").unwrap().as_str(),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn same_plaintext_same_digest() {
        let a = PasswordDigest::from_plaintext("123").unwrap();
        let b = PasswordDigest::from_plaintext("123").unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a,
            PasswordDigest::from_hex(
                "A665A45920422F9D417E4867EFDC4FB8A04A1F3FFF1FA07E998E86F7F7A27AE3"
            )
        );
    }

    #[test]
    fn rejects_overlong_and_empty_passwords() {
        assert!(matches!(
            PasswordDigest::from_plaintext(&"p".repeat(65)),
            Err(ValidationError::TooLong { field: "password", .. })
        ));
        assert!(PasswordDigest::from_plaintext("").is_err());
    }

    #[test]
    fn debug_does_not_leak_digest() {
        let digest = PasswordDigest::from_plaintext("hello").unwrap();
        assert!(!format!("{:?}", digest).contains("2cf24dba"));
    }
}
