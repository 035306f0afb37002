//! Basket owner identity.
//!
//! Every basket is stored under exactly one owner key, so owner identifiers
//! are validated before they ever reach the storage layer:
//! - **Storage layout**: the owner ID is embedded in the object key
//! - **Service boundaries**: mutating requests are scoped to a single owner
//!
//! # Example
//!
//! ```rust
//! use pannier_core::owner::OwnerId;
//!
//! let owner = OwnerId::new("0a3f9b42-5f1c-4d8e-9f21-7c5d11a0b9e4").unwrap();
//! assert_eq!(owner.as_str(), "0a3f9b42-5f1c-4d8e-9f21-7c5d11a0b9e4");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Maximum accepted owner ID length. Identity subjects (GUIDs, provider
/// subs, e-mail addresses) fit comfortably below this.
const MAX_OWNER_ID_LEN: usize = 128;

/// An opaque identifier for a basket owner.
///
/// Owner IDs are whatever the identity provider hands out (a `sub` claim,
/// a GUID, an e-mail during development). They must be:
/// - Non-empty
/// - At most 128 characters
/// - Limited to characters that are safe inside an object-storage key:
///   ASCII alphanumerics plus `-`, `_`, `.`, `@`, `:` and `|`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Creates a new owner ID after validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner ID is empty, too long, or contains
    /// characters that are not storage-key safe.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Creates an owner ID without validation.
    ///
    /// Intended for IDs that have already been validated, such as the
    /// owner field read back from a stored snapshot.
    #[must_use]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the owner ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates an owner ID string.
    fn validate(id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(Error::InvalidId {
                message: "owner ID cannot be empty".to_string(),
            });
        }

        if id.len() > MAX_OWNER_ID_LEN {
            return Err(Error::InvalidId {
                message: format!(
                    "owner ID is too long ({} characters, maximum {MAX_OWNER_ID_LEN})",
                    id.len()
                ),
            });
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | ':' | '|'))
        {
            return Err(Error::InvalidId {
                message: format!(
                    "owner ID '{id}' contains characters that are not storage-key safe"
                ),
            });
        }

        Ok(())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_owner_ids() {
        assert!(OwnerId::new("0a3f9b42-5f1c-4d8e-9f21-7c5d11a0b9e4").is_ok());
        assert!(OwnerId::new("auth0|64ab12cd34ef").is_ok());
        assert!(OwnerId::new("dev@example.com").is_ok());
        assert!(OwnerId::new("u1").is_ok());
    }

    #[test]
    fn invalid_owner_ids() {
        assert!(OwnerId::new("").is_err());
        assert!(OwnerId::new("has spaces").is_err());
        assert!(OwnerId::new("slash/in/key").is_err());
        assert!(OwnerId::new("back\\slash").is_err());
        assert!(OwnerId::new("a".repeat(129)).is_err());
    }

    #[test]
    fn max_length_is_accepted() {
        assert!(OwnerId::new("a".repeat(128)).is_ok());
    }

    #[test]
    fn display_round_trips() {
        let owner = OwnerId::new("customer-42").unwrap();
        assert_eq!(owner.to_string(), "customer-42");
        assert_eq!(owner.as_ref(), "customer-42");
    }
}
