//! Typed storage keys for basket objects.
//!
//! Storage paths are never assembled ad hoc from strings; [`BasketKey`]
//! encodes the layout in one place so a wrong path cannot be constructed.
//!
//! # Path Format
//!
//! `baskets/{owner_id}.json`
//!
//! # Example
//!
//! ```rust
//! use pannier_core::keys::BasketKey;
//! use pannier_core::owner::OwnerId;
//!
//! let owner = OwnerId::new("customer-42").unwrap();
//! let key = BasketKey::for_owner(&owner);
//! assert_eq!(key.as_str(), "baskets/customer-42.json");
//! ```

use crate::owner::OwnerId;

/// A typed key for basket snapshot paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasketKey(String);

impl BasketKey {
    /// Prefix under which all basket snapshots live.
    pub const PREFIX: &'static str = "baskets/";

    /// Creates the storage key for an owner's basket snapshot.
    #[must_use]
    pub fn for_owner(owner: &OwnerId) -> Self {
        Self(format!("{}{}.json", Self::PREFIX, owner.as_str()))
    }

    /// Returns the underlying path string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BasketKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        let owner = OwnerId::new("customer-42").unwrap();
        let key = BasketKey::for_owner(&owner);
        assert_eq!(key.as_str(), "baskets/customer-42.json");
        assert!(key.as_str().starts_with(BasketKey::PREFIX));
    }

    #[test]
    fn distinct_owners_get_distinct_keys() {
        let a = BasketKey::for_owner(&OwnerId::new("alice").unwrap());
        let b = BasketKey::for_owner(&OwnerId::new("bob").unwrap());
        assert_ne!(a, b);
    }
}
