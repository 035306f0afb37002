//! Basket snapshot model.
//!
//! A basket is a value object: the full set of (product, quantity) entries
//! owned by one customer. Updates replace the snapshot wholesale; there is
//! no server-side merge.
//!
//! Invariants enforced at construction:
//! - every entry has quantity >= 1 (a product at quantity 0 is absent)
//! - product IDs within a snapshot are unique
//! - the owner ID is validated (non-empty, storage-key safe)

use std::collections::BTreeMap;
use std::fmt;

use pannier_core::OwnerId;

use crate::error::{BasketError, Result};

/// A product identifier as issued by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductId(u64);

impl ProductId {
    /// Wraps a raw catalog product ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric ID.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The items of a basket: product -> quantity.
///
/// An ordered map, so iteration (and everything derived from it:
/// serialization, delta computation, logging) is deterministic.
pub type BasketItems = BTreeMap<ProductId, u32>;

/// One line of an incoming basket update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasketLine {
    /// The product being put in the basket.
    pub product_id: ProductId,
    /// Desired quantity, must be >= 1.
    pub quantity: u32,
}

impl BasketLine {
    /// Creates a basket line.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// A customer's basket at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketSnapshot {
    owner: OwnerId,
    items: BasketItems,
}

impl BasketSnapshot {
    /// Creates an empty basket for an owner.
    #[must_use]
    pub const fn empty(owner: OwnerId) -> Self {
        Self {
            owner,
            items: BasketItems::new(),
        }
    }

    /// Builds a snapshot from incoming update lines.
    ///
    /// Duplicate product IDs are rejected rather than merged: a client
    /// sending the same product twice is buggy, and silently folding the
    /// lines together would make the reported delta depend on which line
    /// "won".
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::Validation`] when a line has quantity 0 or
    /// repeats a product ID already seen in the update.
    pub fn from_lines(owner: OwnerId, lines: &[BasketLine]) -> Result<Self> {
        let mut items = BasketItems::new();
        for line in lines {
            if line.quantity == 0 {
                return Err(BasketError::validation(format!(
                    "quantity for product {} must be at least 1; omit the product to remove it",
                    line.product_id
                )));
            }
            if items.insert(line.product_id, line.quantity).is_some() {
                return Err(BasketError::validation(format!(
                    "product {} appears more than once in the update",
                    line.product_id
                )));
            }
        }
        Ok(Self { owner, items })
    }

    /// Rebuilds a snapshot from already-validated parts.
    ///
    /// Used by the store when decoding persisted snapshots; construction
    /// from client input goes through [`Self::from_lines`].
    #[must_use]
    pub const fn from_parts(owner: OwnerId, items: BasketItems) -> Self {
        Self { owner, items }
    }

    /// The owner this snapshot belongs to.
    #[must_use]
    pub const fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// The item map.
    #[must_use]
    pub const fn items(&self) -> &BasketItems {
        &self.items
    }

    /// Number of distinct products in the basket.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of all quantities in the basket.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.values().map(|&q| u64::from(q)).sum()
    }

    /// True when the basket holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
