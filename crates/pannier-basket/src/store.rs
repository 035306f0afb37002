//! Basket snapshot persistence.
//!
//! Snapshots are whole JSON objects at `baskets/{owner_id}.json`, one per
//! owner. The persisted layout is the owner plus a list of
//! (`product_id`, `quantity`) pairs:
//!
//! ```json
//! {
//!   "owner_id": "customer-42",
//!   "items": [
//!     { "product_id": 1, "quantity": 2 },
//!     { "product_id": 2, "quantity": 1 }
//!   ]
//! }
//! ```
//!
//! Writes are unconditional (last-write-wins per owner key). The backend
//! contract also supports conditional writes keyed on the object version
//! (`WritePrecondition::MatchesVersion`), so a caller that needs
//! read-modify-write atomicity can layer compare-and-swap on top of
//! [`StorageBackend::put`] without changing this store.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use pannier_core::{BasketKey, OwnerId, StorageBackend, WritePrecondition, WriteResult};

use crate::error::{BasketError, Result};
use crate::model::{BasketLine, BasketSnapshot, ProductId};

/// Persisted form of a basket snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct StoredBasket {
    owner_id: String,
    items: Vec<StoredItem>,
}

/// Persisted form of one basket entry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredItem {
    product_id: u64,
    quantity: u32,
}

/// Key-value store for basket snapshots.
///
/// A thin layer over the storage backend: it owns the key layout and the
/// JSON codec, nothing else. Absent baskets are a normal result, never an
/// error.
#[derive(Clone)]
pub struct BasketStore {
    backend: Arc<dyn StorageBackend>,
}

impl BasketStore {
    /// Creates a store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Reads the snapshot for an owner.
    ///
    /// Returns `None` when the owner has no stored basket.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails or the stored payload does
    /// not decode.
    pub async fn read(&self, owner: &OwnerId) -> Result<Option<BasketSnapshot>> {
        let key = BasketKey::for_owner(owner);
        match self.backend.get(key.as_str()).await {
            Ok(bytes) => Ok(Some(decode(&bytes)?)),
            Err(pannier_core::Error::NotFound(_)) => Ok(None),
            Err(e) => Err(BasketError::Storage {
                message: format!("failed to read basket for '{owner}': {e}"),
            }),
        }
    }

    /// Replaces the snapshot for its owner (create-or-overwrite).
    ///
    /// Returns the stored snapshot when the write was applied, `None` when
    /// the backend refused it.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the backend fails.
    pub async fn replace(&self, snapshot: &BasketSnapshot) -> Result<Option<BasketSnapshot>> {
        let key = BasketKey::for_owner(snapshot.owner());
        let payload = encode(snapshot)?;

        let result = self
            .backend
            .put(key.as_str(), payload, WritePrecondition::None)
            .await
            .map_err(|e| BasketError::Storage {
                message: format!("failed to write basket for '{}': {e}", snapshot.owner()),
            })?;

        match result {
            WriteResult::Success { .. } => Ok(Some(snapshot.clone())),
            WriteResult::PreconditionFailed { current_version } => {
                tracing::debug!(
                    owner = %snapshot.owner(),
                    current_version,
                    "basket write refused by backend"
                );
                Ok(None)
            }
        }
    }

    /// Deletes the snapshot for an owner.
    ///
    /// Idempotent: deleting an owner without a stored basket succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails.
    pub async fn delete(&self, owner: &OwnerId) -> Result<()> {
        let key = BasketKey::for_owner(owner);
        self.backend
            .delete(key.as_str())
            .await
            .map_err(|e| BasketError::Storage {
                message: format!("failed to delete basket for '{owner}': {e}"),
            })
    }
}

impl std::fmt::Debug for BasketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasketStore").finish_non_exhaustive()
    }
}

fn encode(snapshot: &BasketSnapshot) -> Result<Bytes> {
    let stored = StoredBasket {
        owner_id: snapshot.owner().as_str().to_string(),
        items: snapshot
            .items()
            .iter()
            .map(|(product, &quantity)| StoredItem {
                product_id: product.as_u64(),
                quantity,
            })
            .collect(),
    };

    let json = serde_json::to_vec_pretty(&stored).map_err(|e| BasketError::Serialization {
        message: format!("failed to serialize basket: {e}"),
    })?;
    Ok(Bytes::from(json))
}

fn decode(bytes: &Bytes) -> Result<BasketSnapshot> {
    let stored: StoredBasket =
        serde_json::from_slice(bytes).map_err(|e| BasketError::Serialization {
            message: format!("stored basket does not parse: {e}"),
        })?;

    let owner = OwnerId::new(&stored.owner_id).map_err(|e| BasketError::Serialization {
        message: format!("stored basket has an invalid owner: {e}"),
    })?;
    let lines: Vec<BasketLine> = stored
        .items
        .iter()
        .map(|item| BasketLine::new(ProductId::new(item.product_id), item.quantity))
        .collect();

    // Re-validate on the way in; a snapshot that no longer satisfies the
    // model invariants is corrupt, not merely invalid input.
    BasketSnapshot::from_lines(owner, &lines).map_err(|e| BasketError::Serialization {
        message: format!("stored basket violates snapshot invariants: {e}"),
    })
}
