//! Basket service orchestration.
//!
//! Ties together the store, the delta computation, and metric reporting.
//! Transport-independent: identity arrives already resolved as
//! `Option<&OwnerId>`, and responses are plain domain values.

use crate::delta::{BasketDelta, compute_delta};
use crate::error::{BasketError, Result};
use crate::metrics;
use crate::model::{BasketItems, BasketLine, BasketSnapshot};
use crate::store::BasketStore;

use pannier_core::OwnerId;

/// Outcome of a basket replace: what is now stored, and what changed.
#[derive(Debug, Clone)]
pub struct BasketUpdate {
    /// The snapshot as stored.
    pub snapshot: BasketSnapshot,
    /// Item units added/removed relative to the previous snapshot.
    pub delta: BasketDelta,
}

/// The basket service: fetch, replace, delete.
#[derive(Debug, Clone)]
pub struct BasketService {
    store: BasketStore,
}

impl BasketService {
    /// Creates a service over the given store.
    #[must_use]
    pub const fn new(store: BasketStore) -> Self {
        Self { store }
    }

    /// Fetches the items of an owner's basket.
    ///
    /// An absent identity yields an empty basket rather than an error:
    /// the storefront renders an empty cart for anonymous visitors, so
    /// reads tolerate what mutations reject. Owners without a stored
    /// snapshot also get an empty basket.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store itself fails.
    pub async fn get_basket(&self, owner: Option<&OwnerId>) -> Result<BasketItems> {
        let Some(owner) = owner else {
            tracing::debug!("anonymous basket read, returning empty basket");
            return Ok(BasketItems::new());
        };

        let snapshot = self.store.read(owner).await?;
        Ok(snapshot.map(|s| s.items().clone()).unwrap_or_default())
    }

    /// Replaces an owner's basket with the incoming lines.
    ///
    /// Validates and normalizes the lines into a snapshot, stores it
    /// wholesale, and reports the item-count delta against the previous
    /// snapshot. A write the backend does not apply surfaces as
    /// [`BasketError::NotFound`], which is what callers of the original
    /// contract expect.
    ///
    /// # Errors
    ///
    /// - [`BasketError::Unauthenticated`] when no identity was resolved
    /// - [`BasketError::Validation`] for duplicate products or zero
    ///   quantities
    /// - [`BasketError::NotFound`] when the write was not applied
    /// - [`BasketError::Storage`] when the store fails
    pub async fn update_basket(
        &self,
        owner: Option<&OwnerId>,
        lines: &[BasketLine],
    ) -> Result<BasketUpdate> {
        let owner = owner.ok_or(BasketError::Unauthenticated)?;
        let incoming = BasketSnapshot::from_lines(owner.clone(), lines)?;

        let previous = self.store.read(owner).await?;
        let Some(stored) = self.store.replace(&incoming).await? else {
            return Err(BasketError::NotFound {
                message: format!("basket for owner '{owner}' does not exist"),
            });
        };

        let delta = compute_delta(previous.as_ref().map(BasketSnapshot::items), stored.items());
        if !delta.is_zero() {
            metrics::record_basket_delta(&delta);
        }

        tracing::info!(
            owner = %owner,
            products = stored.product_count(),
            items_added = delta.items_added,
            items_removed = delta.items_removed,
            "basket updated"
        );

        Ok(BasketUpdate {
            snapshot: stored,
            delta,
        })
    }

    /// Deletes an owner's basket.
    ///
    /// Idempotent: deleting an owner without a basket succeeds. The
    /// previous snapshot is read first only to feed the removal metric;
    /// that read is best-effort and never blocks or fails the delete.
    ///
    /// # Errors
    ///
    /// - [`BasketError::Unauthenticated`] when no identity was resolved
    /// - [`BasketError::Storage`] when the delete itself fails
    pub async fn delete_basket(&self, owner: Option<&OwnerId>) -> Result<()> {
        let owner = owner.ok_or(BasketError::Unauthenticated)?;

        let previous = match self.store.read(owner).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!(
                    owner = %owner,
                    error = %e,
                    "pre-delete read failed, skipping removal metric"
                );
                None
            }
        };

        self.store.delete(owner).await?;

        let removed = previous.as_ref().map_or(0, BasketSnapshot::total_quantity);
        if removed > 0 {
            metrics::record_basket_cleared(removed);
        }

        tracing::info!(owner = %owner, items_removed = removed, "basket deleted");
        Ok(())
    }
}
