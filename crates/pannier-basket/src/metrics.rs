//! Basket metrics.
//!
//! Counters for item units moving in and out of baskets, plus a gauge for
//! the running item total across all live baskets. The running total lives
//! in the metrics recorder (adjusted by per-update deltas), never in
//! service state, so concurrent updates from different owners cannot
//! corrupt it.

#![allow(clippy::cast_precision_loss)]

use metrics::{counter, describe_counter, describe_gauge, gauge};

use crate::delta::BasketDelta;

// ============================================================================
// Metric Names
// ============================================================================

/// Item units added to baskets (counter).
pub const ITEMS_ADDED: &str = "basket_items_added_total";

/// Item units removed from baskets (counter).
pub const ITEMS_REMOVED: &str = "basket_items_removed_total";

/// Current item units across all live baskets (gauge).
pub const ITEMS_IN_BASKETS: &str = "basket_items_total";

// ============================================================================
// Metric Registration
// ============================================================================

/// Registers all basket metric descriptions.
///
/// Call this once at application startup after initializing the metrics
/// recorder.
pub fn register_metrics() {
    describe_counter!(ITEMS_ADDED, "Total item units added to baskets");
    describe_counter!(ITEMS_REMOVED, "Total item units removed from baskets");
    describe_gauge!(
        ITEMS_IN_BASKETS,
        "Current item units across all live baskets"
    );
}

// ============================================================================
// Metric Recording
// ============================================================================

/// Records the delta of one basket replace.
///
/// Call only for nonzero deltas; a no-op update records nothing.
pub fn record_basket_delta(delta: &BasketDelta) {
    if delta.items_added > 0 {
        counter!(ITEMS_ADDED).increment(delta.items_added);
        gauge!(ITEMS_IN_BASKETS).increment(delta.items_added as f64);
    }
    if delta.items_removed > 0 {
        counter!(ITEMS_REMOVED).increment(delta.items_removed);
        gauge!(ITEMS_IN_BASKETS).decrement(delta.items_removed as f64);
    }
}

/// Records a basket deletion that removed `total_quantity` item units.
pub fn record_basket_cleared(total_quantity: u64) {
    if total_quantity > 0 {
        counter!(ITEMS_REMOVED).increment(total_quantity);
        gauge!(ITEMS_IN_BASKETS).decrement(total_quantity as f64);
    }
}
