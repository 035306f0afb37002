//! Item-count delta between two basket snapshots.
//!
//! Every basket replace reports how many item units it added and removed
//! relative to the previous snapshot. Both components can be nonzero for a
//! single update (raise one product, drop another).
//!
//! The comparison is a single pass over the incoming map plus a sweep of
//! previous-only keys: O(n + m) with map lookups, deterministic regardless
//! of input order.

use std::cmp::Ordering;

use crate::model::BasketItems;

/// Item units added and removed by one basket replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasketDelta {
    /// Total quantity units added across all products.
    pub items_added: u64,
    /// Total quantity units removed across all products.
    pub items_removed: u64,
}

impl BasketDelta {
    /// True when the update changed nothing.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.items_added == 0 && self.items_removed == 0
    }
}

/// Computes the delta of `incoming` relative to `previous`.
///
/// `previous` is `None` when the owner had no stored basket; then the
/// whole incoming quantity counts as added and nothing as removed.
///
/// For each incoming product, the quantity difference against the previous
/// snapshot contributes to exactly one component. Products present before
/// but absent from `incoming` contribute their full previous quantity to
/// `items_removed`.
#[must_use]
pub fn compute_delta(previous: Option<&BasketItems>, incoming: &BasketItems) -> BasketDelta {
    let empty = BasketItems::new();
    let previous = previous.unwrap_or(&empty);

    let mut delta = BasketDelta::default();

    for (product, &quantity) in incoming {
        let before = previous.get(product).copied().unwrap_or(0);
        match quantity.cmp(&before) {
            Ordering::Greater => delta.items_added += u64::from(quantity - before),
            Ordering::Less => delta.items_removed += u64::from(before - quantity),
            Ordering::Equal => {}
        }
    }

    for (product, &quantity) in previous {
        if !incoming.contains_key(product) {
            delta.items_removed += u64::from(quantity);
        }
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductId;

    fn items(pairs: &[(u64, u32)]) -> BasketItems {
        pairs
            .iter()
            .map(|&(id, qty)| (ProductId::new(id), qty))
            .collect()
    }

    #[test]
    fn absent_previous_counts_everything_as_added() {
        let incoming = items(&[(1, 2), (2, 1)]);
        let delta = compute_delta(None, &incoming);
        assert_eq!(
            delta,
            BasketDelta {
                items_added: 3,
                items_removed: 0
            }
        );
    }

    #[test]
    fn raising_one_product_and_dropping_another() {
        // {p1: 2, p2: 1} replaced by {p1: 5}
        let previous = items(&[(1, 2), (2, 1)]);
        let incoming = items(&[(1, 5)]);
        let delta = compute_delta(Some(&previous), &incoming);
        assert_eq!(
            delta,
            BasketDelta {
                items_added: 3,
                items_removed: 1
            }
        );
    }

    #[test]
    fn identical_snapshots_yield_zero_delta() {
        let snapshot = items(&[(1, 2), (9, 4)]);
        let delta = compute_delta(Some(&snapshot), &snapshot);
        assert!(delta.is_zero());
    }

    #[test]
    fn lowering_a_quantity_counts_as_removed() {
        let previous = items(&[(1, 5)]);
        let incoming = items(&[(1, 2)]);
        let delta = compute_delta(Some(&previous), &incoming);
        assert_eq!(
            delta,
            BasketDelta {
                items_added: 0,
                items_removed: 3
            }
        );
    }

    #[test]
    fn emptying_a_basket_removes_every_unit() {
        let previous = items(&[(1, 2), (2, 1), (3, 7)]);
        let incoming = items(&[]);
        let delta = compute_delta(Some(&previous), &incoming);
        assert_eq!(
            delta,
            BasketDelta {
                items_added: 0,
                items_removed: 10
            }
        );
    }

    #[test]
    fn both_components_in_one_update() {
        let previous = items(&[(1, 1), (2, 4)]);
        let incoming = items(&[(1, 3), (3, 2)]);
        let delta = compute_delta(Some(&previous), &incoming);
        // p1: +2, p3: +2, p2: -4
        assert_eq!(
            delta,
            BasketDelta {
                items_added: 4,
                items_removed: 4
            }
        );
    }
}
