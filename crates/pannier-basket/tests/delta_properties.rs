//! Property-based tests for basket delta invariants.
//!
//! These tests use proptest to verify the delta laws hold across randomly
//! generated snapshots.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;

use pannier_basket::{BasketItems, ProductId, compute_delta};

/// Generates a random item map with product IDs drawn from a small pool so
/// that snapshots overlap often enough to exercise both delta components.
fn arb_items() -> impl Strategy<Value = BasketItems> {
    prop::collection::btree_map((1u64..40).prop_map(ProductId::new), 1u32..20, 0..10)
}

/// Generates item pairs in random order (maps canonicalize on insert).
fn arb_shuffled_pairs() -> impl Strategy<Value = Vec<(ProductId, u32)>> {
    arb_items()
        .prop_map(|items| items.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

fn total(items: &BasketItems) -> u64 {
    items.values().map(|&q| u64::from(q)).sum()
}

proptest! {
    /// itemsAdded - itemsRemoved always equals the difference of the
    /// snapshot totals.
    #[test]
    fn conservation_of_items(previous in arb_items(), incoming in arb_items()) {
        let delta = compute_delta(Some(&previous), &incoming);
        let net = i128::from(delta.items_added) - i128::from(delta.items_removed);
        let expected = i128::from(total(&incoming)) - i128::from(total(&previous));
        prop_assert_eq!(net, expected);
    }

    /// With no previous snapshot, everything counts as added.
    #[test]
    fn absent_previous_adds_everything(incoming in arb_items()) {
        let delta = compute_delta(None, &incoming);
        prop_assert_eq!(delta.items_added, total(&incoming));
        prop_assert_eq!(delta.items_removed, 0);
    }

    /// Replacing a snapshot with itself changes nothing.
    #[test]
    fn identical_snapshots_are_a_zero_delta(snapshot in arb_items()) {
        let delta = compute_delta(Some(&snapshot), &snapshot);
        prop_assert!(delta.is_zero());
    }

    /// Swapping previous and incoming swaps the components.
    #[test]
    fn reversal_swaps_components(a in arb_items(), b in arb_items()) {
        let forward = compute_delta(Some(&a), &b);
        let backward = compute_delta(Some(&b), &a);
        prop_assert_eq!(forward.items_added, backward.items_removed);
        prop_assert_eq!(forward.items_removed, backward.items_added);
    }

    /// The order items arrive in never changes the delta.
    #[test]
    fn insertion_order_never_changes_the_delta(
        previous in arb_items(),
        pairs in arb_shuffled_pairs(),
    ) {
        let shuffled: BasketItems = pairs.iter().copied().collect();
        let sorted: BasketItems = {
            let mut sorted_pairs = pairs.clone();
            sorted_pairs.sort_unstable();
            sorted_pairs.into_iter().collect()
        };
        prop_assert_eq!(
            compute_delta(Some(&previous), &shuffled),
            compute_delta(Some(&previous), &sorted)
        );
    }
}
