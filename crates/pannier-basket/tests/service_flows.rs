//! End-to-end flows through `BasketService` against in-memory storage,
//! including injected store failures.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use pannier_basket::{BasketError, BasketItems, BasketLine, BasketService, BasketStore, ProductId};
use pannier_core::OwnerId;
use pannier_test_utils::{RecordingBackend, StorageOp, init_test_logging};

fn owner(id: &str) -> OwnerId {
    OwnerId::new(id).expect("valid owner")
}

fn lines(pairs: &[(u64, u32)]) -> Vec<BasketLine> {
    pairs
        .iter()
        .map(|&(id, qty)| BasketLine::new(ProductId::new(id), qty))
        .collect()
}

fn items(pairs: &[(u64, u32)]) -> BasketItems {
    pairs
        .iter()
        .map(|&(id, qty)| (ProductId::new(id), qty))
        .collect()
}

fn service_with_backend() -> (BasketService, RecordingBackend) {
    init_test_logging();
    let backend = RecordingBackend::new();
    let service = BasketService::new(BasketStore::new(Arc::new(backend.clone())));
    (service, backend)
}

#[tokio::test]
async fn first_update_stores_snapshot_and_reports_additions() {
    let (service, _backend) = service_with_backend();
    let owner = owner("u1");

    let update = service
        .update_basket(Some(&owner), &lines(&[(1, 2), (2, 1)]))
        .await
        .expect("update succeeds");

    assert_eq!(update.snapshot.items(), &items(&[(1, 2), (2, 1)]));
    assert_eq!(update.delta.items_added, 3);
    assert_eq!(update.delta.items_removed, 0);

    let fetched = service
        .get_basket(Some(&owner))
        .await
        .expect("get succeeds");
    assert_eq!(fetched, items(&[(1, 2), (2, 1)]));
}

#[tokio::test]
async fn replacing_raises_and_drops_products() {
    let (service, _backend) = service_with_backend();
    let owner = owner("u1");

    service
        .update_basket(Some(&owner), &lines(&[(1, 2), (2, 1)]))
        .await
        .expect("first update succeeds");

    let update = service
        .update_basket(Some(&owner), &lines(&[(1, 5)]))
        .await
        .expect("second update succeeds");

    assert_eq!(update.snapshot.items(), &items(&[(1, 5)]));
    assert_eq!(update.delta.items_added, 3, "p1 went from 2 to 5");
    assert_eq!(update.delta.items_removed, 1, "p2 disappeared");
}

#[tokio::test]
async fn identical_second_update_reports_zero_delta() {
    let (service, _backend) = service_with_backend();
    let owner = owner("u1");
    let update_lines = lines(&[(1, 2), (2, 1)]);

    service
        .update_basket(Some(&owner), &update_lines)
        .await
        .expect("first update succeeds");
    let update = service
        .update_basket(Some(&owner), &update_lines)
        .await
        .expect("second update succeeds");

    assert!(update.delta.is_zero());
    assert_eq!(update.snapshot.items(), &items(&[(1, 2), (2, 1)]));
}

#[tokio::test]
async fn delete_then_get_yields_empty_basket() {
    let (service, _backend) = service_with_backend();
    let owner = owner("u1");

    service
        .update_basket(Some(&owner), &lines(&[(1, 2)]))
        .await
        .expect("update succeeds");
    service
        .delete_basket(Some(&owner))
        .await
        .expect("delete succeeds");

    let fetched = service
        .get_basket(Some(&owner))
        .await
        .expect("get succeeds");
    assert!(fetched.is_empty());
}

#[tokio::test]
async fn delete_without_a_stored_basket_succeeds() {
    let (service, _backend) = service_with_backend();
    service
        .delete_basket(Some(&owner("nobody-yet")))
        .await
        .expect("idempotent delete succeeds");
}

#[tokio::test]
async fn rejected_update_never_touches_the_store() {
    let (service, backend) = service_with_backend();
    let owner = owner("u1");

    let err = service
        .update_basket(Some(&owner), &lines(&[(7, 2), (7, 3)]))
        .await
        .unwrap_err();
    assert!(matches!(err, BasketError::Validation { .. }));

    let err = service
        .update_basket(Some(&owner), &lines(&[(5, 0)]))
        .await
        .unwrap_err();
    assert!(matches!(err, BasketError::Validation { .. }));

    assert!(
        backend.operations().is_empty(),
        "validation failures must not reach storage"
    );
}

#[tokio::test]
async fn anonymous_update_never_touches_the_store() {
    let (service, backend) = service_with_backend();

    let err = service
        .update_basket(None, &lines(&[(1, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, BasketError::Unauthenticated));
    assert!(backend.operations().is_empty());
}

#[tokio::test]
async fn refused_write_surfaces_as_not_found() {
    let (service, backend) = service_with_backend();
    backend.refuse_writes("baskets/");

    let err = service
        .update_basket(Some(&owner("u1")), &lines(&[(1, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, BasketError::NotFound { .. }));
}

#[tokio::test]
async fn backend_read_failure_surfaces_as_storage_error() {
    let (service, backend) = service_with_backend();
    backend.inject_read_failure("baskets/");

    let err = service.get_basket(Some(&owner("u1"))).await.unwrap_err();
    assert!(matches!(err, BasketError::Storage { .. }));

    let err = service
        .update_basket(Some(&owner("u1")), &lines(&[(1, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, BasketError::Storage { .. }));
}

#[tokio::test]
async fn delete_proceeds_when_the_metric_preread_fails() {
    let (service, backend) = service_with_backend();
    let owner = owner("u1");

    service
        .update_basket(Some(&owner), &lines(&[(1, 2)]))
        .await
        .expect("update succeeds");

    backend.inject_read_failure("baskets/");
    service
        .delete_basket(Some(&owner))
        .await
        .expect("delete must not fail because the metric read failed");

    backend.clear_failures();
    let fetched = service
        .get_basket(Some(&owner))
        .await
        .expect("get succeeds");
    assert!(fetched.is_empty(), "the snapshot really was deleted");
}

#[tokio::test]
async fn delete_reads_before_deleting_for_the_removal_metric() {
    let (service, backend) = service_with_backend();
    let owner = owner("u1");

    service
        .update_basket(Some(&owner), &lines(&[(1, 2)]))
        .await
        .expect("update succeeds");
    backend.clear_operations();

    service
        .delete_basket(Some(&owner))
        .await
        .expect("delete succeeds");

    let ops = backend.operations();
    assert!(
        matches!(ops.first(), Some(StorageOp::Get { .. })),
        "delete reads the snapshot first"
    );
    assert!(matches!(ops.last(), Some(StorageOp::Delete { .. })));
}
