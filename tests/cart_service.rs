//! Cart service rules over the in-memory backend and a fault-injecting
//! repository.

mod common;

use cart_pricing_service::domain::{CartStatus, PriceCatalog};
use cart_pricing_service::error::CartError;
use cart_pricing_service::storage::{CartRepository, InMemoryCartRepository};
use cart_pricing_service::{AddItemRequest, AddOutcome, CartService, DeleteOutcome, RequestContext, SkipReason};
use common::{closed_cart, ctx, memory_service, FaultyRepository, Op};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

fn add(product: &str, quantity: &str) -> AddItemRequest {
    AddItemRequest::new(product, quantity)
}

#[tokio::test]
async fn first_add_creates_one_cart_and_one_priced_line() {
    let (service, repo) = memory_service();

    let outcome = service
        .add_item_to_cart(&ctx(), "session-1", &add("shoe", "3"))
        .await
        .expect("add succeeds");

    assert!(matches!(outcome, AddOutcome::Created(_)));
    let item = outcome.item();
    assert_eq!(item.product_id, "shoe");
    assert_eq!(item.quantity, 3);
    assert_eq!(item.price, Decimal::from(300));
    assert!(item.id.is_some());
    assert_eq!(repo.cart_count().await, 1);
    assert_eq!(repo.item_count().await, 1);
}

#[tokio::test]
async fn adding_the_same_product_twice_merges_the_line() {
    let (service, repo) = memory_service();

    service
        .add_item_to_cart(&ctx(), "s", &add("purse", "1"))
        .await
        .unwrap();
    let outcome = service
        .add_item_to_cart(&ctx(), "s", &add("purse", "2"))
        .await
        .unwrap();

    assert!(matches!(outcome, AddOutcome::Merged(_)));
    assert_eq!(outcome.item().quantity, 3);
    assert_eq!(outcome.item().price, Decimal::from(600));
    assert_eq!(repo.cart_count().await, 1);
    assert_eq!(repo.item_count().await, 1);
}

#[tokio::test]
async fn distinct_products_get_distinct_lines() {
    let (service, repo) = memory_service();

    for product in ["shoe", "bag", "watch"] {
        service
            .add_item_to_cart(&ctx(), "s", &add(product, "1"))
            .await
            .unwrap();
    }

    assert_eq!(repo.cart_count().await, 1);
    let lines = service.get_cart_data(&ctx(), "s").await.expect("cart has data");
    assert_eq!(lines.len(), 3);
}

#[tokio::test]
async fn sessions_do_not_share_carts() {
    let (service, repo) = memory_service();

    service.add_item_to_cart(&ctx(), "a", &add("shoe", "1")).await.unwrap();
    service.add_item_to_cart(&ctx(), "b", &add("shoe", "1")).await.unwrap();

    assert_eq!(repo.cart_count().await, 2);
    assert_eq!(service.get_cart_data(&ctx(), "a").await.unwrap().len(), 1);
    assert_eq!(service.get_cart_data(&ctx(), "b").await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_inputs_are_invalid_arguments() {
    let (service, repo) = memory_service();

    for (session, product, quantity) in [("", "shoe", "1"), ("s", "", "1"), ("s", "shoe", "")] {
        let err = service
            .add_item_to_cart(&ctx(), session, &add(product, quantity))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidArgument), "{:?}", err);
        assert_eq!(err.to_string(), "invalid arguments");
    }
    assert_eq!(repo.cart_count().await, 0);
}

#[tokio::test]
async fn unknown_product_leaves_storage_unchanged() {
    let (service, repo) = memory_service();

    let err = service
        .add_item_to_cart(&ctx(), "s", &add("hat", "1"))
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::InvalidItem { ref product } if product == "hat"));
    assert_eq!(err.to_string(), "invalid item name");
    assert!(err.is_user_facing());
    assert_eq!(repo.cart_count().await, 0);
    assert_eq!(repo.item_count().await, 0);
}

#[tokio::test]
async fn bad_quantities_leave_storage_unchanged() {
    let (service, repo) = memory_service();

    for quantity in ["two", "1.5", "0", "-3", "99999999999"] {
        let err = service
            .add_item_to_cart(&ctx(), "s", &add("shoe", quantity))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity { .. }), "{}: {:?}", quantity, err);
        assert_eq!(err.to_string(), "invalid quantity");
    }
    assert_eq!(repo.cart_count().await, 0);
    assert_eq!(repo.item_count().await, 0);
}

#[tokio::test]
async fn bad_quantity_on_existing_cart_keeps_the_line() {
    let (service, _repo) = memory_service();
    service.add_item_to_cart(&ctx(), "s", &add("shoe", "2")).await.unwrap();

    let err = service
        .add_item_to_cart(&ctx(), "s", &add("shoe", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::InvalidQuantity { .. }));

    let lines = service.get_cart_data(&ctx(), "s").await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);
    assert_eq!(lines[0].price, Decimal::from(200));
}

#[tokio::test]
async fn failing_cart_lookup_propagates_and_creates_nothing() {
    let repo = Arc::new(FaultyRepository::new());
    repo.fail(Op::GetOpenCart);
    let service = CartService::new(common::default_catalog(), repo.clone());

    let err = service
        .add_item_to_cart(&ctx(), "s", &add("shoe", "1"))
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::Storage(_)));
    assert!(!err.is_user_facing());
    assert!(!repo.calls().contains(&Op::CreateCart));
    assert_eq!(repo.inner.cart_count().await, 0);
}

#[tokio::test]
async fn failing_line_lookup_propagates_without_writes() {
    let repo = Arc::new(FaultyRepository::new());
    let service = CartService::new(common::default_catalog(), repo.clone());
    service.add_item_to_cart(&ctx(), "s", &add("bag", "1")).await.unwrap();

    repo.fail(Op::GetItemByCartAndProduct);
    let err = service
        .add_item_to_cart(&ctx(), "s", &add("bag", "1"))
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::Storage(_)));
    let upserts = repo.calls().iter().filter(|op| **op == Op::UpsertItem).count();
    assert_eq!(upserts, 1);
    let item = repo
        .inner
        .get_item_by_cart_and_product(&ctx(), 1, "bag")
        .await
        .unwrap();
    assert_eq!(item.quantity, 1);
}

#[tokio::test]
async fn new_cart_skips_the_line_lookup() {
    let repo = Arc::new(FaultyRepository::new());
    let service = CartService::new(common::default_catalog(), repo.clone());

    service.add_item_to_cart(&ctx(), "s", &add("watch", "1")).await.unwrap();

    assert_eq!(
        repo.calls(),
        vec![Op::GetOpenCart, Op::CreateCart, Op::UpsertItem]
    );
}

#[tokio::test]
async fn failing_write_surfaces_as_storage_error() {
    let repo = Arc::new(FaultyRepository::new());
    repo.fail(Op::UpsertItem);
    let service = CartService::new(common::default_catalog(), repo);

    let err = service
        .add_item_to_cart(&ctx(), "s", &add("shoe", "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::Storage(_)));
}

#[tokio::test]
async fn expired_context_fails_the_add() {
    let (service, repo) = memory_service();
    let expired = RequestContext::with_timeout(Duration::ZERO);

    let err = service
        .add_item_to_cart(&expired, "s", &add("shoe", "1"))
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::Storage(_)));
    assert_eq!(repo.cart_count().await, 0);
}

#[tokio::test]
async fn delete_without_open_cart_is_a_no_op() {
    let (service, _repo) = memory_service();

    let outcome = service.delete_cart_item(&ctx(), "nobody", "1").await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Skipped(SkipReason::NoOpenCart));
}

#[tokio::test]
async fn delete_on_closed_cart_is_a_no_op() {
    let repo = Arc::new(FaultyRepository::new());
    let service = CartService::new(common::default_catalog(), repo.clone());
    service.add_item_to_cart(&ctx(), "s", &add("shoe", "1")).await.unwrap();
    repo.serve_cart(closed_cart(1, "s"));

    let outcome = service.delete_cart_item(&ctx(), "s", "1").await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Skipped(SkipReason::CartClosed));
    assert_eq!(repo.inner.item_count().await, 1);
    assert!(!repo.calls().contains(&Op::DeleteItem));
}

#[tokio::test]
async fn delete_with_unparsable_or_unknown_id_is_a_no_op() {
    let (service, repo) = memory_service();
    service.add_item_to_cart(&ctx(), "s", &add("shoe", "1")).await.unwrap();

    let outcome = service.delete_cart_item(&ctx(), "s", "abc").await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Skipped(SkipReason::InvalidItemId));

    let outcome = service.delete_cart_item(&ctx(), "s", "4242").await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Skipped(SkipReason::ItemNotFound));

    assert_eq!(repo.item_count().await, 1);
}

#[tokio::test]
async fn delete_swallows_lookup_failures_but_not_delete_failures() {
    let repo = Arc::new(FaultyRepository::new());
    let service = CartService::new(common::default_catalog(), repo.clone());
    service.add_item_to_cart(&ctx(), "s", &add("shoe", "1")).await.unwrap();

    repo.fail(Op::GetItemById);
    let outcome = service.delete_cart_item(&ctx(), "s", "1").await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Skipped(SkipReason::ItemNotFound));
    repo.heal(Op::GetItemById);

    repo.fail(Op::DeleteItem);
    let err = service.delete_cart_item(&ctx(), "s", "1").await.unwrap_err();
    assert!(matches!(err, CartError::Storage(_)));
    assert_eq!(repo.inner.item_count().await, 1);
}

#[tokio::test]
async fn delete_is_not_scoped_to_the_sessions_cart() {
    let (service, repo) = memory_service();
    let theirs = service
        .add_item_to_cart(&ctx(), "other", &add("bag", "1"))
        .await
        .unwrap();
    service.add_item_to_cart(&ctx(), "mine", &add("shoe", "1")).await.unwrap();

    let their_id = theirs.item().id.unwrap();
    let outcome = service
        .delete_cart_item(&ctx(), "mine", &their_id.to_string())
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted { item_id: their_id });
    assert_eq!(repo.item_count().await, 1);
    assert_eq!(service.get_cart_data(&ctx(), "other").await, Some(vec![]));
}

#[tokio::test]
async fn cart_data_for_empty_session_is_none() {
    let (service, _repo) = memory_service();
    assert_eq!(service.get_cart_data(&ctx(), "").await, None);
}

#[tokio::test]
async fn cart_data_without_cart_is_none() {
    let (service, _repo) = memory_service();
    assert_eq!(service.get_cart_data(&ctx(), "fresh").await, None);
}

#[tokio::test]
async fn cart_data_projects_every_item() {
    let repo = Arc::new(InMemoryCartRepository::new());
    let service = CartService::new(common::default_catalog(), repo.clone());
    let cart = repo.insert_cart("s", CartStatus::Open).await;
    for (product, qty) in [("shoe", 1), ("purse", 2), ("bag", 3), ("watch", 4)] {
        repo.upsert_item(
            &ctx(),
            cart_pricing_service::CartItem::pending(cart.id, product, qty, Decimal::from(qty * 10)),
        )
        .await
        .unwrap();
    }

    let lines = service.get_cart_data(&ctx(), "s").await.unwrap();

    assert_eq!(lines.len(), 4);
    let purse = lines.iter().find(|l| l.product == "purse").unwrap();
    assert_eq!(purse.quantity, 2);
    assert_eq!(purse.price, Decimal::from(20));
}

#[tokio::test]
async fn cart_data_swallows_storage_failures() {
    let repo = Arc::new(FaultyRepository::new());
    let service = CartService::new(common::default_catalog(), repo.clone());
    service.add_item_to_cart(&ctx(), "s", &add("shoe", "1")).await.unwrap();

    repo.fail(Op::ListItems);
    assert_eq!(service.get_cart_data(&ctx(), "s").await, None);

    repo.heal(Op::ListItems);
    repo.fail(Op::GetOpenCart);
    assert_eq!(service.get_cart_data(&ctx(), "s").await, None);
}

#[tokio::test]
async fn bag_scenario_accumulates_then_empties() {
    let catalog = PriceCatalog::new([("bag", Decimal::from(300))]).unwrap();
    let repo = Arc::new(InMemoryCartRepository::new());
    let service = CartService::new(catalog, repo.clone());

    let first = service.add_item_to_cart(&ctx(), "s", &add("bag", "2")).await.unwrap();
    assert_eq!(first.item().quantity, 2);
    assert_eq!(first.item().price, Decimal::from(600));

    let second = service.add_item_to_cart(&ctx(), "s", &add("bag", "1")).await.unwrap();
    assert_eq!(second.item().quantity, 3);
    assert_eq!(second.item().price, Decimal::from(900));

    let lines = service.get_cart_data(&ctx(), "s").await.unwrap();
    assert_eq!(lines.len(), 1);
    let id = lines[0].id;

    let outcome = service.delete_cart_item(&ctx(), "s", &id.to_string()).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted { item_id: id });
    assert_eq!(service.get_cart_data(&ctx(), "s").await, Some(vec![]));
    assert_eq!(repo.cart_count().await, 1);
}

#[tokio::test]
async fn health_check_reports_storage_failures() {
    let repo = Arc::new(FaultyRepository::new());
    let service = CartService::new(common::default_catalog(), repo.clone());

    assert!(service.health_check(&ctx()).await.is_ok());
    repo.fail(Op::Ping);
    assert!(service.health_check(&ctx()).await.is_err());
}

#[tokio::test]
async fn merge_past_i32_max_is_rejected_without_writes() {
    let (service, _repo) = memory_service();
    service
        .add_item_to_cart(&ctx(), "s", &add("shoe", "2147483647"))
        .await
        .unwrap();

    let err = service
        .add_item_to_cart(&ctx(), "s", &add("shoe", "1"))
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::InvalidQuantity { ref raw } if raw == "1"));
    assert!(err.is_user_facing());
    let lines = service.get_cart_data(&ctx(), "s").await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, i32::MAX);
    assert_eq!(lines[0].price, Decimal::from(i32::MAX) * Decimal::from(100));
}

#[tokio::test]
async fn overflowing_line_price_is_an_invalid_quantity() {
    let catalog = PriceCatalog::parse("yacht=100000000000000000000").unwrap();
    let repo = Arc::new(InMemoryCartRepository::new());
    let service = CartService::new(catalog, repo.clone());

    let err = service
        .add_item_to_cart(&ctx(), "s", &add("yacht", "2000000000"))
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::InvalidQuantity { .. }));
    assert_eq!(repo.cart_count().await, 0);
    assert_eq!(repo.item_count().await, 0);
}
