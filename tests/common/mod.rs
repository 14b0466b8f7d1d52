//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use cart_pricing_service::domain::{Cart, CartItem, CartStatus, PriceCatalog, DEFAULT_CATALOG};
use cart_pricing_service::error::{StoreError, StoreResult};
use cart_pricing_service::storage::{CartRepository, InMemoryCartRepository};
use cart_pricing_service::{CartService, RequestContext};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub fn default_catalog() -> PriceCatalog {
    PriceCatalog::parse(DEFAULT_CATALOG).expect("default catalog parses")
}

pub fn memory_service() -> (CartService, Arc<InMemoryCartRepository>) {
    let repo = Arc::new(InMemoryCartRepository::new());
    (CartService::new(default_catalog(), repo.clone()), repo)
}

pub fn ctx() -> RequestContext {
    RequestContext::background()
}

/// Repository operations that [`FaultyRepository`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GetOpenCart,
    CreateCart,
    UpsertItem,
    GetItemById,
    GetItemByCartAndProduct,
    ListItems,
    DeleteItem,
    Ping,
}

/// Wraps the in-memory repository, failing selected operations with a
/// database error and optionally serving a closed cart as the session's cart.
#[derive(Default)]
pub struct FaultyRepository {
    pub inner: InMemoryCartRepository,
    failing: Mutex<HashSet<Op>>,
    closed_cart: Mutex<Option<Cart>>,
    calls: Mutex<Vec<Op>>,
}

impl FaultyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, op: Op) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn heal(&self, op: Op) {
        self.failing.lock().unwrap().remove(&op);
    }

    /// `get_open_cart` returns `cart` for its session regardless of status.
    pub fn serve_cart(&self, cart: Cart) {
        *self.closed_cart.lock().unwrap() = Some(cart);
    }

    pub fn calls(&self) -> Vec<Op> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, op: Op) -> StoreResult<()> {
        self.calls.lock().unwrap().push(op);
        if self.failing.lock().unwrap().contains(&op) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl CartRepository for FaultyRepository {
    async fn get_open_cart(&self, ctx: &RequestContext, session_id: &str) -> StoreResult<Cart> {
        self.enter(Op::GetOpenCart)?;
        let served = self.closed_cart.lock().unwrap().clone();
        if let Some(cart) = served.filter(|c| c.session_id == session_id) {
            return Ok(cart);
        }
        self.inner.get_open_cart(ctx, session_id).await
    }

    async fn create_cart(&self, ctx: &RequestContext, session_id: &str) -> StoreResult<Cart> {
        self.enter(Op::CreateCart)?;
        self.inner.create_cart(ctx, session_id).await
    }

    async fn upsert_item(&self, ctx: &RequestContext, item: CartItem) -> StoreResult<CartItem> {
        self.enter(Op::UpsertItem)?;
        self.inner.upsert_item(ctx, item).await
    }

    async fn get_item_by_id(&self, ctx: &RequestContext, id: i64) -> StoreResult<CartItem> {
        self.enter(Op::GetItemById)?;
        self.inner.get_item_by_id(ctx, id).await
    }

    async fn get_item_by_cart_and_product(
        &self,
        ctx: &RequestContext,
        cart_id: i64,
        product_id: &str,
    ) -> StoreResult<CartItem> {
        self.enter(Op::GetItemByCartAndProduct)?;
        self.inner.get_item_by_cart_and_product(ctx, cart_id, product_id).await
    }

    async fn list_items(&self, ctx: &RequestContext, cart_id: i64) -> StoreResult<Vec<CartItem>> {
        self.enter(Op::ListItems)?;
        self.inner.list_items(ctx, cart_id).await
    }

    async fn delete_item(&self, ctx: &RequestContext, item: &CartItem) -> StoreResult<()> {
        self.enter(Op::DeleteItem)?;
        self.inner.delete_item(ctx, item).await
    }

    async fn delete_cart(&self, ctx: &RequestContext, cart: &Cart) -> StoreResult<()> {
        self.inner.delete_cart(ctx, cart).await
    }

    async fn ping(&self, ctx: &RequestContext) -> StoreResult<()> {
        self.enter(Op::Ping)?;
        self.inner.ping(ctx).await
    }
}

pub fn closed_cart(id: i64, session_id: &str) -> Cart {
    Cart {
        id,
        session_id: session_id.to_string(),
        status: CartStatus::Closed,
    }
}
