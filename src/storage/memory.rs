//! In-process cart repository, used for local development and tests.

use crate::app::context::RequestContext;
use crate::domain::{Cart, CartItem, CartStatus};
use crate::error::{StoreError, StoreResult};
use crate::storage::CartRepository;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct State {
    next_cart_id: i64,
    next_item_id: i64,
    carts: BTreeMap<i64, Cart>,
    items: BTreeMap<i64, CartItem>,
}

impl State {
    fn open_cart(&self, session_id: &str) -> Option<&Cart> {
        self.carts
            .values()
            .find(|c| c.status == CartStatus::Open && c.session_id == session_id)
    }

    fn item_for(&self, cart_id: i64, product_id: &str) -> Option<i64> {
        self.items
            .iter()
            .find(|(_, i)| i.cart_id == cart_id && i.product_id == product_id)
            .map(|(id, _)| *id)
    }
}

/// Keeps carts and items in memory behind one lock, so every operation is
/// atomic and the uniqueness rules hold without further coordination.
#[derive(Default)]
pub struct InMemoryCartRepository {
    state: Mutex<State>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a cart as-is, including closed carts. Administrative/test hook.
    pub async fn insert_cart(&self, session_id: &str, status: CartStatus) -> Cart {
        let mut state = self.state.lock().await;
        state.next_cart_id += 1;
        let cart = Cart {
            id: state.next_cart_id,
            session_id: session_id.to_string(),
            status,
        };
        state.carts.insert(cart.id, cart.clone());
        cart
    }

    pub async fn cart_count(&self) -> usize {
        self.state.lock().await.carts.len()
    }

    pub async fn item_count(&self) -> usize {
        self.state.lock().await.items.len()
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn get_open_cart(&self, ctx: &RequestContext, session_id: &str) -> StoreResult<Cart> {
        ctx.run(async {
            let state = self.state.lock().await;
            state.open_cart(session_id).cloned().ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn create_cart(&self, ctx: &RequestContext, session_id: &str) -> StoreResult<Cart> {
        if session_id.is_empty() {
            return Err(StoreError::Rejected("cart session id must not be empty".to_string()));
        }
        ctx.run(async {
            let mut state = self.state.lock().await;
            if let Some(existing) = state.open_cart(session_id) {
                return Ok(existing.clone());
            }
            state.next_cart_id += 1;
            let cart = Cart {
                id: state.next_cart_id,
                session_id: session_id.to_string(),
                status: CartStatus::Open,
            };
            state.carts.insert(cart.id, cart.clone());
            Ok(cart)
        })
        .await
    }

    async fn upsert_item(&self, ctx: &RequestContext, item: CartItem) -> StoreResult<CartItem> {
        ctx.run(async {
            let mut state = self.state.lock().await;
            if !state.carts.contains_key(&item.cart_id) {
                return Err(StoreError::Rejected(format!("cart {} does not exist", item.cart_id)));
            }
            match item.id {
                Some(id) => {
                    let slot = state.items.get_mut(&id).ok_or(StoreError::NotFound)?;
                    *slot = item;
                    Ok(slot.clone())
                }
                None => {
                    if let Some(id) = state.item_for(item.cart_id, &item.product_id) {
                        let slot = state.items.get_mut(&id).ok_or(StoreError::NotFound)?;
                        let (Some(quantity), Some(price)) = (
                            slot.quantity.checked_add(item.quantity),
                            slot.price.checked_add(item.price),
                        ) else {
                            return Err(StoreError::Rejected(format!(
                                "merged line for '{}' overflows",
                                item.product_id
                            )));
                        };
                        slot.quantity = quantity;
                        slot.price = price;
                        return Ok(slot.clone());
                    }
                    state.next_item_id += 1;
                    let id = state.next_item_id;
                    let stored = CartItem { id: Some(id), ..item };
                    state.items.insert(id, stored.clone());
                    Ok(stored)
                }
            }
        })
        .await
    }

    async fn get_item_by_id(&self, ctx: &RequestContext, id: i64) -> StoreResult<CartItem> {
        ctx.run(async {
            let state = self.state.lock().await;
            state.items.get(&id).cloned().ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn get_item_by_cart_and_product(
        &self,
        ctx: &RequestContext,
        cart_id: i64,
        product_id: &str,
    ) -> StoreResult<CartItem> {
        ctx.run(async {
            let state = self.state.lock().await;
            state
                .item_for(cart_id, product_id)
                .and_then(|id| state.items.get(&id).cloned())
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn list_items(&self, ctx: &RequestContext, cart_id: i64) -> StoreResult<Vec<CartItem>> {
        ctx.run(async {
            let state = self.state.lock().await;
            Ok(state
                .items
                .values()
                .filter(|i| i.cart_id == cart_id)
                .cloned()
                .collect())
        })
        .await
    }

    async fn delete_item(&self, ctx: &RequestContext, item: &CartItem) -> StoreResult<()> {
        ctx.run(async {
            if let Some(id) = item.id {
                self.state.lock().await.items.remove(&id);
            }
            Ok(())
        })
        .await
    }

    async fn delete_cart(&self, ctx: &RequestContext, cart: &Cart) -> StoreResult<()> {
        ctx.run(async {
            let mut state = self.state.lock().await;
            state.carts.remove(&cart.id);
            state.items.retain(|_, i| i.cart_id != cart.id);
            Ok(())
        })
        .await
    }

    async fn ping(&self, ctx: &RequestContext) -> StoreResult<()> {
        ctx.run(async { Ok(()) }).await
    }
}
