//! Cart persistence: the repository contract and its backends.

use crate::app::context::RequestContext;
use crate::domain::{Cart, CartItem};
use crate::error::StoreResult;
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryCartRepository;
pub use postgres::PgCartRepository;

/// Data access for carts and their items. Holds no business rules.
///
/// Every call is bounded by `ctx`; a context that has already expired fails
/// with [`StoreError::DeadlineExceeded`](crate::error::StoreError::DeadlineExceeded)
/// without touching storage.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// The single open cart for `session_id`, or `NotFound`.
    async fn get_open_cart(&self, ctx: &RequestContext, session_id: &str) -> StoreResult<Cart>;

    /// Inserts an open cart for `session_id` and returns it with its id.
    ///
    /// An empty session id is rejected. If another request created the open
    /// cart first, that cart is returned.
    async fn create_cart(&self, ctx: &RequestContext, session_id: &str) -> StoreResult<Cart>;

    /// Inserts `item` when it has no id, otherwise overwrites the row with that id.
    ///
    /// Inserting a product already present in the cart adds the quantity and
    /// price to the existing line in one statement.
    async fn upsert_item(&self, ctx: &RequestContext, item: CartItem) -> StoreResult<CartItem>;

    async fn get_item_by_id(&self, ctx: &RequestContext, id: i64) -> StoreResult<CartItem>;

    async fn get_item_by_cart_and_product(
        &self,
        ctx: &RequestContext,
        cart_id: i64,
        product_id: &str,
    ) -> StoreResult<CartItem>;

    /// Items of `cart_id` ordered by id. Empty for an empty or unknown cart.
    async fn list_items(&self, ctx: &RequestContext, cart_id: i64) -> StoreResult<Vec<CartItem>>;

    /// Deleting an item that does not exist is not an error.
    async fn delete_item(&self, ctx: &RequestContext, item: &CartItem) -> StoreResult<()>;

    /// Removes a cart together with its items.
    async fn delete_cart(&self, ctx: &RequestContext, cart: &Cart) -> StoreResult<()>;

    async fn ping(&self, ctx: &RequestContext) -> StoreResult<()>;
}
