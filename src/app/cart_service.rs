//! The cart service: the only place that encodes cart business rules.
//!
//! It prices lines against the [`PriceCatalog`], decides when a cart is
//! created, merges repeated additions of a product and applies the fail-open
//! rules of the delete and view paths. All state changes go through the
//! [`CartRepository`].

use crate::app::context::RequestContext;
use crate::domain::{Cart, CartItem, CartLine, PriceCatalog};
use crate::error::{CartError, StoreError, StoreResult};
use crate::storage::CartRepository;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Form input for adding a product to a cart. Both fields are raw text.
#[derive(Debug, Clone, Default)]
pub struct AddItemRequest {
    pub product: String,
    pub quantity: String,
}

impl AddItemRequest {
    pub fn new(product: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            quantity: quantity.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was written.
    Created(CartItem),
    /// The product was already in the cart; quantity and price were added to it.
    Merged(CartItem),
}

impl AddOutcome {
    pub fn item(&self) -> &CartItem {
        match self {
            AddOutcome::Created(item) | AddOutcome::Merged(item) => item,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { item_id: i64 },
    Skipped(SkipReason),
}

/// Why a delete request left storage untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoOpenCart,
    CartClosed,
    InvalidItemId,
    ItemNotFound,
}

pub struct CartService {
    catalog: PriceCatalog,
    repo: Arc<dyn CartRepository>,
}

impl CartService {
    pub fn new(catalog: PriceCatalog, repo: Arc<dyn CartRepository>) -> Self {
        Self { catalog, repo }
    }

    pub fn catalog(&self) -> &PriceCatalog {
        &self.catalog
    }

    /// Adds `request.quantity` units of `request.product` to the session's open
    /// cart, creating the cart on first use.
    ///
    /// Input is validated before anything is written, so an unknown product or
    /// a bad quantity never leaves an empty cart behind.
    #[instrument(skip(self, ctx, request), fields(product = %request.product))]
    pub async fn add_item_to_cart(
        &self,
        ctx: &RequestContext,
        session_id: &str,
        request: &AddItemRequest,
    ) -> Result<AddOutcome, CartError> {
        if session_id.is_empty() || request.product.is_empty() || request.quantity.is_empty() {
            return Err(CartError::InvalidArgument);
        }

        let existing_cart = match self.repo.get_open_cart(ctx, session_id).await {
            Ok(cart) => Some(cart),
            Err(StoreError::NotFound) => None,
            Err(e) => {
                warn!(error = %e, "failed to load open cart");
                return Err(CartError::Storage(e));
            }
        };

        let unit_price = self
            .catalog
            .price_of(&request.product)
            .ok_or_else(|| CartError::InvalidItem {
                product: request.product.clone(),
            })?;
        let quantity = parse_quantity(&request.quantity)?;
        let line_price = unit_price
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| CartError::InvalidQuantity {
                raw: request.quantity.clone(),
            })?;

        let (cart, is_new) = match existing_cart {
            Some(cart) => (cart, false),
            None => {
                let cart = self.repo.create_cart(ctx, session_id).await?;
                info!(cart_id = cart.id, "opened cart");
                (cart, true)
            }
        };

        let addition = CartItem::pending(cart.id, request.product.as_str(), quantity, line_price);

        if !is_new {
            match self
                .repo
                .get_item_by_cart_and_product(ctx, cart.id, &request.product)
                .await
            {
                Ok(existing) => {
                    // The merged line must stay representable; nothing is written otherwise.
                    let fits = existing.quantity.checked_add(quantity).is_some()
                        && existing.price.checked_add(line_price).is_some();
                    if !fits {
                        return Err(CartError::InvalidQuantity {
                            raw: request.quantity.clone(),
                        });
                    }
                    // Storage adds the delta to the stored line atomically.
                    let merged = self.repo.upsert_item(ctx, addition).await?;
                    debug!(
                        cart_id = cart.id,
                        item_id = ?existing.id,
                        quantity = merged.quantity,
                        price = %merged.price,
                        "merged into existing line"
                    );
                    return Ok(AddOutcome::Merged(merged));
                }
                Err(StoreError::NotFound) => {}
                Err(e) => return Err(CartError::Storage(e)),
            }
        }

        let created = self.repo.upsert_item(ctx, addition).await?;
        debug!(cart_id = cart.id, item_id = ?created.id, quantity, "added line");
        Ok(AddOutcome::Created(created))
    }

    /// Deletes the item with id `item_id` once the session has an open cart.
    ///
    /// Everything short of the delete statement failing is a no-op success:
    /// a missing or closed cart, an unparsable id and an unknown item all
    /// return [`DeleteOutcome::Skipped`]. The item is not checked against the
    /// session's cart.
    #[instrument(skip(self, ctx))]
    pub async fn delete_cart_item(
        &self,
        ctx: &RequestContext,
        session_id: &str,
        item_id: &str,
    ) -> Result<DeleteOutcome, CartError> {
        let cart = match self.repo.get_open_cart(ctx, session_id).await {
            Ok(cart) => cart,
            Err(e) => {
                log_swallowed("load open cart for delete", &e);
                return Ok(DeleteOutcome::Skipped(SkipReason::NoOpenCart));
            }
        };

        if cart.is_closed() {
            return Ok(DeleteOutcome::Skipped(SkipReason::CartClosed));
        }

        let Ok(item_id) = item_id.parse::<i64>() else {
            return Ok(DeleteOutcome::Skipped(SkipReason::InvalidItemId));
        };

        let item = match self.repo.get_item_by_id(ctx, item_id).await {
            Ok(item) => item,
            Err(e) => {
                log_swallowed("load item for delete", &e);
                return Ok(DeleteOutcome::Skipped(SkipReason::ItemNotFound));
            }
        };

        self.repo
            .delete_item(ctx, &item)
            .await
            .map_err(CartError::Storage)?;
        info!(cart_id = cart.id, item_id, "deleted cart item");
        Ok(DeleteOutcome::Deleted { item_id })
    }

    /// The session's cart lines, or `None` when there is nothing to show.
    ///
    /// `None` covers an empty session id, a session without an open cart and
    /// storage failures alike; failures are logged here and not reported.
    #[instrument(skip(self, ctx))]
    pub async fn get_cart_data(&self, ctx: &RequestContext, session_id: &str) -> Option<Vec<CartLine>> {
        if session_id.is_empty() {
            return None;
        }

        let cart: Cart = match self.repo.get_open_cart(ctx, session_id).await {
            Ok(cart) => cart,
            Err(e) => {
                log_swallowed("load open cart for view", &e);
                return None;
            }
        };

        let items = match self.repo.list_items(ctx, cart.id).await {
            Ok(items) => items,
            Err(e) => {
                log_swallowed("list cart items", &e);
                return None;
            }
        };

        Some(items.into_iter().filter_map(CartLine::from_item).collect())
    }

    /// Storage reachability, for the health endpoint.
    pub async fn health_check(&self, ctx: &RequestContext) -> StoreResult<()> {
        self.repo.ping(ctx).await
    }
}

/// Quantities are positive whole numbers.
fn parse_quantity(raw: &str) -> Result<i32, CartError> {
    match raw.parse::<i32>() {
        Ok(q) if q > 0 => Ok(q),
        _ => Err(CartError::InvalidQuantity { raw: raw.to_string() }),
    }
}

fn log_swallowed(operation: &str, err: &StoreError) {
    if err.is_not_found() {
        debug!(operation, "nothing found");
    } else {
        warn!(operation, error = %err, "storage failure treated as empty result");
    }
}
