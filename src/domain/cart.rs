//! Cart entities and the read projection handed to the presentation layer.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Lifecycle of a cart. Only `Open` carts take part in add/lookup;
/// nothing in this service moves a cart to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    Open,
    Closed,
}

impl CartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Open => "open",
            CartStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for CartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CartStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(CartStatus::Open),
            "closed" => Ok(CartStatus::Closed),
            other => Err(format!("unknown cart status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub id: i64,
    pub session_id: String,
    pub status: CartStatus,
}

impl Cart {
    pub fn is_closed(&self) -> bool {
        self.status == CartStatus::Closed
    }
}

/// A priced line in a cart.
///
/// `id` is `None` until the repository has stored the line; `price` is the
/// accumulated `quantity × unit price` captured at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: Option<i64>,
    pub cart_id: i64,
    pub product_id: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl CartItem {
    /// A line that has not been stored yet.
    pub fn pending(cart_id: i64, product_id: impl Into<String>, quantity: i32, price: Decimal) -> Self {
        Self {
            id: None,
            cart_id,
            product_id: product_id.into(),
            quantity,
            price,
        }
    }
}

/// One row of the cart view: the fields the cart page and `/api/cart` show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartLine {
    pub id: i64,
    pub quantity: i32,
    #[schema(value_type = String, example = "600")]
    pub price: Decimal,
    pub product: String,
}

impl CartLine {
    /// Projects a stored item; unsaved items have no id and are skipped.
    pub fn from_item(item: CartItem) -> Option<Self> {
        Some(Self {
            id: item.id?,
            quantity: item.quantity,
            price: item.price,
            product: item.product_id,
        })
    }
}
