//! HTML rendering of the cart page.

use crate::domain::{CartLine, PriceCatalog};
use askama::Template;
use rust_decimal::Decimal;

pub struct ProductOption {
    pub name: String,
    pub price: Decimal,
}

#[derive(Template)]
#[template(path = "cart.html")]
pub struct CartPage {
    pub error: String,
    pub products: Vec<ProductOption>,
    pub items: Vec<CartLine>,
}

impl CartPage {
    pub fn new(catalog: &PriceCatalog, items: Option<Vec<CartLine>>, error: String) -> Self {
        Self {
            error,
            products: catalog
                .products()
                .map(|(name, price)| ProductOption {
                    name: name.to_string(),
                    price,
                })
                .collect(),
            items: items.unwrap_or_default(),
        }
    }
}
