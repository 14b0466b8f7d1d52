//! Cart domain: entities and the price catalog.

pub mod cart;
pub mod catalog;

pub use cart::{Cart, CartItem, CartLine, CartStatus};
pub use catalog::{PriceCatalog, DEFAULT_CATALOG};
