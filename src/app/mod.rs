pub mod cart_service;
pub mod context;

pub use cart_service::{AddItemRequest, AddOutcome, CartService, DeleteOutcome, SkipReason};
pub use context::RequestContext;
