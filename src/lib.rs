pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{AddItemRequest, AddOutcome, CartService, DeleteOutcome, RequestContext, SkipReason};
pub use domain::{Cart, CartItem, CartLine, CartStatus, PriceCatalog};
pub use error::{CartError, StoreError};
pub use storage::{CartRepository, InMemoryCartRepository, PgCartRepository};
