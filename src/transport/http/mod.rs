pub mod router;
pub mod types;
pub mod view;
pub mod handlers {
    pub mod cart;
    pub mod common;
    pub mod health;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
