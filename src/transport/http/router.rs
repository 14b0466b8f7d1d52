use crate::domain::CartLine;
use crate::transport::http::handlers::{cart, health};
use crate::transport::http::types::{AddItemForm, ApiResponse, AppState};
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        cart::show_cart_handler,
        cart::add_item_handler,
        cart::remove_item_handler,
        cart::cart_json_handler
    ),
    components(schemas(ApiResponse, AddItemForm, CartLine))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(cart::show_cart_handler))
        .route("/add-item", post(cart::add_item_handler))
        .route("/remove-cart-item", get(cart::remove_item_handler))
        .route("/api/cart", get(cart::cart_json_handler))
        .route("/health", get(health::healthcheck_handler))
        .with_state(app_state)
}
