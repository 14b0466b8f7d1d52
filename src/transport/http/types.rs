use crate::app::{CartService, RequestContext};
use crate::infra::AppConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub cart_service: Arc<CartService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(cart_service: Arc<CartService>, config: Arc<AppConfig>) -> Self {
        Self { cart_service, config }
    }

    /// Context for one request's storage calls, bounded by `REQUEST_TIMEOUT_MS`.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.config.request_timeout)
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /add-item`. Missing fields arrive as empty strings and are
/// rejected by the cart service.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct AddItemForm {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub quantity: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct CartPageQuery {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RemoveItemQuery {
    #[serde(default)]
    pub cart_item_id: Option<String>,
}
