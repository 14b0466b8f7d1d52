use crate::app::AddItemRequest;
use crate::transport::http::handlers::common::{
    internal_error_page, redirect_home, redirect_with_error, session_cookie, session_id_from_headers,
};
use crate::transport::http::types::{AddItemForm, ApiResponse, AppState, CartPageQuery, RemoveItemQuery};
use crate::transport::http::view::CartPage;
use askama::Template;
use axum::extract::rejection::FormRejection;
use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use tracing::{error, warn};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/",
    params(
        ("error" = Option<String>, Query, description = "Message shown above the form")
    ),
    responses(
        (status = 200, description = "Cart page (HTML); sets the session cookie on first visit", content_type = "text/html"),
        (status = 500, description = "Template rendering failed")
    )
)]
pub async fn show_cart_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CartPageQuery>,
) -> Response {
    let cookie_name = &state.config.session_cookie_name;
    let (session_id, new_cookie) = match session_id_from_headers(&headers, cookie_name) {
        Some(id) => (id, None),
        None => {
            let id = Uuid::new_v4().to_string();
            let cookie = session_cookie(cookie_name, &id, state.config.session_cookie_max_age);
            (id, cookie)
        }
    };

    let ctx = state.request_context();
    let items = state.cart_service.get_cart_data(&ctx, &session_id).await;
    let page = CartPage::new(
        state.cart_service.catalog(),
        items,
        query.error.unwrap_or_default(),
    );

    let html = match page.render() {
        Ok(html) => html,
        Err(e) => {
            error!(error = %e, "failed to render cart page");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = Html(html).into_response();
    if let Some(cookie) = new_cookie {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}

#[utoipa::path(
    post,
    path = "/add-item",
    request_body(content = AddItemForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Back to the cart page, with `?error=` when the input was rejected"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn add_item_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<AddItemForm>, FormRejection>,
) -> Response {
    let Some(session_id) = session_id_from_headers(&headers, &state.config.session_cookie_name) else {
        return redirect_home();
    };

    let Form(form) = match form {
        Ok(form) => form,
        Err(e) => return redirect_with_error(&e.body_text()),
    };

    let ctx = state.request_context();
    let request = AddItemRequest::new(form.product, form.quantity);
    match state
        .cart_service
        .add_item_to_cart(&ctx, &session_id, &request)
        .await
    {
        Ok(_) => redirect_home(),
        Err(e) if e.is_user_facing() => redirect_with_error(&e.to_string()),
        Err(e) => {
            error!(error = %e, "add item failed");
            internal_error_page()
        }
    }
}

#[utoipa::path(
    get,
    path = "/remove-cart-item",
    params(
        ("cart_item_id" = Option<String>, Query, description = "Id of the cart item to remove")
    ),
    responses(
        (status = 302, description = "Back to the cart page"),
        (status = 500, description = "Storage failure while deleting")
    )
)]
pub async fn remove_item_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RemoveItemQuery>,
) -> Response {
    let Some(session_id) = session_id_from_headers(&headers, &state.config.session_cookie_name) else {
        return redirect_home();
    };
    let Some(item_id) = query.cart_item_id.filter(|id| !id.is_empty()) else {
        return redirect_home();
    };

    let ctx = state.request_context();
    match state
        .cart_service
        .delete_cart_item(&ctx, &session_id, &item_id)
        .await
    {
        Ok(_) => redirect_home(),
        Err(e) => {
            error!(error = %e, item_id = %item_id, "delete cart item failed");
            internal_error_page()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Lines of the session's open cart (empty without a session)", body = ApiResponse)
    )
)]
pub async fn cart_json_handler(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let items = match session_id_from_headers(&headers, &state.config.session_cookie_name) {
        Some(session_id) => {
            let ctx = state.request_context();
            state.cart_service.get_cart_data(&ctx, &session_id).await
        }
        None => {
            warn!("cart requested without a session cookie");
            None
        }
    };

    Json(ApiResponse {
        success: true,
        data: Some(serde_json::json!({ "items": items.unwrap_or_default() })),
        error: None,
    })
}
