// src/bin/api_server.rs

use cart_pricing_service::app::CartService;
use cart_pricing_service::infra::telemetry::init_tracing;
use cart_pricing_service::infra::{AppConfig, StorageBackend};
use cart_pricing_service::storage::{CartRepository, InMemoryCartRepository, PgCartRepository};
use cart_pricing_service::transport;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    // --- Configuration ---
    let config = AppConfig::from_env()?;
    info!(
        backend = ?config.storage_backend,
        products = config.catalog.len(),
        timeout_ms = config.request_timeout.as_millis() as u64,
        "configuration loaded"
    );

    // --- Storage ---
    let repo: Arc<dyn CartRepository> = match config.storage_backend {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres backend"))?;
            let repo = PgCartRepository::connect(url, config.db_max_connections).await?;
            info!(max_connections = config.db_max_connections, "connected to postgres");
            Arc::new(repo)
        }
        StorageBackend::Memory => {
            warn!("using the in-memory cart store; carts are lost on restart");
            Arc::new(InMemoryCartRepository::new())
        }
    };

    // --- Service ---
    let cart_service = Arc::new(CartService::new(config.catalog.clone(), repo));
    let bind_address = config.bind_address();
    let app_state = transport::http::AppState::new(cart_service, Arc::new(config));

    // --- API Server ---
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "cart server listening");
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
            }
        })
        .await?;

    info!("graceful shutdown complete");
    Ok(())
}
