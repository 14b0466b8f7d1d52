use cart_pricing_service::infra::{AppConfig, StorageBackend};
use cart_pricing_service::storage::{postgres, CartRepository, PgCartRepository};
use cart_pricing_service::RequestContext;
use std::time::Duration;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--skip-db]\n\
         \n\
         Reads the same env vars as api_server:\n\
           STORAGE_BACKEND (postgres|memory), DATABASE_URL or DB_HOST/DB_PORT/DB_NAME/DB_USERNAME/DB_PASSWORD,\n\
           PRICE_CATALOG, REQUEST_TIMEOUT_MS, SESSION_COOKIE_NAME, SESSION_COOKIE_MAX_AGE_SECS\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let skip_db = args.iter().any(|a| a == "--skip-db");

    let config = AppConfig::from_env()?;

    println!("> Preflight:");
    println!("  STORAGE_BACKEND={:?}", config.storage_backend);
    println!("  BIND_ADDRESS={}", config.bind_address());
    println!("  REQUEST_TIMEOUT_MS={}", config.request_timeout.as_millis());
    println!(
        "  SESSION_COOKIE={} (max-age {}s)",
        config.session_cookie_name,
        config.session_cookie_max_age.as_secs()
    );
    println!("  Catalog ({} products):", config.catalog.len());
    for (product, price) in config.catalog.products() {
        println!("    {} = {}", product, price);
    }
    if config.request_timeout.is_zero() {
        eprintln!("  Warning: REQUEST_TIMEOUT_MS=0 makes every storage call fail.");
    }

    if config.storage_backend == StorageBackend::Memory {
        println!("  In-memory backend selected; nothing to check in storage.");
    } else if skip_db {
        println!("  Skipping database checks (--skip-db).");
    } else {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres backend"))?;
        let repo = PgCartRepository::connect(url, 1)
            .await
            .map_err(|e| anyhow::anyhow!("Could not connect to postgres: {}", e))?;
        println!("  Connected; schema applied.");

        // Idempotent; confirms a second run is harmless.
        postgres::migrate(repo.pool()).await?;

        let ctx = RequestContext::with_timeout(Duration::from_secs(5));
        repo.ping(&ctx)
            .await
            .map_err(|e| anyhow::anyhow!("Database ping failed: {}", e))?;
        println!("  Database ping ok.");
    }

    println!("> Preflight OK.");
    Ok(())
}
