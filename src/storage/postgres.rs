//! Cart repository backed by PostgreSQL.

use crate::app::context::RequestContext;
use crate::domain::{Cart, CartItem, CartStatus};
use crate::error::{StoreError, StoreResult};
use crate::storage::CartRepository;
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

const CART_COLUMNS: &str = "id, session_id, status";
const ITEM_COLUMNS: &str = "id, cart_id, product_id, quantity, price";

/// Statements run at startup. Re-running them is a no-op.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS carts (
        id BIGSERIAL PRIMARY KEY,
        session_id TEXT NOT NULL CHECK (session_id <> ''),
        status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'closed')),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    // At most one open cart per session.
    "CREATE UNIQUE INDEX IF NOT EXISTS carts_open_session_idx
        ON carts (session_id) WHERE status = 'open'",
    "CREATE TABLE IF NOT EXISTS cart_items (
        id BIGSERIAL PRIMARY KEY,
        cart_id BIGINT NOT NULL REFERENCES carts (id) ON DELETE CASCADE,
        product_id TEXT NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        price NUMERIC NOT NULL CHECK (price >= 0),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (cart_id, product_id)
    )",
];

/// Creates the `carts` and `cart_items` tables and their indexes if missing.
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!(statements = SCHEMA.len(), "cart schema is up to date");
    Ok(())
}

#[derive(Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url` and applies the schema.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        migrate(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn cart_from_row(row: &PgRow) -> StoreResult<Cart> {
    let status: String = row.try_get("status")?;
    let status = status.parse::<CartStatus>().map_err(StoreError::Rejected)?;
    Ok(Cart {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        status,
    })
}

fn item_from_row(row: &PgRow) -> StoreResult<CartItem> {
    Ok(CartItem {
        id: Some(row.try_get("id")?),
        cart_id: row.try_get("cart_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
        price: row.try_get("price")?,
    })
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn get_open_cart(&self, ctx: &RequestContext, session_id: &str) -> StoreResult<Cart> {
        let sql = format!(
            "SELECT {} FROM carts WHERE status = $1 AND session_id = $2 LIMIT 1",
            CART_COLUMNS
        );
        ctx.run(async {
            let row = sqlx::query(&sql)
                .bind(CartStatus::Open.as_str())
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::NotFound)?;
            cart_from_row(&row)
        })
        .await
    }

    async fn create_cart(&self, ctx: &RequestContext, session_id: &str) -> StoreResult<Cart> {
        if session_id.is_empty() {
            return Err(StoreError::Rejected("cart session id must not be empty".to_string()));
        }
        // The no-op update makes RETURNING yield the open cart a concurrent request created.
        let sql = format!(
            "INSERT INTO carts (session_id, status) VALUES ($1, $2)
             ON CONFLICT (session_id) WHERE status = 'open'
             DO UPDATE SET updated_at = now()
             RETURNING {}",
            CART_COLUMNS
        );
        ctx.run(async {
            let row = sqlx::query(&sql)
                .bind(session_id)
                .bind(CartStatus::Open.as_str())
                .fetch_one(&self.pool)
                .await?;
            cart_from_row(&row)
        })
        .await
    }

    async fn upsert_item(&self, ctx: &RequestContext, item: CartItem) -> StoreResult<CartItem> {
        ctx.run(async {
            let row = match item.id {
                None => {
                    let sql = format!(
                        "INSERT INTO cart_items (cart_id, product_id, quantity, price)
                         VALUES ($1, $2, $3, $4)
                         ON CONFLICT (cart_id, product_id) DO UPDATE
                         SET quantity = cart_items.quantity + EXCLUDED.quantity,
                             price = cart_items.price + EXCLUDED.price,
                             updated_at = now()
                         RETURNING {}",
                        ITEM_COLUMNS
                    );
                    sqlx::query(&sql)
                        .bind(item.cart_id)
                        .bind(&item.product_id)
                        .bind(item.quantity)
                        .bind(item.price)
                        .fetch_one(&self.pool)
                        .await?
                }
                Some(id) => {
                    let sql = format!(
                        "UPDATE cart_items
                         SET cart_id = $2, product_id = $3, quantity = $4, price = $5, updated_at = now()
                         WHERE id = $1
                         RETURNING {}",
                        ITEM_COLUMNS
                    );
                    sqlx::query(&sql)
                        .bind(id)
                        .bind(item.cart_id)
                        .bind(&item.product_id)
                        .bind(item.quantity)
                        .bind(item.price)
                        .fetch_optional(&self.pool)
                        .await?
                        .ok_or(StoreError::NotFound)?
                }
            };
            item_from_row(&row)
        })
        .await
    }

    async fn get_item_by_id(&self, ctx: &RequestContext, id: i64) -> StoreResult<CartItem> {
        let sql = format!("SELECT {} FROM cart_items WHERE id = $1", ITEM_COLUMNS);
        ctx.run(async {
            let row = sqlx::query(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::NotFound)?;
            item_from_row(&row)
        })
        .await
    }

    async fn get_item_by_cart_and_product(
        &self,
        ctx: &RequestContext,
        cart_id: i64,
        product_id: &str,
    ) -> StoreResult<CartItem> {
        let sql = format!(
            "SELECT {} FROM cart_items WHERE cart_id = $1 AND product_id = $2",
            ITEM_COLUMNS
        );
        ctx.run(async {
            let row = sqlx::query(&sql)
                .bind(cart_id)
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::NotFound)?;
            item_from_row(&row)
        })
        .await
    }

    async fn list_items(&self, ctx: &RequestContext, cart_id: i64) -> StoreResult<Vec<CartItem>> {
        let sql = format!(
            "SELECT {} FROM cart_items WHERE cart_id = $1 ORDER BY id",
            ITEM_COLUMNS
        );
        ctx.run(async {
            let rows = sqlx::query(&sql).bind(cart_id).fetch_all(&self.pool).await?;
            rows.iter().map(item_from_row).collect()
        })
        .await
    }

    async fn delete_item(&self, ctx: &RequestContext, item: &CartItem) -> StoreResult<()> {
        let Some(id) = item.id else {
            return Ok(());
        };
        ctx.run(async {
            sqlx::query("DELETE FROM cart_items WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn delete_cart(&self, ctx: &RequestContext, cart: &Cart) -> StoreResult<()> {
        // cart_items rows go with it (ON DELETE CASCADE).
        ctx.run(async {
            sqlx::query("DELETE FROM carts WHERE id = $1")
                .bind(cart.id)
                .execute(&self.pool)
                .await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn ping(&self, ctx: &RequestContext) -> StoreResult<()> {
        ctx.run(async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok::<_, StoreError>(())
        })
        .await
    }
}
