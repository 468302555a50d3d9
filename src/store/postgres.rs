//! PostgreSQL datastore backed by a sqlx connection pool.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::product::model::Product;
use crate::product::query::{Param, Statement};
use crate::store::{Datastore, StoreError};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        price DOUBLE PRECISION NOT NULL CHECK (price > 0),
        image VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a pool using the configured URL and limits.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Malformed("database url is not configured".into()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(url)
            .await?;

        tracing::info!(max_connections = config.max_connections, "Database pool created");
        Ok(Self { pool })
    }

    /// Create the `products` table if it is missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        tracing::info!("Products table ready");
        Ok(())
    }
}

#[async_trait]
impl Datastore for PgStore {
    async fn execute(&self, statement: &Statement) -> Result<Vec<Product>, StoreError> {
        let mut query = sqlx::query_as::<_, Product>(statement.sql());
        for param in statement.params() {
            query = match param {
                Param::Int(v) => query.bind(*v),
                Param::Float(v) => query.bind(*v),
                Param::Text(v) => query.bind(v.clone()),
            };
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let now: (chrono::DateTime<chrono::Utc>,) = sqlx::query_as("SELECT NOW()")
            .fetch_one(&self.pool)
            .await?;
        tracing::debug!(database_time = %now.0, "Database ping");
        Ok(())
    }
}
