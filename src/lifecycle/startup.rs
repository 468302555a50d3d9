//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the configured datastore
//! - Create the schema when asked to
//!
//! # Design Decisions
//! - Fail fast: an unreachable database aborts startup

use std::sync::Arc;

use thiserror::Error;

use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::store::{Datastore, MemoryStore, PgStore, StoreError};

/// Failure to bring the datastore up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("datastore: {0}")]
    Store(#[from] StoreError),
}

/// Open the datastore selected by `config.backend`.
pub async fn build_store(config: &DatabaseConfig) -> Result<Arc<dyn Datastore>, StartupError> {
    match config.backend {
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory datastore, data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseBackend::Postgres => {
            let store = PgStore::connect(config).await?;
            if config.ensure_schema {
                store.ensure_schema().await?;
            }
            store.ping().await?;
            Ok(Arc::new(store))
        }
    }
}
