//! Datastore client subsystem.
//!
//! # Data Flow
//! ```text
//! ProductService
//!     → Statement (rendered SQL + positional params)
//!     → Datastore::execute
//!         → postgres.rs (sqlx pool, binds params in order)
//!         → memory.rs (interprets the statement kind in-process)
//!     → Vec<Product> rows
//! ```
//!
//! # Design Decisions
//! - One statement per call; each is atomic, nothing spans statements
//! - Zero rows is a normal result, never an error
//! - Pool internals and timeouts belong to the driver

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::product::model::Product;
use crate::product::query::Statement;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by a datastore.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("malformed statement: {0}")]
    Malformed(String),
}

/// Executes parameterized statements and returns field-mapped rows.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn execute(&self, statement: &Statement) -> Result<Vec<Product>, StoreError>;

    /// Cheap round-trip used for readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
