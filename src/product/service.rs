//! Product CRUD operations.

use std::sync::Arc;
use std::time::Instant;

use crate::error::{ServiceError, ValidationError};
use crate::observability::metrics;
use crate::product::model::{Product, ProductPayload};
use crate::product::query::{Statement, UpdateBuilder};
use crate::product::validation::{parse_id, validate_new, validate_patch};
use crate::store::{Datastore, StoreError};

/// Validated CRUD over products.
///
/// Each operation validates its whole input first, then runs exactly one
/// statement. Absence is detected from the returned rows, never from a
/// datastore error.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn Datastore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// All products, newest first.
    pub async fn list(&self) -> Result<Vec<Product>, ServiceError> {
        self.run(Statement::list_all()).await
    }

    pub async fn create(&self, payload: ProductPayload) -> Result<Product, ServiceError> {
        let product = validate_new(payload)?;
        let mut rows = self.run(Statement::insert(&product)).await?;

        let created = rows
            .pop()
            .ok_or_else(|| StoreError::Malformed("insert returned no row".into()))?;
        tracing::info!(product_id = created.id, "Product created");
        Ok(created)
    }

    pub async fn get(&self, id: &str) -> Result<Product, ServiceError> {
        let id = parse_id(id)?;
        first_or_not_found(self.run(Statement::select_by_id(id)).await?, id)
    }

    pub async fn update(&self, id: &str, payload: ProductPayload) -> Result<Product, ServiceError> {
        let id = parse_id(id)?;
        let patch = validate_patch(payload)?;
        let statement = UpdateBuilder::from_patch(id, &patch)
            .build()
            .ok_or(ValidationError::NoFieldsToUpdate)?;

        let updated = first_or_not_found(self.run(statement).await?, id)?;
        tracing::info!(product_id = id, "Product updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<Product, ServiceError> {
        let id = parse_id(id)?;
        let deleted = first_or_not_found(self.run(Statement::delete_by_id(id)).await?, id)?;
        tracing::info!(product_id = id, "Product deleted");
        Ok(deleted)
    }

    /// Datastore reachability.
    pub async fn health(&self) -> Result<(), ServiceError> {
        self.store.ping().await.map_err(ServiceError::from)
    }

    async fn run(&self, statement: Statement) -> Result<Vec<Product>, ServiceError> {
        let start = Instant::now();
        let result = self.store.execute(&statement).await;
        metrics::record_query(statement.label(), result.is_ok(), start);

        result.map_err(|e| {
            tracing::error!(statement = statement.label(), error = %e, "Datastore query failed");
            ServiceError::from(e)
        })
    }
}

fn first_or_not_found(rows: Vec<Product>, id: i64) -> Result<Product, ServiceError> {
    rows.into_iter().next().ok_or(ServiceError::NotFound(id))
}
