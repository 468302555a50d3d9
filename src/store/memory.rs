//! In-process datastore with the same statement contract as Postgres.
//!
//! Each `execute` call holds the table lock for its whole duration, which
//! gives the single-statement atomicity the service relies on.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::product::model::Product;
use crate::product::query::{Column, Param, Statement, StatementKind};
use crate::store::{Datastore, StoreError};

#[derive(Debug, Default)]
struct Table {
    /// Last id handed out. Ids are never reused, even after deletes.
    last_id: i64,
    rows: BTreeMap<i64, Product>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn int_at(params: &[Param], index: usize) -> Result<i64, StoreError> {
    match params.get(index) {
        Some(Param::Int(v)) => Ok(*v),
        other => Err(StoreError::Malformed(format!("expected integer at ${}, got {:?}", index + 1, other))),
    }
}

fn text_at(params: &[Param], index: usize) -> Result<String, StoreError> {
    match params.get(index) {
        Some(Param::Text(v)) => Ok(v.clone()),
        other => Err(StoreError::Malformed(format!("expected text at ${}, got {:?}", index + 1, other))),
    }
}

fn price_at(params: &[Param], index: usize) -> Result<f64, StoreError> {
    let price = match params.get(index) {
        Some(Param::Float(v)) => *v,
        other => {
            return Err(StoreError::Malformed(format!("expected number at ${}, got {:?}", index + 1, other)))
        }
    };
    if price > 0.0 {
        Ok(price)
    } else {
        Err(StoreError::Constraint("price must be > 0".into()))
    }
}

impl Table {
    fn apply(&mut self, statement: &Statement) -> Result<Vec<Product>, StoreError> {
        let params = statement.params();
        match statement.kind() {
            StatementKind::ListAll => {
                let mut rows: Vec<Product> = self.rows.values().cloned().collect();
                rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
                Ok(rows)
            }
            StatementKind::Insert => {
                let name = text_at(params, 0)?;
                let price = price_at(params, 1)?;
                let image = text_at(params, 2)?;

                self.last_id += 1;
                let product = Product {
                    id: self.last_id,
                    name,
                    price,
                    image,
                    created_at: Utc::now(),
                };
                self.rows.insert(product.id, product.clone());
                Ok(vec![product])
            }
            StatementKind::SelectById => {
                let id = int_at(params, 0)?;
                Ok(self.rows.get(&id).cloned().into_iter().collect())
            }
            StatementKind::UpdateById { columns } => {
                let id = int_at(params, columns.len())?;
                let Some(current) = self.rows.get(&id) else {
                    return Ok(Vec::new());
                };

                // Build the new row fully before writing so a bad param leaves the row untouched.
                let mut updated = current.clone();
                for (index, column) in columns.iter().enumerate() {
                    match column {
                        Column::Name => updated.name = text_at(params, index)?,
                        Column::Price => updated.price = price_at(params, index)?,
                        Column::Image => updated.image = text_at(params, index)?,
                    }
                }
                self.rows.insert(id, updated.clone());
                Ok(vec![updated])
            }
            StatementKind::DeleteById => {
                let id = int_at(params, 0)?;
                Ok(self.rows.remove(&id).into_iter().collect())
            }
        }
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn execute(&self, statement: &Statement) -> Result<Vec<Product>, StoreError> {
        self.lock().apply(statement)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
