//! Parameterized statements against the `products` table.
//!
//! Values never appear in statement text. Column names come only from the
//! closed [`Column`] set; every value travels as a positional [`Param`].

use crate::product::model::{NewProduct, ProductPatch};

const RETURNING: &str = "RETURNING id, name, price, image, created_at";

/// Columns a client may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Price,
    Image,
}

impl Column {
    pub const fn as_str(self) -> &'static str {
        match self {
            Column::Name => "name",
            Column::Price => "price",
            Column::Image => "image",
        }
    }
}

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Float(f64),
    Text(String),
}

/// What a statement does, for datastores that do not parse SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    ListAll,
    Insert,
    SelectById,
    /// Positional params follow `columns` in order, with the id last.
    UpdateById { columns: Vec<Column> },
    DeleteById,
}

/// A rendered statement and its bound values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    kind: StatementKind,
    sql: String,
    params: Vec<Param>,
}

impl Statement {
    pub fn list_all() -> Self {
        Self {
            kind: StatementKind::ListAll,
            sql: "SELECT id, name, price, image, created_at FROM products \
                  ORDER BY created_at DESC, id DESC"
                .to_string(),
            params: Vec::new(),
        }
    }

    pub fn insert(product: &NewProduct) -> Self {
        Self {
            kind: StatementKind::Insert,
            sql: format!("INSERT INTO products (name, price, image) VALUES ($1, $2, $3) {}", RETURNING),
            params: vec![
                Param::Text(product.name.clone()),
                Param::Float(product.price),
                Param::Text(product.image.clone()),
            ],
        }
    }

    pub fn select_by_id(id: i64) -> Self {
        Self {
            kind: StatementKind::SelectById,
            sql: "SELECT id, name, price, image, created_at FROM products WHERE id = $1".to_string(),
            params: vec![Param::Int(id)],
        }
    }

    pub fn delete_by_id(id: i64) -> Self {
        Self {
            kind: StatementKind::DeleteById,
            sql: format!("DELETE FROM products WHERE id = $1 {}", RETURNING),
            params: vec![Param::Int(id)],
        }
    }

    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Short name for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self.kind {
            StatementKind::ListAll => "list",
            StatementKind::Insert => "insert",
            StatementKind::SelectById => "select",
            StatementKind::UpdateById { .. } => "update",
            StatementKind::DeleteById => "delete",
        }
    }
}

/// Accumulates `(column, value)` pairs for a partial update.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    id: i64,
    assignments: Vec<(Column, Param)>,
}

impl UpdateBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            assignments: Vec::new(),
        }
    }

    /// Builder for exactly the fields present in `patch`.
    pub fn from_patch(id: i64, patch: &ProductPatch) -> Self {
        let mut builder = Self::new(id);
        if let Some(name) = &patch.name {
            builder = builder.set(Column::Name, Param::Text(name.clone()));
        }
        if let Some(price) = patch.price {
            builder = builder.set(Column::Price, Param::Float(price));
        }
        if let Some(image) = &patch.image {
            builder = builder.set(Column::Image, Param::Text(image.clone()));
        }
        builder
    }

    /// Assign a column. Setting the same column twice keeps the last value.
    pub fn set(mut self, column: Column, value: Param) -> Self {
        match self.assignments.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.assignments.push((column, value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Render the statement, or `None` when nothing was assigned.
    pub fn build(self) -> Option<Statement> {
        if self.assignments.is_empty() {
            return None;
        }

        let mut columns = Vec::with_capacity(self.assignments.len());
        let mut clauses = Vec::with_capacity(self.assignments.len());
        let mut params = Vec::with_capacity(self.assignments.len() + 1);

        for (index, (column, value)) in self.assignments.into_iter().enumerate() {
            clauses.push(format!("{} = ${}", column.as_str(), index + 1));
            columns.push(column);
            params.push(value);
        }
        params.push(Param::Int(self.id));

        let sql = format!(
            "UPDATE products SET {} WHERE id = ${} {}",
            clauses.join(", "),
            params.len(),
            RETURNING
        );

        Some(Statement {
            kind: StatementKind::UpdateById { columns },
            sql,
            params,
        })
    }
}
