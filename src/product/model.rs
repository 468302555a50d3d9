//! Product records and the raw request payloads they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored product row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// Price as submitted by a client.
///
/// Form-driven clients send prices as strings, so both shapes are accepted;
/// anything else is kept so validation can reject it as an invalid price
/// rather than failing JSON decoding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// Body of a create or update request. Every field is optional here;
/// the operation decides which ones are required.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProductPayload {
    pub name: Option<String>,
    pub price: Option<PriceInput>,
    pub image: Option<String>,
}

/// A validated create request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub image: String,
}

/// A validated partial update. At least one field is `Some`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.image.is_none()
    }
}
