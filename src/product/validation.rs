//! Input validation for product operations.
//!
//! Every check here runs before a statement is built, so a rejected request
//! never reaches the datastore.

use crate::error::ValidationError;
use crate::product::model::{NewProduct, PriceInput, ProductPatch, ProductPayload};

/// Parse a path id. Non-numeric or empty ids are a validation error, not a miss.
pub fn parse_id(raw: &str) -> Result<i64, ValidationError> {
    raw.parse::<i64>().map_err(|_| ValidationError::InvalidId)
}

/// Validate a create payload: all fields present, then a positive price.
pub fn validate_new(payload: ProductPayload) -> Result<NewProduct, ValidationError> {
    let name = non_blank(payload.name);
    let image = non_blank(payload.image);
    let price = payload.price.filter(is_provided);

    let (Some(name), Some(price), Some(image)) = (name, price, image) else {
        return Err(ValidationError::MissingFields);
    };

    Ok(NewProduct {
        name,
        price: parse_price(&price)?,
        image,
    })
}

/// Validate an update payload: at least one field, and a positive price if given.
pub fn validate_patch(payload: ProductPayload) -> Result<ProductPatch, ValidationError> {
    let patch_price = payload.price.filter(is_provided);
    let name = non_blank(payload.name);
    let image = non_blank(payload.image);

    if name.is_none() && patch_price.is_none() && image.is_none() {
        return Err(ValidationError::NoFieldsToUpdate);
    }

    let price = patch_price.as_ref().map(parse_price).transpose()?;

    Ok(ProductPatch { name, price, image })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_provided(price: &PriceInput) -> bool {
    !matches!(price, PriceInput::Text(s) if s.trim().is_empty())
}

fn parse_price(price: &PriceInput) -> Result<f64, ValidationError> {
    let value = match price {
        PriceInput::Number(n) => *n,
        PriceInput::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::InvalidPrice)?,
        PriceInput::Other(_) => return Err(ValidationError::InvalidPrice),
    };

    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::InvalidPrice)
    }
}
