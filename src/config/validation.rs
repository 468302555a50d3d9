//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capacity > 0, interval > 0, cost within capacity)
//! - Check that bot categories, CIDR ranges and shield patterns parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::admission::bot::{BotCategory, Cidr};
use crate::config::schema::{AppConfig, DatabaseBackend};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.database.backend == DatabaseBackend::Postgres
        && config.database.url.as_deref().map_or(true, str::is_empty)
    {
        errors.push(ValidationError::new(
            "database.url",
            "required when backend is postgres",
        ));
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::new("database.max_connections", "must be > 0"));
    }

    let rl = &config.admission.rate_limit;
    if rl.capacity == 0 {
        errors.push(ValidationError::new("admission.rate_limit.capacity", "must be > 0"));
    }
    if rl.refill_rate == 0 {
        errors.push(ValidationError::new("admission.rate_limit.refill_rate", "must be > 0"));
    }
    if rl.interval_secs == 0 {
        errors.push(ValidationError::new("admission.rate_limit.interval_secs", "must be > 0"));
    }
    if rl.cost == 0 || rl.cost > rl.capacity {
        errors.push(ValidationError::new(
            "admission.rate_limit.cost",
            format!("must be between 1 and capacity ({})", rl.capacity),
        ));
    }

    for category in &config.admission.bot.allow {
        if category.parse::<BotCategory>().is_err() {
            errors.push(ValidationError::new(
                "admission.bot.allow",
                format!("unknown bot category '{}'", category),
            ));
        }
    }

    for ranges in &config.admission.bot.verified_ranges {
        for cidr in &ranges.cidrs {
            if cidr.parse::<Cidr>().is_err() {
                errors.push(ValidationError::new(
                    "admission.bot.verified_ranges",
                    format!("'{}' for {} is not a CIDR block", cidr, ranges.crawler),
                ));
            }
        }
    }

    for pattern in &config.admission.shield.extra_patterns {
        if let Err(e) = regex::Regex::new(pattern) {
            errors.push(ValidationError::new(
                "admission.shield.extra_patterns",
                format!("'{}' does not compile: {}", pattern, e),
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
