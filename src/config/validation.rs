//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (max_fails > 0, rates > 0)
//! - Detect duplicate client identifiers
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientPoolConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::ClientPoolConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("pool.max_fails must be at least 1")]
    ZeroMaxFails,

    #[error("middleware.rate_limit.{field} must be at least 1")]
    InvalidRateLimit { field: &'static str },

    #[error("middleware.retry.attempts must be at least 1")]
    ZeroRetryAttempts,

    #[error("middleware.timeout.timeout_ms must be at least 1")]
    ZeroTimeout,

    #[error("client #{index} has an empty id")]
    EmptyClientId { index: usize },

    #[error("duplicate client id '{0}'")]
    DuplicateClientId(String),
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ClientPoolConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.pool.max_fails == 0 {
        errors.push(ValidationError::ZeroMaxFails);
    }

    let mw = &config.middleware;
    if mw.rate_limit.enabled {
        if mw.rate_limit.rps == 0 {
            errors.push(ValidationError::InvalidRateLimit { field: "rps" });
        }
        if mw.rate_limit.burst == 0 {
            errors.push(ValidationError::InvalidRateLimit { field: "burst" });
        }
    }
    if mw.retry.enabled && mw.retry.attempts == 0 {
        errors.push(ValidationError::ZeroRetryAttempts);
    }
    if mw.timeout.enabled && mw.timeout.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut seen = HashSet::new();
    for (index, client) in config.clients.iter().enumerate() {
        if client.id.trim().is_empty() {
            errors.push(ValidationError::EmptyClientId { index });
        } else if !seen.insert(client.id.as_str()) {
            errors.push(ValidationError::DuplicateClientId(client.id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
