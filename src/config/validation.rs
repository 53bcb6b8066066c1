//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs and their schemes
//! - Validate value ranges (timeouts > 0, intervals shorter than the timeout)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SubmitterConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::SubmitterConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field}: unsupported scheme '{scheme}'")]
    UnsupportedScheme { field: &'static str, scheme: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} ({value} ms) must be shorter than confirmation.timeout_ms ({timeout} ms)")]
    IntervalTooLong {
        field: &'static str,
        value: u64,
        timeout: u64,
    },

    #[error("unknown log level '{0}'")]
    LogLevel(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SubmitterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "rpc.url", &config.rpc.url, &["http", "https"]);
    for url in &config.rpc.failover_urls {
        check_url(&mut errors, "rpc.failover_urls", url, &["http", "https"]);
    }
    if config.rpc.ws_url.is_empty() {
        if let Ok(url) = config.rpc.websocket_url() {
            if !matches!(url.scheme(), "ws" | "wss") {
                errors.push(ValidationError::UnsupportedScheme {
                    field: "rpc.ws_url",
                    scheme: url.scheme().to_string(),
                });
            }
        }
    } else {
        check_url(&mut errors, "rpc.ws_url", &config.rpc.ws_url, &["ws", "wss"]);
    }

    if config.rpc.request_timeout_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "rpc.request_timeout_ms",
        });
    }

    let confirmation = &config.confirmation;
    let intervals = [
        ("confirmation.timeout_ms", confirmation.timeout_ms),
        (
            "confirmation.rebroadcast_interval_ms",
            confirmation.rebroadcast_interval_ms,
        ),
        ("confirmation.poll_interval_ms", confirmation.poll_interval_ms),
    ];
    for (field, value) in intervals {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }
    for &(field, value) in &intervals[1..] {
        if confirmation.timeout_ms > 0 && value >= confirmation.timeout_ms {
            errors.push(ValidationError::IntervalTooLong {
                field,
                value,
                timeout: confirmation.timeout_ms,
            });
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(
            config.observability.log_level.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: &str,
    schemes: &[&str],
) {
    match Url::parse(value) {
        Ok(url) if schemes.contains(&url.scheme()) => {}
        Ok(url) => errors.push(ValidationError::UnsupportedScheme {
            field,
            scheme: url.scheme().to_string(),
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}
