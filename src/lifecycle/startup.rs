//! Startup checks.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and surfaces before an engine starts
//! - Every validation problem is reported at once, not just the first

use thiserror::Error;

use crate::config::{validate_config, ServerConfig, ValidationError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("missing host")]
    MissingHost,

    #[error("invalid configuration: {}", join(.0))]
    InvalidConfig(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check that `config` can start a server.
pub fn check(config: &ServerConfig) -> Result<(), StartupError> {
    validate_config(config).map_err(|errors| {
        if errors.iter().any(|e| matches!(e, ValidationError::MissingHost)) {
            tracing::error!("Server host is not configured");
            StartupError::MissingHost
        } else {
            StartupError::InvalidConfig(errors)
        }
    })
}
