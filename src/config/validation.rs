//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject configs the engine cannot bind with (missing host)
//! - Validate value ranges (worker counts, metrics address)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before any engine starts, so failures never reach a forked process

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("host must not be empty")]
    MissingHost,

    #[error("host {0:?} contains whitespace")]
    InvalidHost(String),

    #[error("worker_num must be at least 1")]
    NoWorkers,

    #[error("process_name must not be empty")]
    MissingProcessName,

    #[error("metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let host = config.host.trim();
    if host.is_empty() {
        errors.push(ValidationError::MissingHost);
    } else if host.chars().any(char::is_whitespace) {
        errors.push(ValidationError::InvalidHost(config.host.clone()));
    }

    if config.worker_num == 0 {
        errors.push(ValidationError::NoWorkers);
    }

    if config.process_name.trim().is_empty() {
        errors.push(ValidationError::MissingProcessName);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ServerConfig {
            host: "  ".into(),
            worker_num: 0,
            ..ServerConfig::default()
        };
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingHost,
                ValidationError::NoWorkers,
                ValidationError::InvalidMetricsAddress("nowhere".into()),
            ]
        );
    }
}
