//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0) and endpoint URIs
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>

use url::Url;

use crate::config::schema::AppConfig;

/// One semantic problem found in a configuration.
#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.name.is_empty() {
        errors.push(ValidationError {
            field: "service.name".into(),
            message: "must not be empty".into(),
        });
    }
    if let Some(id) = &config.service.id {
        if id.is_empty() {
            errors.push(ValidationError {
                field: "service.id".into(),
                message: "must not be empty when set".into(),
            });
        }
    }
    for endpoint in &config.service.endpoints {
        if let Err(err) = Url::parse(endpoint) {
            errors.push(ValidationError {
                field: "service.endpoints".into(),
                message: format!("{endpoint}: {err}"),
            });
        }
    }
    if config.timeouts.registrar_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.registrar_secs".into(),
            message: "must be greater than zero".into(),
        });
    }
    if config.timeouts.stop_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.stop_secs".into(),
            message: "must be greater than zero".into(),
        });
    }
    if config.discovery.health_check_interval_secs == 0 {
        errors.push(ValidationError {
            field: "discovery.health_check_interval_secs".into(),
            message: "must be greater than zero".into(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
