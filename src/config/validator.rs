use std::collections::HashMap;
use thiserror::Error;

use crate::config::{AddressSettings, ApiSettings, RateLimitConfig, ServerSettings, Settings};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

const KNOWN_PROVIDERS: [&str; 2] = ["viacep", "brasilapi"];

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        Self::validate_server(&settings.server, &mut errors);
        Self::validate_address(&settings.address, &mut errors);
        Self::validate_api(&settings.api, &mut errors);
        if let Some(rate_limit) = &settings.rate_limit {
            Self::validate_rate_limit(rate_limit, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &ServerSettings, errors: &mut Vec<ValidationError>) {
        if server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }

        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }
    }

    fn validate_address(address: &AddressSettings, errors: &mut Vec<ValidationError>) {
        if address.timeout_seconds == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "address.timeout_seconds".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if address.providers.is_empty() {
            errors.push(ValidationError::MissingField("address.providers".to_string()));
        }

        let mut seen = HashMap::new();
        for (idx, name) in address.providers.iter().enumerate() {
            if let Some(prev_idx) = seen.insert(name, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Address provider '{}' appears at indices {} and {}",
                    name, prev_idx, idx
                )));
            }
            if !KNOWN_PROVIDERS.contains(&name.as_str()) {
                errors.push(ValidationError::InvalidValue {
                    field: format!("address.providers[{}]", idx),
                    reason: format!(
                        "Unknown provider '{}', expected one of: {}",
                        name,
                        KNOWN_PROVIDERS.join(", ")
                    ),
                });
            }
        }

        if address.viacep_url.is_empty() {
            errors.push(ValidationError::MissingField("address.viacep_url".to_string()));
        }
        if address.brasilapi_url.is_empty() {
            errors.push(ValidationError::MissingField("address.brasilapi_url".to_string()));
        }
    }

    fn validate_api(api: &ApiSettings, errors: &mut Vec<ValidationError>) {
        if api.base_url.is_empty() {
            errors.push(ValidationError::MissingField("api.base_url".to_string()));
        }
        if api.timeout_seconds == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "api.timeout_seconds".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }
    }

    fn validate_rate_limit(rate_limit: &RateLimitConfig, errors: &mut Vec<ValidationError>) {
        if !rate_limit.enabled {
            return;
        }
        if rate_limit.requests_per_second == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "rate_limit.requests_per_second".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }
        if rate_limit.burst_size == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "rate_limit.burst_size".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }
    }
}
