//! Postal-code (CEP) address resolution
//!
//! Providers are tried in order; each attempt is bounded by the resolver's
//! timeout. Every provider's response shape is normalized into
//! `AddressRecord` before it leaves this module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod brasilapi;
pub mod hook;
pub mod resolver;
pub mod viacep;

pub use brasilapi::BrasilApiProvider;
pub use hook::{AddressFieldMap, AddressLookupHook};
pub use resolver::{normalize_postal_code, AddressResolver};
pub use viacep::ViaCepProvider;

/// A fully populated address. `complement` is the only field allowed to be
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Formatted `00000-000`
    pub postal_code: String,
    pub street: String,
    #[serde(default)]
    pub complement: String,
    pub district: String,
    pub city: String,
    /// Two-letter UF
    pub state: String,
    /// Provider that served the record
    pub source: String,
}

impl AddressRecord {
    pub fn is_complete(&self) -> bool {
        [
            &self.postal_code,
            &self.street,
            &self.district,
            &self.city,
            &self.state,
            &self.source,
        ]
        .iter()
        .all(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    /// Malformed code, or no provider knows it
    #[error("Postal code not found: {code}")]
    NotFound { code: String, malformed: bool },

    /// Every provider failed at the transport level
    #[error("Address providers unavailable: {0}")]
    Upstream(String),
}

/// Outcome of one provider attempt
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("not found")]
    NotFound,

    #[error("status {0}")]
    Status(u16),

    #[error("timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// The provider answered, it just had nothing for this code
    pub fn is_negative_answer(&self) -> bool {
        matches!(self, ProviderError::NotFound | ProviderError::Status(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProviderError::NotFound => "not_found",
            ProviderError::Status(_) => "status",
            ProviderError::Timeout => "timeout",
            ProviderError::Transport(_) => "transport",
            ProviderError::Malformed(_) => "malformed",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait AddressProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Look up an 8-digit code (no separators)
    async fn lookup(&self, code: &str) -> Result<AddressRecord, ProviderError>;
}

/// Trimmed string field of a provider payload, empty when absent
pub(crate) fn text_field(payload: &serde_json::Value, key: &str) -> String {
    payload
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
