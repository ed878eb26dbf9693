//! Ordered provider fallback

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{
    brasilapi, viacep, AddressError, AddressProvider, AddressRecord, BrasilApiProvider,
    ProviderError, ViaCepProvider,
};
use crate::adapters::metrics_handler::MetricsCollector;
use crate::config::AddressSettings;

/// Strip `-`, `.` and spaces; anything else, or a length other than 8,
/// makes the code malformed
pub fn normalize_postal_code(code: &str) -> Option<String> {
    let digits: String = code
        .chars()
        .filter(|c| !matches!(c, '-' | '.' | ' '))
        .collect();
    (digits.len() == 8 && digits.chars().all(|c| c.is_ascii_digit())).then_some(digits)
}

pub struct AddressResolver {
    providers: Vec<Arc<dyn AddressProvider>>,
    timeout: Duration,
    metrics: Option<Arc<MetricsCollector>>,
}

impl AddressResolver {
    pub fn new(providers: Vec<Arc<dyn AddressProvider>>, timeout: Duration) -> Self {
        Self {
            providers,
            timeout,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the configured chain. Provider names are checked by
    /// `ConfigValidator`; an unknown one here is still an error.
    pub fn from_settings(settings: &AddressSettings) -> anyhow::Result<Self> {
        let providers = settings
            .providers
            .iter()
            .map(|name| -> anyhow::Result<Arc<dyn AddressProvider>> {
                match name.as_str() {
                    viacep::NAME => Ok(Arc::new(ViaCepProvider::new(&settings.viacep_url))),
                    brasilapi::NAME => {
                        Ok(Arc::new(BrasilApiProvider::new(&settings.brasilapi_url)))
                    }
                    other => Err(anyhow::anyhow!("Unknown address provider '{}'", other)),
                }
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self::new(
            providers,
            Duration::from_secs(settings.timeout_seconds),
        ))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(
        &self,
        provider: &dyn AddressProvider,
        code: &str,
    ) -> Result<AddressRecord, ProviderError> {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, provider.lookup(code)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        };

        if let Some(metrics) = &self.metrics {
            let outcome = match &result {
                Ok(_) => "found",
                Err(e) => e.label(),
            };
            metrics
                .address_lookups
                .with_label_values(&[provider.name(), outcome])
                .inc();
            metrics
                .address_lookup_duration
                .with_label_values(&[provider.name()])
                .observe(started.elapsed().as_secs_f64());
        }
        result
    }

    /// Resolve a postal code through the chain.
    ///
    /// The first complete record wins. A provider that answers "not found"
    /// or a non-success status, times out, or fails in transport hands over
    /// to the next one without retrying. If any provider gave a negative
    /// answer the result is `NotFound`; if all failed in transport it is
    /// `Upstream`.
    pub async fn resolve_address(&self, code: &str) -> Result<AddressRecord, AddressError> {
        let Some(normalized) = normalize_postal_code(code) else {
            debug!(code, "Malformed postal code");
            return Err(AddressError::NotFound {
                code: code.to_string(),
                malformed: true,
            });
        };

        let mut negative_answer = false;
        let mut failures = Vec::new();

        for provider in &self.providers {
            match self.attempt(provider.as_ref(), &normalized).await {
                Ok(record) => {
                    debug!(code = %normalized, provider = provider.name(), "Address resolved");
                    return Ok(record);
                }
                Err(e) => {
                    if e.is_negative_answer() {
                        debug!(code = %normalized, provider = provider.name(), error = %e, "Provider has no address");
                        negative_answer = true;
                    } else {
                        warn!(code = %normalized, provider = provider.name(), error = %e, "Address provider failed");
                    }
                    failures.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        if negative_answer || self.providers.is_empty() {
            Err(AddressError::NotFound {
                code: normalized,
                malformed: false,
            })
        } else {
            Err(AddressError::Upstream(failures.join("; ")))
        }
    }
}
