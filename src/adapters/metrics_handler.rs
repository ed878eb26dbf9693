use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

pub struct MetricsCollector {
    registry: Registry,

    // Address provider metrics
    pub address_lookups: CounterVec,
    pub address_lookup_duration: HistogramVec,

    // Façade metrics
    pub cep_requests: CounterVec,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let address_lookups = CounterVec::new(
            Opts::new(
                "estate_address_lookups_total",
                "Address provider attempts by outcome",
            ),
            &["provider", "outcome"],
        )?;
        registry.register(Box::new(address_lookups.clone()))?;

        let address_lookup_duration = HistogramVec::new(
            HistogramOpts::new(
                "estate_address_lookup_duration_seconds",
                "Address provider attempt duration in seconds",
            ),
            &["provider"],
        )?;
        registry.register(Box::new(address_lookup_duration.clone()))?;

        let cep_requests = CounterVec::new(
            Opts::new("estate_cep_requests_total", "Postal-code lookups served"),
            &["status"],
        )?;
        registry.register(Box::new(cep_requests.clone()))?;

        Ok(Self {
            registry,
            address_lookups,
            address_lookup_duration,
            cep_requests,
        })
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct MetricsHandler {
    collector: Arc<MetricsCollector>,
}

impl MetricsHandler {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }

    pub fn collector(&self) -> &Arc<MetricsCollector> {
        &self.collector
    }

    pub async fn metrics(&self) -> String {
        self.collector.encode().unwrap_or_else(|e| {
            tracing::error!("Failed to encode metrics: {}", e);
            String::from("# Error encoding metrics\n")
        })
    }
}
