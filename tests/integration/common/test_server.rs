use estate_console::adapters::metrics_handler::MetricsCollector;
use estate_console::address::AddressResolver;
use estate_console::config::{RateLimitConfig, Settings};
use estate_console::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::fake_providers;

pub struct TestServer {
    pub addr: SocketAddr,
    pub base_url: String,
}

impl TestServer {
    /// Server backed by both fake providers
    pub async fn new() -> Self {
        let mut settings = Settings::default();
        settings.address.viacep_url = fake_providers::spawn_viacep().await;
        settings.address.brasilapi_url = fake_providers::spawn_brasilapi().await;
        Self::with_settings(settings).await
    }

    pub async fn with_rate_limit(requests_per_second: u32, burst_size: u32) -> Self {
        let mut settings = Settings::default();
        settings.address.viacep_url = fake_providers::spawn_viacep().await;
        settings.address.brasilapi_url = fake_providers::spawn_brasilapi().await;
        settings.rate_limit = Some(RateLimitConfig {
            enabled: true,
            requests_per_second,
            burst_size,
        });
        Self::with_settings(settings).await
    }

    pub async fn with_settings(mut settings: Settings) -> Self {
        settings.server.port = 0; // Random port
        settings.address.timeout_seconds = 1;

        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let resolver = AddressResolver::from_settings(&settings.address)
            .unwrap()
            .with_metrics(metrics.clone());

        let app = estate_console::create_app(AppState {
            settings: Arc::new(RwLock::new(settings)),
            resolver: Arc::new(resolver),
            metrics,
        })
        .await;

        // Start server on random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to be ready
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestServer { addr, base_url }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
