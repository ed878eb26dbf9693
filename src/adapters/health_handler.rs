use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Settings;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub config: String,
    pub address_providers: usize,
}

pub struct HealthHandler {
    settings: Arc<RwLock<Settings>>,
    start_time: std::time::Instant,
}

impl HealthHandler {
    pub fn new(settings: Arc<RwLock<Settings>>) -> Self {
        Self {
            settings,
            start_time: std::time::Instant::now(),
        }
    }

    /// Basic health check - returns 200 if server is running
    pub async fn health(&self) -> impl IntoResponse {
        let providers = self.settings.read().await.address.providers.len();
        let status = HealthStatus {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            checks: HealthChecks {
                config: "ok".to_string(),
                address_providers: providers,
            },
        };

        (StatusCode::OK, Json(status))
    }

    /// Readiness check - ready once at least one address provider is configured
    pub async fn ready(&self) -> impl IntoResponse {
        let settings = self.settings.read().await;

        if !settings.address.providers.is_empty() {
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": "ready",
                    "message": "Server is ready to accept requests"
                })),
            )
        } else {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not_ready",
                    "message": "No address providers configured"
                })),
            )
        }
    }

    /// Liveness check - returns 200 if server is alive
    pub async fn live(&self) -> impl IntoResponse {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "alive",
                "message": "Server is alive"
            })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(settings: Settings) -> HealthHandler {
        HealthHandler::new(Arc::new(RwLock::new(settings)))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = handler(Settings::default()).health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_endpoint() {
        let response = handler(Settings::default()).ready().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let mut settings = Settings::default();
        settings.address.providers.clear();
        let response = handler(settings).ready().await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_live_endpoint() {
        let response = handler(Settings::default()).live().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
