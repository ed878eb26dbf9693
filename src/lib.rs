//! # Estate Console
//!
//! Headless core of a real-estate back-office console: a declarative
//! multi-step form engine, listing-table state and fetching, and a
//! postal-code (CEP) resolver with provider fallback, plus a small HTTP
//! service exposing the resolver.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use estate_console::form::{FieldDescriptor, FieldKind, FormDefinition, MultiStepForm};
//!
//! let definition = FormDefinition::single(vec![
//!     FieldDescriptor::new("name", "Nome", FieldKind::Text).required(),
//!     FieldDescriptor::new("email", "E-mail", FieldKind::Email),
//! ])
//! .unwrap();
//! let mut form = MultiStepForm::new(definition);
//! form.set_field("name", "Maria");
//! assert!(form.validate_all().is_empty());
//! ```
//!
//! ## Layout
//!
//! - **domain**: snapshot, context and nested path values shared by the engines
//! - **form**: field model, validation, visibility, masks, cascades, controller
//! - **table**: query state, columns, fetcher
//! - **address**: CEP providers and the fallback chain
//! - **client**: back-office resource API client
//! - **adapters**: HTTP handlers
//! - **config**: settings and validation

pub mod adapters;
pub mod address;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod form;
pub mod table;

use crate::adapters::cep_handler::{self, CepState};
use crate::adapters::health_handler::HealthHandler;
use crate::adapters::metrics_handler::{MetricsCollector, MetricsHandler};
use crate::address::AddressResolver;
use crate::config::Settings;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything the router needs
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<RwLock<Settings>>,
    pub resolver: Arc<AddressResolver>,
    pub metrics: Arc<MetricsCollector>,
}

/// Creates the Axum application router with all endpoints configured.
pub async fn create_app(state: AppState) -> Router {
    let health_handler = Arc::new(HealthHandler::new(state.settings.clone()));
    let metrics_handler = Arc::new(MetricsHandler::new(state.metrics.clone()));

    let public_router = Router::new()
        .route("/health", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.health().await }
            }
        }))
        .route("/health/ready", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.ready().await }
            }
        }))
        .route("/health/live", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.live().await }
            }
        }))
        .route("/metrics", get({
            let handler = metrics_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.metrics().await }
            }
        }));

    let mut cep_router = Router::new()
        .route("/cep/:code", get(cep_handler::lookup_cep))
        .with_state(CepState {
            resolver: state.resolver.clone(),
            metrics: state.metrics.clone(),
        });

    // Rate limiting applies to the lookup route only
    let settings = state.settings.read().await;
    if let Some(rate_limit) = &settings.rate_limit {
        if rate_limit.enabled {
            let limiter = crate::adapters::rate_limit::create_limiter(
                rate_limit.requests_per_second,
                rate_limit.burst_size,
            );

            cep_router = cep_router.layer(axum::middleware::from_fn_with_state(
                limiter,
                crate::adapters::rate_limit::rate_limit_middleware,
            ));
        }
    }

    public_router.merge(cep_router).layer(
        tower_http::cors::CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}
