//! `GET /cep/:code` over the address provider chain

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

use crate::adapters::metrics_handler::MetricsCollector;
use crate::address::{AddressError, AddressRecord, AddressResolver};

#[derive(Clone)]
pub struct CepState {
    pub resolver: Arc<AddressResolver>,
    pub metrics: Arc<MetricsCollector>,
}

/// Wire shape the console front end reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CepResponse {
    pub cep: String,
    pub rua: String,
    pub complemento: String,
    pub bairro: String,
    pub cidade: String,
    pub estado: String,
    pub fonte: String,
}

impl From<AddressRecord> for CepResponse {
    fn from(record: AddressRecord) -> Self {
        Self {
            cep: record.postal_code,
            rua: record.street,
            complemento: record.complement,
            bairro: record.district,
            cidade: record.city,
            estado: record.state,
            fonte: record.source,
        }
    }
}

pub async fn lookup_cep(State(state): State<CepState>, Path(code): Path<String>) -> Response {
    let (status, body) = match state.resolver.resolve_address(&code).await {
        Ok(record) => {
            debug!(code, source = %record.source, "CEP served");
            (StatusCode::OK, json!(CepResponse::from(record)))
        }
        Err(AddressError::NotFound {
            malformed: true, ..
        }) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "CEP inválido: informe 8 dígitos" }),
        ),
        Err(AddressError::NotFound { code, .. }) => (
            StatusCode::NOT_FOUND,
            json!({ "error": format!("CEP {} não encontrado", code) }),
        ),
        Err(AddressError::Upstream(message)) => {
            error!(code, error = %message, "All address providers failed");
            (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "Serviço de CEP indisponível, tente novamente" }),
            )
        }
    };

    state
        .metrics
        .cep_requests
        .with_label_values(&[status.as_str()])
        .inc();
    (status, Json(body)).into_response()
}
