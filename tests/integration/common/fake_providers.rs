//! Stand-ins for ViaCEP and BrasilAPI

use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

/// Knows Praça da Sé only; anything else gets the `erro` marker.
/// `50000000` answers 500.
async fn viacep(Path(cep): Path<String>) -> impl IntoResponse {
    match cep.as_str() {
        "01001000" => (
            StatusCode::OK,
            Json(json!({
                "cep": "01001-000",
                "logradouro": "Praça da Sé",
                "complemento": "lado ímpar",
                "bairro": "Sé",
                "localidade": "São Paulo",
                "uf": "SP"
            })),
        ),
        "50000000" => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
        _ => (StatusCode::OK, Json(json!({ "erro": true }))),
    }
}

/// Knows Praça da Sé and Avenida Rio Branco; 404 otherwise
async fn brasilapi(Path(cep): Path<String>) -> impl IntoResponse {
    match cep.as_str() {
        "01001000" => (
            StatusCode::OK,
            Json(json!({
                "cep": "01001000",
                "state": "SP",
                "city": "São Paulo",
                "neighborhood": "Sé",
                "street": "Praça da Sé",
                "service": "correios"
            })),
        ),
        "20040020" => (
            StatusCode::OK,
            Json(json!({
                "cep": "20040020",
                "state": "RJ",
                "city": "Rio de Janeiro",
                "neighborhood": "Centro",
                "street": "Avenida Rio Branco",
                "service": "open-cep"
            })),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "name": "CepPromiseError", "message": "CEP não encontrado" })),
        ),
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn spawn_viacep() -> String {
    serve(Router::new().route("/ws/:cep/json/", get(viacep))).await
}

pub async fn spawn_brasilapi() -> String {
    serve(Router::new().route("/api/cep/v1/:cep", get(brasilapi))).await
}

/// Base URL nothing listens on
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
