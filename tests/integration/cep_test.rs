use super::common;

use common::fake_providers;
use common::test_server::TestServer;
use estate_console::address::{
    AddressError, AddressProvider, AddressResolver, BrasilApiProvider, ProviderError,
    ViaCepProvider,
};
use estate_console::config::Settings;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

async fn get_cep(server: &TestServer, code: &str) -> (u16, Value) {
    let response = reqwest::Client::new()
        .get(server.url(&format!("/cep/{}", code)))
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_primary_serves() {
    let server = TestServer::new().await;
    let (status, body) = get_cep(&server, "01001-000").await;

    assert_eq!(status, 200);
    assert_eq!(body["cep"], "01001-000");
    assert_eq!(body["rua"], "Praça da Sé");
    assert_eq!(body["complemento"], "lado ímpar");
    assert_eq!(body["bairro"], "Sé");
    assert_eq!(body["cidade"], "São Paulo");
    assert_eq!(body["estado"], "SP");
    assert_eq!(body["fonte"], "viacep");
}

#[tokio::test]
async fn test_secondary_after_error_marker() {
    let server = TestServer::new().await;
    let (status, body) = get_cep(&server, "20040020").await;

    assert_eq!(status, 200);
    assert_eq!(body["cidade"], "Rio de Janeiro");
    assert_eq!(body["complemento"], "");
    assert_eq!(body["fonte"], "brasilapi");
}

#[tokio::test]
async fn test_unknown_everywhere() {
    let server = TestServer::new().await;
    let (status, body) = get_cep(&server, "99999999").await;

    assert_eq!(status, 404);
    assert!(body["error"].as_str().unwrap().contains("99999999"));
}

#[tokio::test]
async fn test_malformed_code() {
    let server = TestServer::new().await;
    for code in ["1234", "0100100a", "010010000"] {
        let (status, body) = get_cep(&server, code).await;
        assert_eq!(status, 400, "code {}", code);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_primary_down() {
    let mut settings = Settings::default();
    settings.address.viacep_url = fake_providers::dead_url().await;
    settings.address.brasilapi_url = fake_providers::spawn_brasilapi().await;
    let server = TestServer::with_settings(settings).await;

    let (status, body) = get_cep(&server, "01001000").await;
    assert_eq!(status, 200);
    assert_eq!(body["fonte"], "brasilapi");
}

#[tokio::test]
async fn test_all_providers_down() {
    let mut settings = Settings::default();
    settings.address.viacep_url = fake_providers::dead_url().await;
    settings.address.brasilapi_url = fake_providers::dead_url().await;
    let server = TestServer::with_settings(settings).await;

    let (status, body) = get_cep(&server, "01001000").await;
    assert_eq!(status, 502);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_provider_order_follows_config() {
    let mut settings = Settings::default();
    settings.address.providers = vec!["brasilapi".to_string(), "viacep".to_string()];
    settings.address.viacep_url = fake_providers::spawn_viacep().await;
    settings.address.brasilapi_url = fake_providers::spawn_brasilapi().await;
    let server = TestServer::with_settings(settings).await;

    let (_, body) = get_cep(&server, "01001000").await;
    assert_eq!(body["fonte"], "brasilapi");
}

#[tokio::test]
async fn test_rate_limited() {
    let server = TestServer::with_rate_limit(1, 1).await;

    let (status, _) = get_cep(&server, "01001000").await;
    assert_eq!(status, 200);
    let (status, body) = get_cep(&server, "01001000").await;
    assert_eq!(status, 429);
    assert_eq!(body["error"], "Rate limit exceeded");

    // health stays outside the limiter
    let response = reqwest::get(server.url("/health/live")).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_providers_against_fakes() {
    let viacep = ViaCepProvider::new(fake_providers::spawn_viacep().await);
    let brasilapi = BrasilApiProvider::new(fake_providers::spawn_brasilapi().await);

    assert_eq!(viacep.lookup("99999999").await, Err(ProviderError::NotFound));
    assert_eq!(viacep.lookup("50000000").await, Err(ProviderError::Status(500)));
    assert_eq!(brasilapi.lookup("99999999").await, Err(ProviderError::NotFound));
    assert_eq!(
        brasilapi.lookup("20040020").await.unwrap().street,
        "Avenida Rio Branco"
    );
}

#[tokio::test]
async fn test_resolver_status_then_not_found() {
    let providers: Vec<Arc<dyn AddressProvider>> = vec![
        Arc::new(ViaCepProvider::new(fake_providers::spawn_viacep().await)),
        Arc::new(BrasilApiProvider::new(fake_providers::spawn_brasilapi().await)),
    ];
    let resolver = AddressResolver::new(providers, Duration::from_secs(1));

    // 500 from ViaCEP, 404 from BrasilAPI
    assert_eq!(
        resolver.resolve_address("50000-000").await,
        Err(AddressError::NotFound {
            code: "50000000".to_string(),
            malformed: false
        })
    );
}
