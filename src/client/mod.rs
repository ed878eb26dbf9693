//! Client for the back-office resource API
//!
//! Every resource (`owners`, `tenants`, `leases`, ...) exposes the same
//! list/detail/create/update surface, so one trait covers them all.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub mod envelope;
pub mod error;

pub use envelope::{unwrap_detail, unwrap_list, RowSet};
pub use error::{ApiError, ApiResult};

/// Reply to a create/update call, successful or not
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Field name -> message, only for fields the API named explicitly
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

impl MutationResponse {
    /// Build from a status and JSON body. `errors` may map a field to a
    /// string or to a list of strings (first one wins).
    pub fn from_body(status: u16, body: &Value) -> Self {
        let ok_status = (200..300).contains(&status);
        let success = body
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(ok_status)
            && ok_status;

        let message = body
            .get("message")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut errors = BTreeMap::new();
        if let Some(map) = body.get("errors").and_then(Value::as_object) {
            for (field, raw) in map {
                let text = match raw {
                    Value::String(s) => Some(s.clone()),
                    Value::Array(items) => items.iter().find_map(|v| v.as_str().map(str::to_string)),
                    _ => None,
                };
                if let Some(text) = text {
                    errors.insert(field.clone(), text);
                }
            }
        }

        Self {
            success,
            message,
            data: body.get("data").cloned(),
            errors,
        }
    }
}

#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// `GET /{resource}?{query}`; raw JSON body
    async fn list(&self, resource: &str, query: &str) -> ApiResult<Value>;

    /// `GET /{resource}/{id}`; raw JSON body
    async fn get(&self, resource: &str, id: &str) -> ApiResult<Value>;

    /// `POST /{resource}`
    async fn create(&self, resource: &str, body: &Value) -> ApiResult<MutationResponse>;

    /// `PUT /{resource}/{id}`
    async fn update(&self, resource: &str, id: &str, body: &Value) -> ApiResult<MutationResponse>;
}

/// reqwest-backed `ResourceApi`
#[derive(Clone)]
pub struct HttpResourceClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpResourceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &crate::config::ApiSettings) -> ApiResult<Self> {
        Self::new(
            settings.base_url.clone(),
            Duration::from_secs(settings.timeout_seconds),
        )
    }

    fn url(&self, resource: &str, id: Option<&str>) -> String {
        let resource = resource.trim_matches('/');
        match id {
            Some(id) => format!(
                "{}/{}/{}",
                self.base_url,
                resource,
                urlencoding::encode(id)
            ),
            None => format!("{}/{}", self.base_url, resource),
        }
    }

    async fn read_json(response: reqwest::Response) -> ApiResult<Value> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| {
                    body.get("message")
                        .or_else(|| body.get("error"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or(text);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn read_mutation(response: reqwest::Response) -> ApiResult<MutationResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        Ok(MutationResponse::from_body(status, &body))
    }
}

#[async_trait]
impl ResourceApi for HttpResourceClient {
    async fn list(&self, resource: &str, query: &str) -> ApiResult<Value> {
        let url = if query.is_empty() {
            self.url(resource, None)
        } else {
            format!("{}?{}", self.url(resource, None), query)
        };
        debug!(%url, "Listing resource");
        let response = self.client.get(url).send().await?;
        Self::read_json(response).await
    }

    async fn get(&self, resource: &str, id: &str) -> ApiResult<Value> {
        let response = self.client.get(self.url(resource, Some(id))).send().await?;
        Self::read_json(response).await
    }

    async fn create(&self, resource: &str, body: &Value) -> ApiResult<MutationResponse> {
        let response = self
            .client
            .post(self.url(resource, None))
            .json(body)
            .send()
            .await?;
        Self::read_mutation(response).await
    }

    async fn update(&self, resource: &str, id: &str, body: &Value) -> ApiResult<MutationResponse> {
        let response = self
            .client
            .put(self.url(resource, Some(id)))
            .json(body)
            .send()
            .await?;
        Self::read_mutation(response).await
    }
}
