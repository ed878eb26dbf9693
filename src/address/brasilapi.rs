use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use super::{text_field, AddressProvider, AddressRecord, ProviderError};
use crate::form::mask::{apply_mask, MaskKind};

pub const NAME: &str = "brasilapi";

/// BrasilAPI: `GET {base}/api/cep/v1/{cep}`, 404 for unknown codes
pub struct BrasilApiProvider {
    client: reqwest::Client,
    base_url: String,
}

impl BrasilApiProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

pub(crate) fn parse(code: &str, payload: &Value) -> Result<AddressRecord, ProviderError> {
    if !payload.is_object() {
        return Err(ProviderError::Malformed("expected an object".to_string()));
    }
    let record = AddressRecord {
        postal_code: apply_mask(MaskKind::Cep, code),
        street: text_field(payload, "street"),
        complement: String::new(),
        district: text_field(payload, "neighborhood"),
        city: text_field(payload, "city"),
        state: text_field(payload, "state"),
        source: NAME.to_string(),
    };
    if record.is_complete() {
        Ok(record)
    } else {
        Err(ProviderError::Malformed("incomplete address".to_string()))
    }
}

#[async_trait]
impl AddressProvider for BrasilApiProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn lookup(&self, code: &str) -> Result<AddressRecord, ProviderError> {
        let response = self
            .client
            .get(format!("{}/api/cep/v1/{}", self.base_url, code))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound),
            status if !status.is_success() => Err(ProviderError::Status(status.as_u16())),
            _ => {
                let payload: Value = response.json().await?;
                parse(code, &payload)
            }
        }
    }
}
