use async_trait::async_trait;
use serde_json::Value;

use super::{text_field, AddressProvider, AddressRecord, ProviderError};
use crate::form::mask::{apply_mask, MaskKind};

pub const NAME: &str = "viacep";

/// ViaCEP: `GET {base}/ws/{cep}/json/`. Unknown codes answer 200 with
/// `{"erro": true}`.
pub struct ViaCepProvider {
    client: reqwest::Client,
    base_url: String,
}

impl ViaCepProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

fn is_error_marker(payload: &Value) -> bool {
    match payload.get("erro") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

pub(crate) fn parse(code: &str, payload: &Value) -> Result<AddressRecord, ProviderError> {
    if is_error_marker(payload) {
        return Err(ProviderError::NotFound);
    }
    if !payload.is_object() {
        return Err(ProviderError::Malformed("expected an object".to_string()));
    }
    let record = AddressRecord {
        postal_code: apply_mask(MaskKind::Cep, code),
        street: text_field(payload, "logradouro"),
        complement: text_field(payload, "complemento"),
        district: text_field(payload, "bairro"),
        city: text_field(payload, "localidade"),
        state: text_field(payload, "uf"),
        source: NAME.to_string(),
    };
    if record.is_complete() {
        Ok(record)
    } else {
        Err(ProviderError::Malformed("incomplete address".to_string()))
    }
}

#[async_trait]
impl AddressProvider for ViaCepProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn lookup(&self, code: &str) -> Result<AddressRecord, ProviderError> {
        let response = self
            .client
            .get(format!("{}/ws/{}/json/", self.base_url, code))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }
        let payload: Value = response.json().await?;
        parse(code, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_found() {
        let payload = json!({
            "cep": "01001-000",
            "logradouro": "Praça da Sé",
            "complemento": "lado ímpar",
            "bairro": "Sé",
            "localidade": "São Paulo",
            "uf": "SP",
            "ibge": "3550308"
        });
        let record = parse("01001000", &payload).unwrap();
        assert_eq!(record.postal_code, "01001-000");
        assert_eq!(record.street, "Praça da Sé");
        assert_eq!(record.complement, "lado ímpar");
        assert_eq!(record.city, "São Paulo");
        assert_eq!(record.source, "viacep");
    }

    #[test]
    fn test_parse_error_marker() {
        assert_eq!(parse("99999999", &json!({ "erro": true })), Err(ProviderError::NotFound));
        assert_eq!(parse("99999999", &json!({ "erro": "true" })), Err(ProviderError::NotFound));
    }

    #[test]
    fn test_parse_partial_is_rejected() {
        // some single-CEP towns come back without street or district
        let payload = json!({ "localidade": "Itaporã", "uf": "MS", "logradouro": "", "bairro": "" });
        assert!(matches!(parse("79890000", &payload), Err(ProviderError::Malformed(_))));
    }
}
