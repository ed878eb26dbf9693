//! Client-side field validation
//!
//! Checks run in a fixed order and the first failure wins:
//! hidden/disabled skip, required, pattern, length bounds, custom
//! validator, then the built-in semantic checks for the field's kind.
//! Everything here is pure; errors are returned, never raised.

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::field::{FieldDescriptor, FieldKind, StepDescriptor};
use super::mask::{digits_only, is_valid_cnpj, is_valid_cpf, MaskKind};
use super::visibility::{is_enabled, is_visible};
use crate::domain::{is_empty_value, value_to_text, FormContext, FormSnapshot};

pub const PASSWORD_FIELD: &str = "password";
pub const PASSWORD_CONFIRMATION_FIELD: &str = "password_confirmation";

/// Field name -> error message
pub type FieldErrors = BTreeMap<String, String>;

/// User-facing messages, pt-BR by default
#[derive(Debug, Clone)]
pub struct ValidationMessages {
    pub required: String,
    pub invalid_format: String,
    pub invalid_email: String,
    pub invalid_phone: String,
    pub invalid_number: String,
    pub invalid_date: String,
    pub invalid_document: String,
    pub min_length: String,
    pub max_length: String,
    pub password_mismatch: String,
}

impl Default for ValidationMessages {
    fn default() -> Self {
        Self {
            required: "Este campo é obrigatório".to_string(),
            invalid_format: "Formato inválido".to_string(),
            invalid_email: "E-mail inválido".to_string(),
            invalid_phone: "Telefone inválido".to_string(),
            invalid_number: "Número inválido".to_string(),
            invalid_date: "Data inválida".to_string(),
            invalid_document: "Documento inválido".to_string(),
            min_length: "Mínimo de {n} caracteres".to_string(),
            max_length: "Máximo de {n} caracteres".to_string(),
            password_mismatch: "As senhas não coincidem".to_string(),
        }
    }
}

impl ValidationMessages {
    fn with_count(template: &str, n: usize) -> String {
        template.replace("{n}", &n.to_string())
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    messages: ValidationMessages,
}

impl Validator {
    pub fn new(messages: ValidationMessages) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &ValidationMessages {
        &self.messages
    }

    /// Validate one field value against its descriptor
    pub fn validate_field(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        snapshot: &FormSnapshot,
        ctx: &FormContext,
    ) -> Option<String> {
        if !is_visible(field, snapshot, ctx) || !is_enabled(field, snapshot, ctx) {
            return None;
        }

        let empty = is_empty_value(value);
        if field.required && empty {
            return Some(self.messages.required.clone());
        }
        if empty {
            return None;
        }

        let text = value_to_text(value).unwrap_or_default();

        if let Some(spec) = &field.validation {
            if let Some(pattern) = &spec.pattern {
                if !pattern.is_match(&text) {
                    return Some(
                        spec.pattern_message
                            .clone()
                            .unwrap_or_else(|| self.messages.invalid_format.clone()),
                    );
                }
            }

            let len = text.chars().count();
            if let Some(min) = spec.min_length {
                if len < min {
                    return Some(ValidationMessages::with_count(&self.messages.min_length, min));
                }
            }
            if let Some(max) = spec.max_length {
                if len > max {
                    return Some(ValidationMessages::with_count(&self.messages.max_length, max));
                }
            }

            if let Some(custom) = &spec.custom {
                if let Some(message) = custom(value, snapshot) {
                    return Some(message);
                }
            }
        }

        self.semantic_check(field, value, &text, snapshot)
    }

    fn semantic_check(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        text: &str,
        snapshot: &FormSnapshot,
    ) -> Option<String> {
        match field.kind {
            FieldKind::Email if !email_regex().is_match(text.trim()) => {
                return Some(self.messages.invalid_email.clone());
            }
            FieldKind::Phone => {
                let len = digits_only(text).len();
                if !(10..=11).contains(&len) {
                    return Some(self.messages.invalid_phone.clone());
                }
            }
            FieldKind::Number if !is_numeric(value) => {
                return Some(self.messages.invalid_number.clone());
            }
            FieldKind::Date if parse_date(text).is_none() => {
                return Some(self.messages.invalid_date.clone());
            }
            _ => {}
        }

        let document_ok = match field.mask {
            Some(MaskKind::Cpf) => is_valid_cpf(text),
            Some(MaskKind::Cnpj) => is_valid_cnpj(text),
            Some(MaskKind::CpfCnpj) => match digits_only(text).len() {
                11 => is_valid_cpf(text),
                14 => is_valid_cnpj(text),
                _ => false,
            },
            _ => true,
        };
        if !document_ok {
            return Some(self.messages.invalid_document.clone());
        }

        if field.name == PASSWORD_CONFIRMATION_FIELD {
            let password = snapshot.get(PASSWORD_FIELD).cloned().unwrap_or(Value::Null);
            if &password != value {
                return Some(self.messages.password_mismatch.clone());
            }
        }

        None
    }

    /// Validate every field of one step; only failing fields appear in the map
    pub fn validate_step(
        &self,
        fields: &[FieldDescriptor],
        snapshot: &FormSnapshot,
        ctx: &FormContext,
    ) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for field in fields {
            let value = snapshot
                .get(&field.name)
                .cloned()
                .unwrap_or_else(|| field.kind.default_value());
            if let Some(message) = self.validate_field(field, &value, snapshot, ctx) {
                errors.entry(field.name.clone()).or_insert(message);
            }
        }
        errors
    }

    /// Validate every step. For a field rendered in several steps the first
    /// reported error is kept.
    pub fn validate_all(
        &self,
        steps: &[StepDescriptor],
        snapshot: &FormSnapshot,
        ctx: &FormContext,
    ) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for step in steps {
            for (name, message) in self.validate_step(&step.fields, snapshot, ctx) {
                errors.entry(name).or_insert(message);
            }
        }
        errors
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().is_ok(),
        _ => false,
    }
}

/// Accepts `YYYY-MM-DD` and `DD/MM/YYYY`
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d/%m/%Y"))
        .ok()
}
