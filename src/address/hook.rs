//! Postal-code cascade for forms

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{AddressError, AddressRecord, AddressResolver};
use crate::form::cascade::{CascadeError, FieldChangeHook, FieldUpdate};

/// Form field names that receive each address part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFieldMap {
    pub street: String,
    pub complement: String,
    pub district: String,
    pub city: String,
    pub state: String,
}

impl Default for AddressFieldMap {
    fn default() -> Self {
        Self {
            street: "street".to_string(),
            complement: "complement".to_string(),
            district: "district".to_string(),
            city: "city".to_string(),
            state: "state".to_string(),
        }
    }
}

impl AddressFieldMap {
    /// Same parts under a common prefix, e.g. `address_street`
    pub fn prefixed(prefix: &str) -> Self {
        let base = Self::default();
        Self {
            street: format!("{}{}", prefix, base.street),
            complement: format!("{}{}", prefix, base.complement),
            district: format!("{}{}", prefix, base.district),
            city: format!("{}{}", prefix, base.city),
            state: format!("{}{}", prefix, base.state),
        }
    }

    /// Dependents for a `CascadeTrigger`
    pub fn dependents(&self) -> Vec<String> {
        vec![
            self.street.clone(),
            self.complement.clone(),
            self.district.clone(),
            self.city.clone(),
            self.state.clone(),
        ]
    }

    pub fn to_update(&self, record: &AddressRecord) -> FieldUpdate {
        [
            (&self.street, &record.street),
            (&self.complement, &record.complement),
            (&self.district, &record.district),
            (&self.city, &record.city),
            (&self.state, &record.state),
        ]
        .into_iter()
        .map(|(field, value)| (field.clone(), Value::String(value.clone())))
        .collect()
    }
}

pub struct AddressLookupHook {
    resolver: Arc<AddressResolver>,
    fields: AddressFieldMap,
}

impl AddressLookupHook {
    pub fn new(resolver: Arc<AddressResolver>) -> Self {
        Self::with_fields(resolver, AddressFieldMap::default())
    }

    pub fn with_fields(resolver: Arc<AddressResolver>, fields: AddressFieldMap) -> Self {
        Self { resolver, fields }
    }

    pub fn fields(&self) -> &AddressFieldMap {
        &self.fields
    }
}

#[async_trait]
impl FieldChangeHook for AddressLookupHook {
    async fn on_field_change(
        &self,
        _name: &str,
        value: &str,
    ) -> Result<Option<FieldUpdate>, CascadeError> {
        match self.resolver.resolve_address(value).await {
            Ok(record) => Ok(Some(self.fields.to_update(&record))),
            Err(AddressError::NotFound { .. }) => Ok(None),
            Err(AddressError::Upstream(message)) => Err(CascadeError::Upstream(message)),
        }
    }
}
