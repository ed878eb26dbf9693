//! Column metadata and cell formatting

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::query::{SortDirection, TableState};
use crate::domain::{extract, value_to_text};
use crate::form::mask::{apply_mask, digits_only, format_currency, parse_currency, MaskKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Currency,
    Date,
    Boolean,
    Status,
}

/// Named display transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formatter {
    Currency,
    Date,
    DateTime,
    /// CPF or CNPJ by digit count
    Document,
    Phone,
    Cep,
    YesNo,
    Uppercase,
}

impl Formatter {
    pub fn format(&self, value: &Value) -> String {
        let text = value_to_text(value).unwrap_or_default();
        match self {
            Formatter::Currency => match value {
                Value::Number(n) => n.as_f64().map(format_currency).unwrap_or(text),
                _ => parse_currency(&text).map(format_currency).unwrap_or(text),
            },
            Formatter::Date => format_date(&text, false).unwrap_or(text),
            Formatter::DateTime => format_date(&text, true).unwrap_or(text),
            Formatter::Document => apply_mask(MaskKind::CpfCnpj, &text),
            Formatter::Phone => apply_mask(MaskKind::Phone, &text),
            Formatter::Cep => {
                if digits_only(&text).len() == 8 {
                    apply_mask(MaskKind::Cep, &text)
                } else {
                    text
                }
            }
            Formatter::YesNo => {
                if crate::domain::is_truthy(value) {
                    "Sim".to_string()
                } else {
                    "Não".to_string()
                }
            }
            Formatter::Uppercase => text.to_uppercase(),
        }
    }
}

/// ISO date or RFC 3339 timestamp -> `DD/MM/YYYY[ HH:MM]`
fn format_date(text: &str, with_time: bool) -> Option<String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        let fmt = if with_time { "%d/%m/%Y %H:%M" } else { "%d/%m/%Y" };
        return Some(ts.format(fmt).to_string());
    }
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%d/%m/%Y").to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub field: String,
    pub label: String,
    /// Server-side sort key when it differs from `field`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_param: Option<String>,
    #[serde(rename = "type")]
    pub kind: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatter: Option<Formatter>,
    /// Dotted path when the row nests the value under a relation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_field: Option<String>,
    #[serde(default = "default_sortable")]
    pub sortable: bool,
}

fn default_sortable() -> bool {
    true
}

impl ColumnDescriptor {
    pub fn new(field: impl Into<String>, label: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            sort_param: None,
            kind,
            formatter: None,
            nested_field: None,
            sortable: true,
        }
    }

    pub fn sort_param(mut self, param: impl Into<String>) -> Self {
        self.sort_param = Some(param.into());
        self
    }

    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn nested(mut self, path: impl Into<String>) -> Self {
        self.nested_field = Some(path.into());
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Key sent as `sort[<key>]`
    pub fn sort_key(&self) -> &str {
        self.sort_param
            .as_deref()
            .or(self.nested_field.as_deref())
            .unwrap_or(&self.field)
    }

    pub fn cell_value<'a>(&self, row: &'a Value) -> Option<&'a Value> {
        extract(row, self.nested_field.as_deref().unwrap_or(&self.field))
    }

    /// Cell text; missing values render empty
    pub fn display(&self, row: &Value) -> String {
        let Some(value) = self.cell_value(row).filter(|v| !v.is_null()) else {
            return String::new();
        };
        let formatter = self.formatter.or(match self.kind {
            ColumnType::Currency => Some(Formatter::Currency),
            ColumnType::Date => Some(Formatter::Date),
            ColumnType::Boolean => Some(Formatter::YesNo),
            _ => None,
        });
        match formatter {
            Some(f) => f.format(value),
            None => value_to_text(value).unwrap_or_default(),
        }
    }

    /// Cycle this column's sort `asc -> desc -> none`. No-op for
    /// unsortable columns.
    pub fn toggle_sort(&self, state: &mut TableState) {
        if !self.sortable {
            return;
        }
        let key = self.sort_key();
        let next = match state.sort_direction(key) {
            None => Some(SortDirection::Asc),
            Some(SortDirection::Asc) => Some(SortDirection::Desc),
            Some(SortDirection::Desc) => None,
        };
        state.set_sort(key, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lease_row() -> Value {
        json!({
            "id": 12,
            "rent_amount": 2500.0,
            "start_date": "2024-03-01",
            "created_at": "2024-02-20T14:05:00Z",
            "active": true,
            "owner": { "name": "Carlos Lima", "document": "52998224725", "phone": "11999998888" },
            "property": { "addresses": [{ "address": { "city": "Santos", "zip_code": "11010000" } }] }
        })
    }

    #[test]
    fn test_nested_display() {
        let column = ColumnDescriptor::new("owner_name", "Proprietário", ColumnType::Text)
            .nested("owner.name");
        assert_eq!(column.display(&lease_row()), "Carlos Lima");
        assert_eq!(column.sort_key(), "owner.name");

        let city = ColumnDescriptor::new("city", "Cidade", ColumnType::Text)
            .nested("property.addresses.0.address.city");
        assert_eq!(city.display(&lease_row()), "Santos");
        assert_eq!(city.display(&json!({ "property": { "addresses": [] } })), "");
    }

    #[test]
    fn test_sort_param_wins() {
        let column = ColumnDescriptor::new("owner_name", "Proprietário", ColumnType::Text)
            .nested("owner.name")
            .sort_param("owners.name");
        assert_eq!(column.sort_key(), "owners.name");
    }

    #[test]
    fn test_type_default_formatters() {
        let row = lease_row();
        assert_eq!(
            ColumnDescriptor::new("rent_amount", "Aluguel", ColumnType::Currency).display(&row),
            "R$ 2.500,00"
        );
        assert_eq!(
            ColumnDescriptor::new("start_date", "Início", ColumnType::Date).display(&row),
            "01/03/2024"
        );
        assert_eq!(
            ColumnDescriptor::new("active", "Ativo", ColumnType::Boolean).display(&row),
            "Sim"
        );
    }

    #[test]
    fn test_named_formatters() {
        let row = lease_row();
        let doc = ColumnDescriptor::new("doc", "CPF", ColumnType::Text)
            .nested("owner.document")
            .formatter(Formatter::Document);
        assert_eq!(doc.display(&row), "529.982.247-25");

        let created = ColumnDescriptor::new("created_at", "Criado em", ColumnType::Text)
            .formatter(Formatter::DateTime);
        assert_eq!(created.display(&row), "20/02/2024 14:05");

        let zip = ColumnDescriptor::new("zip", "CEP", ColumnType::Text)
            .nested("property.addresses.0.address.zip_code")
            .formatter(Formatter::Cep);
        assert_eq!(zip.display(&row), "11010-000");
    }

    #[test]
    fn test_toggle_sort_cycles() {
        let column = ColumnDescriptor::new("name", "Nome", ColumnType::Text);
        let mut state = TableState::default();
        column.toggle_sort(&mut state);
        assert_eq!(state.sort_direction("name"), Some(SortDirection::Asc));
        column.toggle_sort(&mut state);
        assert_eq!(state.sort_direction("name"), Some(SortDirection::Desc));
        column.toggle_sort(&mut state);
        assert_eq!(state.sort_direction("name"), None);

        let fixed = ColumnDescriptor::new("actions", "", ColumnType::Text).unsortable();
        fixed.toggle_sort(&mut state);
        assert!(state.sort.is_empty());
    }

    #[test]
    fn test_columns_deserialize() {
        let column: ColumnDescriptor = serde_json::from_value(json!({
            "field": "owner_name",
            "label": "Proprietário",
            "type": "text",
            "nested_field": "owner.name",
            "formatter": "uppercase"
        }))
        .unwrap();
        assert!(column.sortable);
        assert_eq!(column.display(&lease_row()), "CARLOS LIMA");
    }
}
