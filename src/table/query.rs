//! Table state and its canonical query string

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_SORT_FIELD: &str = "created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub search: String,
    /// Sort entries in priority order; one entry per field
    #[serde(default)]
    pub sort: Vec<(String, SortDirection)>,
    /// Scalars, arrays (repeated key) or objects (JSON-encoded)
    #[serde(default)]
    pub filters: BTreeMap<String, Value>,
}

impl Default for TableState {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

impl TableState {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            search: String::new(),
            sort: Vec::new(),
            filters: BTreeMap::new(),
        }
    }

    pub fn sort_direction(&self, field: &str) -> Option<SortDirection> {
        self.sort
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, d)| *d)
    }

    /// Replace or remove the sort on `field`, keeping other entries
    pub fn set_sort(&mut self, field: &str, direction: Option<SortDirection>) {
        match (self.sort.iter().position(|(f, _)| f == field), direction) {
            (Some(idx), Some(dir)) => self.sort[idx].1 = dir,
            (Some(idx), None) => {
                self.sort.remove(idx);
            }
            (None, Some(dir)) => self.sort.push((field.to_string(), dir)),
            (None, None) => {}
        }
    }

    /// Apply a partial update. Changing search, filters or limit without an
    /// explicit page returns to the first page.
    pub fn apply(&mut self, patch: TablePatch) {
        let resets_page = patch.search.as_ref().is_some_and(|s| *s != self.search)
            || patch.filters.as_ref().is_some_and(|f| *f != self.filters)
            || patch.limit.is_some_and(|l| l.max(1) != self.limit);

        if let Some(limit) = patch.limit {
            self.limit = limit.max(1);
        }
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(sort) = patch.sort {
            self.sort = sort;
        }
        if let Some(filters) = patch.filters {
            self.filters = filters;
        }
        match patch.page {
            Some(page) => self.page = page.max(1),
            None if resets_page => self.page = 1,
            None => {}
        }
    }
}

/// Partial update to a `TableState`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TablePatch {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub sort: Option<Vec<(String, SortDirection)>>,
    pub filters: Option<BTreeMap<String, Value>>,
}

impl TablePatch {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Default::default()
        }
    }

    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            ..Default::default()
        }
    }

    pub fn filter(mut self, key: impl Into<String>, value: Value, base: &TableState) -> Self {
        let filters = self.filters.get_or_insert_with(|| base.filters.clone());
        filters.insert(key.into(), value);
        self
    }
}

/// Legacy column names carry a `sort_` prefix the API does not know
fn sort_key(field: &str) -> &str {
    field.strip_prefix("sort_").unwrap_or(field)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Encoded `key=value` pairs in canonical order: page, limit, search,
/// sort entries, then filters sorted by key
pub fn build_query_pairs(state: &TableState) -> Vec<(String, String)> {
    let mut pairs = vec![
        ("page".to_string(), state.page.max(1).to_string()),
        ("limit".to_string(), state.limit.max(1).to_string()),
    ];

    let search = state.search.trim();
    if !search.is_empty() {
        pairs.push(("search".to_string(), search.to_string()));
    }

    if state.sort.is_empty() {
        pairs.push((
            format!("sort[{}]", DEFAULT_SORT_FIELD),
            SortDirection::Desc.to_string(),
        ));
    } else {
        for (field, direction) in &state.sort {
            pairs.push((format!("sort[{}]", sort_key(field)), direction.to_string()));
        }
    }

    for (key, value) in &state.filters {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar_text(item) {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            Value::Object(_) => pairs.push((key.clone(), value.to_string())),
            scalar => {
                if let Some(text) = scalar_text(scalar) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }

    pairs
}

/// Canonical, percent-encoded query string for a table state
pub fn build_query(state: &TableState) -> String {
    build_query_pairs(state)
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_query() {
        let mut state = TableState::new(2, 10);
        state.set_sort("name", Some(SortDirection::Asc));
        let query = build_query(&state);
        assert_eq!(query, "page=2&limit=10&sort%5Bname%5D=asc");
        assert!(!query.contains("search"));
    }

    #[test]
    fn test_default_sort_when_unsorted() {
        let query = build_query(&TableState::new(1, 25));
        assert_eq!(query, "page=1&limit=25&sort%5Bcreated_at%5D=desc");
    }

    #[test]
    fn test_search_is_trimmed_and_encoded() {
        let mut state = TableState::default();
        state.search = "  João da Silva ".to_string();
        let query = build_query(&state);
        assert!(query.contains("search=Jo%C3%A3o%20da%20Silva"));
    }

    #[test]
    fn test_sort_prefix_is_stripped() {
        let mut state = TableState::default();
        state.set_sort("sort_owner.name", Some(SortDirection::Desc));
        state.set_sort("rent", Some(SortDirection::Asc));
        let pairs = build_query_pairs(&state);
        assert!(pairs.contains(&("sort[owner.name]".to_string(), "desc".to_string())));
        assert!(pairs.contains(&("sort[rent]".to_string(), "asc".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "sort[created_at]"));
    }

    #[test]
    fn test_filter_shapes() {
        let mut state = TableState::default();
        state.filters.insert("status".to_string(), json!("active"));
        state.filters.insert("type".to_string(), json!(["house", "apartment"]));
        state.filters.insert("period".to_string(), json!({ "from": "2024-01-01", "to": "2024-12-31" }));
        state.filters.insert("agency_id".to_string(), json!(3));
        state.filters.insert("owner_id".to_string(), Value::Null);
        state.filters.insert("city".to_string(), json!(""));

        let pairs = build_query_pairs(&state);
        let filters: Vec<_> = pairs.iter().skip(3).cloned().collect();
        assert_eq!(
            filters,
            vec![
                ("agency_id".to_string(), "3".to_string()),
                ("period".to_string(), r#"{"from":"2024-01-01","to":"2024-12-31"}"#.to_string()),
                ("status".to_string(), "active".to_string()),
                ("type".to_string(), "house".to_string()),
                ("type".to_string(), "apartment".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_is_deterministic() {
        let mut a = TableState::default();
        a.filters.insert("b".to_string(), json!(1));
        a.filters.insert("a".to_string(), json!(2));
        let mut b = TableState::default();
        b.filters.insert("a".to_string(), json!(2));
        b.filters.insert("b".to_string(), json!(1));
        assert_eq!(build_query(&a), build_query(&b));
    }

    #[test]
    fn test_patch_resets_page_on_search() {
        let mut state = TableState::new(4, 10);
        state.apply(TablePatch::search("casa"));
        assert_eq!(state.page, 1);
        assert_eq!(state.search, "casa");

        state.apply(TablePatch::page(3));
        assert_eq!(state.page, 3);

        // same search again keeps the page
        state.apply(TablePatch::search("casa"));
        assert_eq!(state.page, 3);
    }

    #[test]
    fn test_patch_clamps() {
        let mut state = TableState::default();
        state.apply(TablePatch {
            page: Some(0),
            limit: Some(0),
            ..Default::default()
        });
        assert_eq!(state.page, 1);
        assert_eq!(state.limit, 1);
    }

    #[test]
    fn test_patch_filter_keeps_existing() {
        let mut state = TableState::new(5, 10);
        state.filters.insert("status".to_string(), json!("active"));
        let patch = TablePatch::default().filter("type", json!("house"), &state);
        state.apply(patch);
        assert_eq!(state.filters.len(), 2);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_set_sort_replace_and_remove() {
        let mut state = TableState::default();
        state.set_sort("name", Some(SortDirection::Asc));
        state.set_sort("name", Some(SortDirection::Desc));
        assert_eq!(state.sort, vec![("name".to_string(), SortDirection::Desc)]);
        state.set_sort("name", None);
        assert!(state.sort.is_empty());
    }
}
