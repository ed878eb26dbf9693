//! Dotted path access into API response rows
//!
//! Relationship fields arrive nested under their relation
//! (`owner.name`, `addresses.0.address.city`). A `FieldPath` resolves
//! such a path against a `serde_json::Value` without ever failing:
//! any missing intermediate segment yields `None`.

use serde_json::Value;
use std::fmt;

/// Segment of a field path
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key access: `.name`
    Key(String),
    /// Array index access: `.0` or `[0]`
    Index(usize),
}

/// Parsed dotted path (e.g. `addresses.0.address.city` or `addresses[0].address.city`)
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parse a path string. Empty segments (`a..b`) are skipped.
    pub fn parse(s: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = s.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if !current.is_empty() {
                        segments.push(Self::classify(std::mem::take(&mut current)));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(Self::classify(std::mem::take(&mut current)));
                    }
                    let mut index_str = String::new();
                    for c in chars.by_ref() {
                        if c == ']' {
                            break;
                        }
                        index_str.push(c);
                    }
                    if let Ok(idx) = index_str.trim().parse::<usize>() {
                        segments.push(PathSegment::Index(idx));
                    } else if !index_str.is_empty() {
                        segments.push(PathSegment::Key(index_str));
                    }
                }
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            segments.push(Self::classify(current));
        }

        Self { segments }
    }

    fn classify(raw: String) -> PathSegment {
        match raw.parse::<usize>() {
            Ok(idx) => PathSegment::Index(idx),
            Err(_) => PathSegment::Key(raw),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    /// First key of the path, i.e. the relation name for `owner.name`
    pub fn root_key(&self) -> Option<&str> {
        match self.segments.first() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }

    /// Resolve this path against a value.
    ///
    /// An `Index` segment applied to an object falls back to a key lookup
    /// with the same digits, since some APIs key maps by numeric strings.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
                (PathSegment::Index(idx), Value::Array(items)) => items.get(*idx)?,
                (PathSegment::Index(idx), Value::Object(map)) => map.get(&idx.to_string())?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                PathSegment::Key(key) => f.write_str(key)?,
                PathSegment::Index(idx) => write!(f, "{}", idx)?,
            }
        }
        Ok(())
    }
}

/// Extract the value at `path` from `row`. Never panics; missing segments yield `None`.
pub fn extract<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    FieldPath::parse(path).resolve(row)
}
