pub mod path;
pub mod snapshot;

pub use path::{extract, FieldPath, PathSegment};
pub use snapshot::{is_empty_value, is_truthy, value_to_text, FormContext, FormSnapshot};
