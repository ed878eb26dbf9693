//! Hidden/disabled resolution. Predicates are evaluated on every call,
//! nothing is cached.

use super::field::FieldDescriptor;
use crate::domain::{FormContext, FormSnapshot};

pub fn is_visible(field: &FieldDescriptor, snapshot: &FormSnapshot, ctx: &FormContext) -> bool {
    !field.hidden.evaluate(snapshot, ctx)
}

pub fn is_enabled(field: &FieldDescriptor, snapshot: &FormSnapshot, ctx: &FormContext) -> bool {
    !field.disabled.evaluate(snapshot, ctx)
}

/// Fields of `fields` that are visible under the current snapshot
pub fn visible_fields<'a>(
    fields: &'a [FieldDescriptor],
    snapshot: &'a FormSnapshot,
    ctx: &'a FormContext,
) -> impl Iterator<Item = &'a FieldDescriptor> + 'a {
    fields.iter().filter(move |f| is_visible(f, snapshot, ctx))
}
