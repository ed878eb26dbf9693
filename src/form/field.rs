//! Declarative field and step descriptors

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::mask::MaskKind;
use crate::domain::{FormContext, FormSnapshot};

/// Predicate over the current snapshot plus the page-supplied context
pub type Predicate = Arc<dyn Fn(&FormSnapshot, &FormContext) -> bool + Send + Sync>;

/// Caller-supplied validator; returns an error message or `None`
pub type CustomValidator = Arc<dyn Fn(&Value, &FormSnapshot) -> Option<String> + Send + Sync>;

/// Render callback for `FieldKind::Custom`; returns an opaque render
/// description the presentation layer understands
pub type RenderFn = Arc<dyn Fn(&Value, &FormSnapshot) -> Value + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Number,
    Date,
    Password,
    Select,
    Textarea,
    Checkbox,
    File,
    Custom,
}

impl FieldKind {
    /// Value an untouched field starts with
    pub fn default_value(&self) -> Value {
        match self {
            FieldKind::Checkbox => Value::Bool(false),
            FieldKind::Number => Value::from(0),
            _ => Value::String(String::new()),
        }
    }
}

/// Literal-or-predicate configuration used for `hidden` and `disabled`
#[derive(Clone)]
pub enum Condition {
    Static(bool),
    Dynamic(Predicate),
}

impl Condition {
    pub fn when<F>(f: F) -> Self
    where
        F: Fn(&FormSnapshot, &FormContext) -> bool + Send + Sync + 'static,
    {
        Condition::Dynamic(Arc::new(f))
    }

    /// True when the named field currently equals `expected`
    pub fn field_equals(field: impl Into<String>, expected: impl Into<Value>) -> Self {
        let field = field.into();
        let expected = expected.into();
        Self::when(move |snapshot, _| snapshot.get(&field) == Some(&expected))
    }

    pub fn evaluate(&self, snapshot: &FormSnapshot, ctx: &FormContext) -> bool {
        match self {
            Condition::Static(value) => *value,
            Condition::Dynamic(predicate) => predicate(snapshot, ctx),
        }
    }
}

impl Default for Condition {
    fn default() -> Self {
        Condition::Static(false)
    }
}

impl From<bool> for Condition {
    fn from(value: bool) -> Self {
        Condition::Static(value)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Static(value) => write!(f, "Static({})", value),
            Condition::Dynamic(_) => f.write_str("Dynamic(<predicate>)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Default)]
pub struct ValidationSpec {
    pub pattern: Option<Regex>,
    pub pattern_message: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub custom: Option<CustomValidator>,
}

impl fmt::Debug for ValidationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationSpec")
            .field("pattern", &self.pattern.as_ref().map(|r| r.as_str()))
            .field("pattern_message", &self.pattern_message)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// One form input
#[derive(Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub default_value: Option<Value>,
    pub options: Vec<SelectOption>,
    pub validation: Option<ValidationSpec>,
    pub mask: Option<MaskKind>,
    pub hidden: Condition,
    pub disabled: Condition,
    pub render: Option<RenderFn>,
    pub placeholder: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            default_value: None,
            options: Vec::new(),
            validation: None,
            mask: None,
            hidden: Condition::Static(false),
            disabled: Condition::Static(false),
            render: None,
            placeholder: None,
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn mask(mut self, mask: MaskKind) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn pattern(mut self, pattern: Regex, message: Option<&str>) -> Self {
        let spec = self.validation.get_or_insert_with(ValidationSpec::default);
        spec.pattern = Some(pattern);
        spec.pattern_message = message.map(str::to_string);
        self
    }

    pub fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        let spec = self.validation.get_or_insert_with(ValidationSpec::default);
        spec.min_length = min;
        spec.max_length = max;
        self
    }

    pub fn custom<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &FormSnapshot) -> Option<String> + Send + Sync + 'static,
    {
        let spec = self.validation.get_or_insert_with(ValidationSpec::default);
        spec.custom = Some(Arc::new(f));
        self
    }

    pub fn hidden(mut self, hidden: impl Into<Condition>) -> Self {
        self.hidden = hidden.into();
        self
    }

    pub fn hidden_when<F>(mut self, f: F) -> Self
    where
        F: Fn(&FormSnapshot, &FormContext) -> bool + Send + Sync + 'static,
    {
        self.hidden = Condition::when(f);
        self
    }

    pub fn disabled(mut self, disabled: impl Into<Condition>) -> Self {
        self.disabled = disabled.into();
        self
    }

    pub fn disabled_when<F>(mut self, f: F) -> Self
    where
        F: Fn(&FormSnapshot, &FormContext) -> bool + Send + Sync + 'static,
    {
        self.disabled = Condition::when(f);
        self
    }

    pub fn render<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &FormSnapshot) -> Value + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(f));
        self
    }

    /// Explicit default, else the kind's zero value
    pub fn initial_value(&self) -> Value {
        self.default_value
            .clone()
            .unwrap_or_else(|| self.kind.default_value())
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("mask", &self.mask)
            .field("hidden", &self.hidden)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

/// One page of a multi-step form
#[derive(Debug, Clone)]
pub struct StepDescriptor {
    pub title: String,
    pub icon: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl StepDescriptor {
    pub fn new(title: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            title: title.into(),
            icon: None,
            fields,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// A form is either a flat field list or an ordered list of steps
#[derive(Debug, Clone)]
pub enum FormLayout {
    Single(Vec<FieldDescriptor>),
    Steps(Vec<StepDescriptor>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormDefinitionError {
    #[error("Form has no steps")]
    NoSteps,

    #[error("Step '{0}' has no fields")]
    EmptyStep(String),

    #[error("Field '{name}' appears more than once in step '{step}'")]
    DuplicateField { step: String, name: String },

    #[error("Field '{name}' is declared as '{first:?}' and '{second:?}' in different steps")]
    ConflictingKind {
        name: String,
        first: FieldKind,
        second: FieldKind,
    },

    #[error("Field '{name}' is masked as '{first:?}' and '{second:?}' in different steps")]
    ConflictingMask {
        name: String,
        first: Option<MaskKind>,
        second: Option<MaskKind>,
    },

    #[error("Custom field '{0}' has no render callback")]
    MissingRender(String),
}

/// Checked form descriptor; always multi-step internally (a single-step
/// layout becomes one untitled step)
#[derive(Debug, Clone)]
pub struct FormDefinition {
    steps: Vec<StepDescriptor>,
}

impl FormDefinition {
    pub fn new(layout: FormLayout) -> Result<Self, FormDefinitionError> {
        let steps = match layout {
            FormLayout::Single(fields) => vec![StepDescriptor::new("", fields)],
            FormLayout::Steps(steps) => steps,
        };

        if steps.is_empty() {
            return Err(FormDefinitionError::NoSteps);
        }

        let mut kinds: std::collections::HashMap<&str, FieldKind> =
            std::collections::HashMap::new();
        let mut masks: std::collections::HashMap<&str, Option<MaskKind>> =
            std::collections::HashMap::new();
        for step in &steps {
            if step.fields.is_empty() {
                return Err(FormDefinitionError::EmptyStep(step.title.clone()));
            }
            let mut seen = std::collections::HashSet::new();
            for field in &step.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(FormDefinitionError::DuplicateField {
                        step: step.title.clone(),
                        name: field.name.clone(),
                    });
                }
                if field.kind == FieldKind::Custom && field.render.is_none() {
                    return Err(FormDefinitionError::MissingRender(field.name.clone()));
                }
                // Same name in another step shares one snapshot entry
                if let Some(first) = kinds.insert(field.name.as_str(), field.kind) {
                    if first != field.kind {
                        return Err(FormDefinitionError::ConflictingKind {
                            name: field.name.clone(),
                            first,
                            second: field.kind,
                        });
                    }
                }
                if let Some(first) = masks.insert(field.name.as_str(), field.mask) {
                    if first != field.mask {
                        return Err(FormDefinitionError::ConflictingMask {
                            name: field.name.clone(),
                            first,
                            second: field.mask,
                        });
                    }
                }
            }
        }

        Ok(Self { steps })
    }

    pub fn single(fields: Vec<FieldDescriptor>) -> Result<Self, FormDefinitionError> {
        Self::new(FormLayout::Single(fields))
    }

    pub fn steps(steps: Vec<StepDescriptor>) -> Result<Self, FormDefinitionError> {
        Self::new(FormLayout::Steps(steps))
    }

    pub fn step_list(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.steps.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.all_fields().find(|f| f.name == name)
    }
}
