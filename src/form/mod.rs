//! Declarative multi-step form engine

pub mod cascade;
pub mod controller;
pub mod field;
pub mod mask;
pub mod submit;
pub mod validation;
pub mod visibility;

pub use cascade::{
    CascadeError, CascadeNotice, CascadeOrchestrator, CascadeOutcome, CascadeTask,
    CascadeTrigger, FieldChangeHook, FieldUpdate,
};
pub use controller::{MultiStepForm, StepOutcome};
pub use field::{
    Condition, FieldDescriptor, FieldKind, FormDefinition, FormDefinitionError, FormLayout,
    SelectOption, StepDescriptor, ValidationSpec,
};
pub use mask::MaskKind;
pub use submit::{ResourceSubmitter, SubmitHook, SubmitOutcome};
pub use validation::{FieldErrors, ValidationMessages, Validator};
pub use visibility::{is_enabled, is_visible};
