//! Multi-step form controller
//!
//! Owns the snapshot, the step pointer and the error map. Forward
//! navigation is gated on the current step validating; backward navigation
//! is always allowed. Cascade lookups started by `set_field` are returned to
//! the caller as futures and merged back through `apply_cascade`, in
//! whatever order they resolve.

use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use super::cascade::{CascadeNotice, CascadeOrchestrator, CascadeOutcome, CascadeTask};
use super::field::{FieldDescriptor, FieldKind, FormDefinition, StepDescriptor};
use super::mask::apply_mask;
use super::submit::{SubmitHook, SubmitOutcome};
use super::validation::{FieldErrors, Validator};
use super::visibility::is_visible;
use crate::client::ApiResult;
use crate::domain::{FormContext, FormSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Now at this step index
    Moved(usize),
    /// Nothing to move to (already first/last); no errors
    Stayed,
    /// Current step has errors; pointer unchanged
    Blocked(FieldErrors),
}

pub struct MultiStepForm {
    definition: FormDefinition,
    snapshot: FormSnapshot,
    context: FormContext,
    current_step: usize,
    completed: BTreeSet<usize>,
    errors: FieldErrors,
    validator: Validator,
    cascade: Option<CascadeOrchestrator>,
    notices: Vec<CascadeNotice>,
}

impl MultiStepForm {
    pub fn new(definition: FormDefinition) -> Self {
        let mut snapshot = FormSnapshot::new();
        for field in definition.all_fields() {
            snapshot.entry_or_insert(&field.name, field.initial_value());
        }
        Self {
            definition,
            snapshot,
            context: FormContext::new(),
            current_step: 0,
            completed: BTreeSet::new(),
            errors: FieldErrors::new(),
            validator: Validator::default(),
            cascade: None,
            notices: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: FormContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_cascade(mut self, cascade: CascadeOrchestrator) -> Self {
        self.cascade = Some(cascade);
        self
    }

    pub fn snapshot(&self) -> &FormSnapshot {
        &self.snapshot
    }

    pub fn context(&self) -> &FormContext {
        &self.context
    }

    pub fn set_context(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.context.set(key, value);
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step_count(&self) -> usize {
        self.definition.step_count()
    }

    pub fn current_step_descriptor(&self) -> &StepDescriptor {
        &self.definition.step_list()[self.current_step]
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 == self.step_count()
    }

    pub fn completed_steps(&self) -> &BTreeSet<usize> {
        &self.completed
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    /// Lookup notices not yet shown to the user
    pub fn take_notices(&mut self) -> Vec<CascadeNotice> {
        std::mem::take(&mut self.notices)
    }

    fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.definition.field(name)
    }

    /// Write a value, clear its error and start any cascade it triggers.
    ///
    /// String values of masked fields are stored formatted.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> Option<CascadeTask> {
        let mut value = value.into();
        if let Some(mask) = self.field(name).and_then(|f| f.mask) {
            if let Value::String(raw) = &value {
                let masked = apply_mask(mask, raw);
                value = Value::String(masked);
            }
        }

        self.snapshot.insert(name, value.clone());
        self.errors.remove(name);

        self.cascade
            .as_mut()
            .and_then(|cascade| cascade.on_change(name, &value))
    }

    /// Merge a finished lookup. Returns whether anything was applied;
    /// superseded results are dropped.
    pub fn apply_cascade(&mut self, outcome: CascadeOutcome) -> bool {
        let Some(cascade) = self.cascade.as_mut() else {
            return false;
        };
        let Some(application) = cascade.settle(outcome) else {
            return false;
        };

        for (name, value) in application.updates {
            self.errors.remove(&name);
            self.snapshot.insert(name, value);
        }
        if let Some((flag, unlocked)) = application.unlock_flag {
            self.context.set(flag, unlocked);
        }
        if let Some(notice) = application.notice {
            debug!(?notice, "Cascade notice");
            self.notices.push(notice);
        }
        true
    }

    /// `set_field`, then wait for and merge its cascade
    pub async fn set_field_and_settle(&mut self, name: &str, value: impl Into<Value>) -> bool {
        match self.set_field(name, value) {
            Some(task) => {
                let outcome = task.await;
                self.apply_cascade(outcome)
            }
            None => false,
        }
    }

    /// Seed the snapshot from a fetched record (edit/view mode). Loaded
    /// trigger values count as already resolved.
    pub fn load_values(&mut self, values: HashMap<String, Value>) {
        for (name, value) in values {
            if let Some(cascade) = self.cascade.as_mut() {
                cascade.prime(&name, &value);
            }
            self.snapshot.insert(name, value);
        }
        self.errors.clear();
    }

    pub fn validate_current_step(&mut self) -> FieldErrors {
        let errors = self.validator.validate_step(
            &self.current_step_descriptor().fields,
            &self.snapshot,
            &self.context,
        );
        self.record_step_errors(self.current_step, &errors);
        errors
    }

    fn record_step_errors(&mut self, step: usize, errors: &FieldErrors) {
        let names: Vec<String> = self.definition.step_list()[step]
            .fields
            .iter()
            .map(|f| f.name.clone())
            .collect();
        for name in names {
            self.errors.remove(&name);
        }
        self.errors
            .extend(errors.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    pub fn next_step(&mut self) -> StepOutcome {
        let errors = self.validate_current_step();
        if !errors.is_empty() {
            debug!(step = self.current_step, errors = errors.len(), "Step blocked");
            return StepOutcome::Blocked(errors);
        }
        self.completed.insert(self.current_step);
        if self.is_last_step() {
            return StepOutcome::Stayed;
        }
        self.current_step += 1;
        StepOutcome::Moved(self.current_step)
    }

    pub fn prev_step(&mut self) -> StepOutcome {
        if self.current_step == 0 {
            return StepOutcome::Stayed;
        }
        self.current_step -= 1;
        StepOutcome::Moved(self.current_step)
    }

    /// Jump to `target`. Backward is free; forward passes through
    /// `next_step` for every step in between and stops at the first block.
    pub fn go_to_step(&mut self, target: usize) -> StepOutcome {
        let target = target.min(self.step_count() - 1);
        if target == self.current_step {
            return StepOutcome::Stayed;
        }
        if target < self.current_step {
            self.current_step = target;
            return StepOutcome::Moved(target);
        }
        while self.current_step < target {
            if let StepOutcome::Blocked(errors) = self.next_step() {
                return StepOutcome::Blocked(errors);
            }
        }
        StepOutcome::Moved(self.current_step)
    }

    pub fn validate_all(&mut self) -> FieldErrors {
        let errors =
            self.validator
                .validate_all(self.definition.step_list(), &self.snapshot, &self.context);
        self.errors = errors.clone();
        errors
    }

    /// Snapshot limited to fields visible right now
    pub fn visible_values(&self) -> FormSnapshot {
        let visible: BTreeSet<&str> = self
            .definition
            .all_fields()
            .filter(|f| is_visible(f, &self.snapshot, &self.context))
            .map(|f| f.name.as_str())
            .collect();
        self.snapshot
            .iter()
            .filter(|(name, _)| visible.contains(name.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Validate everything, then hand the snapshot to `hook`.
    ///
    /// Validation failures and API rejections are returned as outcomes;
    /// only transport failures are `Err`.
    pub async fn submit(&mut self, hook: &dyn SubmitHook) -> ApiResult<SubmitOutcome> {
        let errors = self.validate_all();
        if !errors.is_empty() {
            if let Some(step) = self.first_step_with_error(&errors) {
                self.current_step = step;
            }
            return Ok(SubmitOutcome::Invalid(errors));
        }

        let response = hook.submit(&self.snapshot).await?;
        if response.success {
            return Ok(SubmitOutcome::Submitted(response));
        }

        let field_errors: FieldErrors = response
            .errors
            .iter()
            .filter(|(name, _)| self.snapshot.contains(name))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.errors
            .extend(field_errors.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(SubmitOutcome::Rejected {
            message: response.message,
            field_errors,
        })
    }

    fn first_step_with_error(&self, errors: &FieldErrors) -> Option<usize> {
        self.definition
            .step_list()
            .iter()
            .position(|step| step.fields.iter().any(|f| errors.contains_key(&f.name)))
    }

    /// Kind of a field by name, if declared
    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.field(name).map(|f| f.kind)
    }
}
