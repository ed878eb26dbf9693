//! Field-change cascades
//!
//! A change to a trigger field (typically a postal code) runs an
//! injectable lookup hook whose result fills dependent fields. The
//! orchestrator keeps, per trigger field, the last normalized value that is
//! in flight or produced a result and refuses to look it up again, so a
//! merged update can never start the same lookup a second time. Every
//! lookup carries a ticket; an outcome whose ticket is no longer the latest
//! for its field is discarded when it arrives. A task dropped before its
//! hook finishes reopens the gate for its value.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::mask::digits_only;
use crate::domain::value_to_text;

/// Partial update: field name -> new value
pub type FieldUpdate = HashMap<String, Value>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CascadeError {
    #[error("Lookup failed: {0}")]
    Upstream(String),
}

/// Lookup run when a trigger field changes.
///
/// `Ok(Some(update))` fills dependents, `Ok(None)` means the value is
/// unknown upstream, `Err` means the lookup itself failed.
#[async_trait]
pub trait FieldChangeHook: Send + Sync {
    async fn on_field_change(
        &self,
        name: &str,
        value: &str,
    ) -> Result<Option<FieldUpdate>, CascadeError>;
}

/// Declares one cascade-triggering field
#[derive(Debug, Clone)]
pub struct CascadeTrigger {
    pub field: String,
    /// Digits a complete value holds; shorter input clears the gate
    pub expected_len: usize,
    /// Fields cleared when the lookup finds nothing
    pub dependents: Vec<String>,
    /// `FormContext` key set to `true` when manual entry is unlocked
    pub unlock_flag: String,
}

impl CascadeTrigger {
    pub fn new(field: impl Into<String>, expected_len: usize, dependents: Vec<String>) -> Self {
        let field = field.into();
        Self {
            unlock_flag: format!("{}_manual_entry", field),
            field,
            expected_len,
            dependents,
        }
    }

    /// Eight-digit Brazilian postal code
    pub fn postal_code<S: Into<String>>(field: impl Into<String>, dependents: Vec<S>) -> Self {
        Self::new(field, 8, dependents.into_iter().map(Into::into).collect())
    }

    pub fn unlock_flag(mut self, flag: impl Into<String>) -> Self {
        self.unlock_flag = flag.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CascadeResult {
    Resolved(FieldUpdate),
    NotFound,
    Failed(String),
}

/// Result of one lookup, to be handed back through `settle`
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub field: String,
    pub value: String,
    ticket: u64,
    pub result: CascadeResult,
}

/// Pending lookup future
pub type CascadeTask = BoxFuture<'static, CascadeOutcome>;

/// Lives inside a task; flags the lookup as abandoned if the task is
/// dropped before the hook returns
struct PendingGuard {
    abandoned: Arc<AtomicBool>,
    finished: bool,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.abandoned.store(true, Ordering::SeqCst);
        }
    }
}

struct Pending {
    ticket: u64,
    abandoned: Arc<AtomicBool>,
}

/// Informational message for the user after a failed lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeNotice {
    NotFound { field: String, value: String },
    Unavailable { field: String, message: String },
}

/// What a settled, still-current outcome changes in the form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeApplication {
    pub updates: FieldUpdate,
    pub unlock_flag: Option<(String, bool)>,
    pub notice: Option<CascadeNotice>,
}

pub struct CascadeOrchestrator {
    hook: Arc<dyn FieldChangeHook>,
    triggers: HashMap<String, CascadeTrigger>,
    /// Last in-flight or successful normalized value per trigger field
    gates: HashMap<String, String>,
    /// Latest issued ticket per trigger field
    tickets: HashMap<String, u64>,
    /// Lookup behind the current gate that has not been settled yet
    pending: HashMap<String, Pending>,
    next_ticket: u64,
}

impl CascadeOrchestrator {
    pub fn new(hook: Arc<dyn FieldChangeHook>) -> Self {
        Self {
            hook,
            triggers: HashMap::new(),
            gates: HashMap::new(),
            tickets: HashMap::new(),
            pending: HashMap::new(),
            next_ticket: 0,
        }
    }

    pub fn watch(mut self, trigger: CascadeTrigger) -> Self {
        self.triggers.insert(trigger.field.clone(), trigger);
        self
    }

    pub fn triggers(&self) -> impl Iterator<Item = &CascadeTrigger> {
        self.triggers.values()
    }

    pub fn is_trigger(&self, name: &str) -> bool {
        self.triggers.contains_key(name)
    }

    /// Cached gate value for a trigger field
    pub fn gate(&self, name: &str) -> Option<&str> {
        self.gates.get(name).map(String::as_str)
    }

    fn normalize(trigger: &CascadeTrigger, value: &Value) -> Option<String> {
        let digits = digits_only(&value_to_text(value).unwrap_or_default());
        if digits.len() < trigger.expected_len {
            None
        } else {
            Some(digits.chars().take(trigger.expected_len).collect())
        }
    }

    /// Record a value loaded from the backend as already resolved, so
    /// re-entering it does not look it up again
    pub fn prime(&mut self, name: &str, value: &Value) {
        if let Some(trigger) = self.triggers.get(name) {
            if let Some(normalized) = Self::normalize(trigger, value) {
                self.gates.insert(name.to_string(), normalized);
                self.pending.remove(name);
            }
        }
    }

    /// React to a value change. Returns the lookup to run, if any.
    pub fn on_change(&mut self, name: &str, value: &Value) -> Option<CascadeTask> {
        let trigger = self.triggers.get(name)?;

        let Some(normalized) = Self::normalize(trigger, value) else {
            // Incomplete input: forget the gate and supersede anything pending
            self.gates.remove(name);
            self.pending.remove(name);
            self.issue_ticket(name);
            return None;
        };

        if self.gates.get(name) == Some(&normalized) && !self.was_abandoned(name) {
            debug!(field = name, value = %normalized, "Cascade gate closed, skipping lookup");
            return None;
        }

        let ticket = self.issue_ticket(name);
        self.gates.insert(name.to_string(), normalized.clone());
        debug!(field = name, value = %normalized, ticket, "Starting cascade lookup");

        let abandoned = Arc::new(AtomicBool::new(false));
        self.pending.insert(
            name.to_string(),
            Pending {
                ticket,
                abandoned: abandoned.clone(),
            },
        );
        let mut guard = PendingGuard {
            abandoned,
            finished: false,
        };

        let hook = self.hook.clone();
        let field = name.to_string();
        Some(Box::pin(async move {
            let result = match hook.on_field_change(&field, &normalized).await {
                Ok(Some(update)) => CascadeResult::Resolved(update),
                Ok(None) => CascadeResult::NotFound,
                Err(e) => CascadeResult::Failed(e.to_string()),
            };
            guard.finished = true;
            CascadeOutcome {
                field,
                value: normalized,
                ticket,
                result,
            }
        }))
    }

    /// Whether the lookup behind the current gate was dropped unfinished
    fn was_abandoned(&self, name: &str) -> bool {
        match (self.pending.get(name), self.tickets.get(name)) {
            (Some(pending), Some(latest)) => {
                pending.ticket == *latest && pending.abandoned.load(Ordering::SeqCst)
            }
            _ => false,
        }
    }

    fn issue_ticket(&mut self, name: &str) -> u64 {
        self.next_ticket += 1;
        self.tickets.insert(name.to_string(), self.next_ticket);
        self.next_ticket
    }

    /// Turn an outcome into form changes. Stale outcomes yield `None`.
    pub fn settle(&mut self, outcome: CascadeOutcome) -> Option<CascadeApplication> {
        if self.tickets.get(&outcome.field) != Some(&outcome.ticket) {
            debug!(
                field = %outcome.field,
                value = %outcome.value,
                "Discarding superseded cascade result"
            );
            return None;
        }
        self.pending.remove(&outcome.field);
        let trigger = self.triggers.get(&outcome.field)?;
        let flag = trigger.unlock_flag.clone();

        match outcome.result {
            CascadeResult::Resolved(updates) => Some(CascadeApplication {
                updates,
                unlock_flag: Some((flag, false)),
                notice: None,
            }),
            CascadeResult::NotFound => {
                self.gates.remove(&outcome.field);
                let updates = trigger
                    .dependents
                    .iter()
                    .map(|name| (name.clone(), Value::String(String::new())))
                    .collect();
                Some(CascadeApplication {
                    updates,
                    unlock_flag: Some((flag, true)),
                    notice: Some(CascadeNotice::NotFound {
                        field: outcome.field,
                        value: outcome.value,
                    }),
                })
            }
            CascadeResult::Failed(message) => {
                warn!(field = %outcome.field, error = %message, "Cascade lookup failed, unlocking manual entry");
                self.gates.remove(&outcome.field);
                Some(CascadeApplication {
                    updates: FieldUpdate::new(),
                    unlock_flag: Some((flag, true)),
                    notice: Some(CascadeNotice::Unavailable {
                        field: outcome.field,
                        message,
                    }),
                })
            }
        }
    }
}
