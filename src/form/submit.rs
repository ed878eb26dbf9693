//! Form submission hook

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::validation::FieldErrors;
use crate::client::{ApiResult, MutationResponse, ResourceApi};
use crate::domain::FormSnapshot;

/// Receives the whole snapshot once the form validates.
///
/// Callers must not submit again while a submission is pending; the form
/// does not de-duplicate concurrent submits.
#[async_trait]
pub trait SubmitHook: Send + Sync {
    async fn submit(&self, snapshot: &FormSnapshot) -> ApiResult<MutationResponse>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Client-side validation failed; nothing was sent
    Invalid(FieldErrors),
    Submitted(MutationResponse),
    /// The API refused the payload (conflict, server-side validation)
    Rejected {
        message: Option<String>,
        field_errors: FieldErrors,
    },
}

/// Snapshot -> request payload
pub type SubmitFormatter = Arc<dyn Fn(&FormSnapshot) -> Value + Send + Sync>;

/// Creates or updates one record of a resource
pub struct ResourceSubmitter {
    api: Arc<dyn ResourceApi>,
    resource: String,
    id: Option<String>,
    formatter: Option<SubmitFormatter>,
}

impl ResourceSubmitter {
    pub fn create(api: Arc<dyn ResourceApi>, resource: impl Into<String>) -> Self {
        Self {
            api,
            resource: resource.into(),
            id: None,
            formatter: None,
        }
    }

    pub fn update(api: Arc<dyn ResourceApi>, resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            api,
            resource: resource.into(),
            id: Some(id.into()),
            formatter: None,
        }
    }

    pub fn formatter<F>(mut self, f: F) -> Self
    where
        F: Fn(&FormSnapshot) -> Value + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(f));
        self
    }

    pub fn payload(&self, snapshot: &FormSnapshot) -> Value {
        match &self.formatter {
            Some(format) => format(snapshot),
            None => snapshot.to_json(),
        }
    }
}

#[async_trait]
impl SubmitHook for ResourceSubmitter {
    async fn submit(&self, snapshot: &FormSnapshot) -> ApiResult<MutationResponse> {
        let body = self.payload(snapshot);
        match &self.id {
            Some(id) => {
                info!(resource = %self.resource, %id, "Updating record");
                self.api.update(&self.resource, id, &body).await
            }
            None => {
                info!(resource = %self.resource, "Creating record");
                self.api.create(&self.resource, &body).await
            }
        }
    }
}
