//! Table data fetcher
//!
//! One fetch in flight per table. A state change aborts the previous
//! request and bumps a generation counter; a response is committed only
//! while its generation is still current, so a superseded page can never
//! overwrite newer rows.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::query::{build_query, TablePatch, TableState};
use crate::client::{unwrap_list, ApiError, ApiResult, ResourceApi, RowSet};

/// Fetch and normalize one page
pub async fn fetch_page(
    api: &dyn ResourceApi,
    resource: &str,
    state: &TableState,
) -> ApiResult<RowSet> {
    let query = build_query(state);
    debug!(resource, %query, "Fetching table page");
    let payload = api.list(resource, &query).await?;
    unwrap_list(payload)
}

/// What the table renders right now
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableView {
    pub loading: bool,
    pub error: Option<ApiError>,
    pub rows: RowSet,
    /// State the current `rows` were fetched for
    pub state: Option<TableState>,
}

pub struct TableFetcher {
    api: Arc<dyn ResourceApi>,
    resource: String,
    state: TableState,
    generation: Arc<AtomicU64>,
    view: Arc<RwLock<TableView>>,
    task: Option<JoinHandle<()>>,
}

impl TableFetcher {
    pub fn new(api: Arc<dyn ResourceApi>, resource: impl Into<String>, state: TableState) -> Self {
        Self {
            api,
            resource: resource.into(),
            state,
            generation: Arc::new(AtomicU64::new(0)),
            view: Arc::new(RwLock::new(TableView::default())),
            task: None,
        }
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Apply a partial state change and refetch
    pub async fn update_state(&mut self, patch: TablePatch) {
        self.state.apply(patch);
        self.refresh().await;
    }

    /// Refetch the current state, superseding any pending request
    pub async fn refresh(&mut self) {
        if let Some(previous) = self.task.take() {
            previous.abort();
        }

        let generation = {
            let mut view = self.view.write().await;
            view.loading = true;
            view.error = None;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let api = Arc::clone(&self.api);
        let resource = self.resource.clone();
        let state = self.state.clone();
        let current = Arc::clone(&self.generation);
        let view = Arc::clone(&self.view);

        self.task = Some(tokio::spawn(async move {
            let result = fetch_page(api.as_ref(), &resource, &state).await;

            let mut view = view.write().await;
            if current.load(Ordering::SeqCst) != generation {
                debug!(resource, generation, "Dropping superseded table response");
                return;
            }
            view.loading = false;
            match result {
                Ok(rows) => {
                    view.rows = rows;
                    view.error = None;
                    view.state = Some(state);
                }
                Err(e) => {
                    warn!(resource, error = %e, "Table fetch failed");
                    view.error = Some(e);
                }
            }
        }));
    }

    pub async fn view(&self) -> TableView {
        self.view.read().await.clone()
    }

    /// Wait for the latest fetch to finish
    pub async fn wait_idle(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TableFetcher {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
