use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::FetchError;
use crate::k8s::ClusterApi;
use crate::model::{Resource, ResourceKind};

#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub items: Vec<Resource>,
    pub loading: bool,
    pub error: Option<FetchError>,
    pub refreshed_at: Option<DateTime<Local>>,
}

impl FetchResult {
    pub fn begin(&mut self) {
        self.loading = true;
    }

    /// Applies whichever response lands, in arrival order. A failure keeps the prior items.
    pub fn complete(&mut self, result: Result<Vec<Resource>, FetchError>) {
        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
                self.refreshed_at = Some(Local::now());
            }
            Err(error) => {
                self.error = Some(error);
            }
        }
        self.loading = false;
    }

    pub fn first_name(&self) -> Option<&str> {
        self.items.first().map(|item| item.name.as_str())
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|item| item.name.clone()).collect()
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub kind: ResourceKind,
    pub result: Result<Vec<Resource>, FetchError>,
}

pub fn spawn_fetches(
    api: Arc<dyn ClusterApi>,
    kinds: Vec<ResourceKind>,
    tx: mpsc::UnboundedSender<FetchOutcome>,
) {
    for kind in kinds {
        let api = Arc::clone(&api);
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = run_fetch(api.as_ref(), kind).await;
            let _ = tx.send(FetchOutcome { kind, result });
        });
    }
}

pub async fn run_fetch(
    api: &dyn ClusterApi,
    kind: ResourceKind,
) -> Result<Vec<Resource>, FetchError> {
    api.list(kind).await.map_err(|error| {
        warn!(kind = %kind, "collection fetch failed: {error:#}");
        FetchError::new(kind, error)
    })
}
