//! Shared application state

use std::sync::Arc;

use crate::cache::SnapshotCache;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<SnapshotCache>,
    /// Required `x-metrics-token` value for `/admin/stats`; `None` disables the route
    pub metrics_token: Option<String>,
}

impl AppState {
    pub fn new(cache: Arc<SnapshotCache>) -> Self {
        Self {
            cache,
            metrics_token: None,
        }
    }

    pub fn with_metrics_token(mut self, token: Option<String>) -> Self {
        self.metrics_token = token;
        self
    }
}
