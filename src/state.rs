//! Application state for Axum web framework.

use std::sync::Arc;

use crate::jobs::{ExecutionGate, JobRegistry};
use crate::repositories::SharedTaskStore;
use crate::services::Services;

/// Shared handles available to every handler.
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Live timers, read by the health check
    pub registry: Arc<JobRegistry>,
    /// Direct store access for the health check
    pub store: SharedTaskStore,
}

impl AppState {
    pub fn new(
        store: SharedTaskStore,
        registry: Arc<JobRegistry>,
        gate: Arc<ExecutionGate>,
    ) -> Self {
        let services = Services::new(store.clone(), registry.clone(), gate);
        Self {
            services,
            registry,
            store,
        }
    }
}
