//! Service layer.
//!
//! Services own the business rules and coordinate the Task Store with the
//! Job Registry; handlers only translate HTTP to service calls.

pub mod notifications;
mod task_service;

pub use task_service::TaskService;

use std::sync::Arc;

use crate::jobs::{ExecutionGate, JobRegistry};
use crate::repositories::SharedTaskStore;

/// Aggregates all services for use as axum state.
///
/// Cloning is cheap; everything inside is reference counted.
#[derive(Clone)]
pub struct Services {
    pub tasks: TaskService,
}

impl Services {
    pub fn new(
        store: SharedTaskStore,
        registry: Arc<JobRegistry>,
        gate: Arc<ExecutionGate>,
    ) -> Self {
        Self {
            tasks: TaskService::new(store, registry, gate),
        }
    }
}
