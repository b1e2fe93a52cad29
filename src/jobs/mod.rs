//! Scheduling: cron handling, the Job Registry, the per-firing executor and
//! startup reconciliation.

pub mod error;
pub mod executor;
pub mod gate;
pub mod reconciler;
pub mod registry;
pub mod schedule;

pub use error::{SchedulerError, SchedulerResult};
pub use executor::{ExecutionOutcome, SkipReason, TaskExecutor};
pub use gate::{ExecutionGate, ExecutionGuard};
pub use reconciler::{ReconcileReport, reconcile};
pub use registry::{JobCallback, JobEntries, JobEntry, JobHandle, JobRegistry};
