//! Bootstrap reconciliation: rebuild timers from persisted active tasks.

use crate::error::AppResult;
use crate::jobs::JobRegistry;
use crate::models::TaskStatus;
use crate::repositories::TaskStore;

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub scheduled: usize,
    pub failed: usize,
}

/// Registers a timer for every active task.
///
/// A task whose schedule cannot be registered is logged and skipped. Failing
/// to read the store at all is returned to the caller.
pub async fn reconcile(store: &dyn TaskStore, registry: &JobRegistry) -> AppResult<ReconcileReport> {
    let tasks = store.list_tasks_by_status(TaskStatus::Active).await?;
    let mut report = ReconcileReport::default();

    for task in &tasks {
        match registry.register(task).await {
            Ok(_) => report.scheduled += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    task_id = %task.task_id,
                    schedule = %task.schedule,
                    error = %e,
                    "Failed to schedule task during startup"
                );
            }
        }
    }

    tracing::info!(
        scheduled = report.scheduled,
        failed = report.failed,
        "Restored scheduled tasks"
    );

    Ok(report)
}
