//! Execution callback run on every timer firing.
//!
//! Re-reads the task, sends the email, and appends a success or failure
//! TaskLog. Nothing here propagates an error back to the scheduler; a failed
//! send or log write never stops later firings.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::JobsConfig;
use crate::jobs::gate::ExecutionGate;
use crate::jobs::registry::JobCallback;
use crate::models::NewTaskLog;
use crate::repositories::SharedTaskStore;
use crate::services::notifications::{DeliveryError, Notifier};

/// Why a firing did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The previous firing of the same task is still running
    InFlight,
    /// The task was deleted after its timer fired
    Missing,
    /// The task was stopped after its timer fired
    Stopped,
    /// The task could not be read
    StoreUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Delivered,
    Failed(String),
    Skipped(SkipReason),
}

pub struct TaskExecutor {
    store: SharedTaskStore,
    notifier: Arc<dyn Notifier>,
    subject: String,
    send_timeout: Duration,
    store_timeout: Duration,
    gate: Arc<ExecutionGate>,
}

impl TaskExecutor {
    pub fn new(store: SharedTaskStore, notifier: Arc<dyn Notifier>, config: &JobsConfig) -> Self {
        Self {
            store,
            notifier,
            subject: config.mail_subject.clone(),
            send_timeout: config.send_timeout(),
            store_timeout: config.store_timeout(),
            gate: Arc::new(ExecutionGate::new()),
        }
    }

    pub fn with_timeouts(mut self, send_timeout: Duration, store_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self.store_timeout = store_timeout;
        self
    }

    /// Locks shared with the lifecycle service
    pub fn gate(&self) -> Arc<ExecutionGate> {
        Arc::clone(&self.gate)
    }

    /// Runs one firing for `task_id`.
    ///
    /// The task's execution lock is held until the log is written.
    pub async fn execute(&self, task_id: Uuid) -> ExecutionOutcome {
        let Some(_guard) = self.gate.try_enter(task_id) else {
            tracing::warn!(task_id = %task_id, "Previous execution still running, skipping firing");
            return ExecutionOutcome::Skipped(SkipReason::InFlight);
        };

        let started = Instant::now();

        let task = match tokio::time::timeout(self.store_timeout, self.store.find_task(task_id)).await
        {
            Ok(Ok(Some(task))) => task,
            Ok(Ok(None)) => {
                tracing::debug!(task_id = %task_id, "Task no longer exists, skipping firing");
                return ExecutionOutcome::Skipped(SkipReason::Missing);
            }
            Ok(Err(e)) => {
                tracing::error!(task_id = %task_id, error = %e, "Failed to load task for execution");
                return ExecutionOutcome::Skipped(SkipReason::StoreUnavailable);
            }
            Err(_) => {
                tracing::error!(
                    task_id = %task_id,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "Timed out loading task for execution"
                );
                return ExecutionOutcome::Skipped(SkipReason::StoreUnavailable);
            }
        };

        if !task.is_active() {
            tracing::debug!(task_id = %task_id, "Task is stopped, skipping firing");
            return ExecutionOutcome::Skipped(SkipReason::Stopped);
        }

        let sent = tokio::time::timeout(
            self.send_timeout,
            self.notifier.send(&task.email, &self.subject, &task.message),
        )
        .await
        .unwrap_or(Err(DeliveryError::Timeout {
            seconds: self.send_timeout.as_secs(),
        }));

        let duration_ms = started.elapsed().as_millis() as u64;

        let (log, outcome) = match sent {
            Ok(()) => {
                tracing::info!(
                    task_id = %task_id,
                    notifier = self.notifier.name(),
                    duration_ms,
                    outcome = "success",
                    "Scheduled email sent"
                );
                (NewTaskLog::success(task_id), ExecutionOutcome::Delivered)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(
                    task_id = %task_id,
                    notifier = self.notifier.name(),
                    duration_ms,
                    outcome = "failure",
                    error = %message,
                    "Scheduled email failed"
                );
                (
                    NewTaskLog::failure(task_id, message.clone()),
                    ExecutionOutcome::Failed(message),
                )
            }
        };

        self.record(log).await;
        outcome
    }

    /// Best-effort log append
    async fn record(&self, log: NewTaskLog) {
        match tokio::time::timeout(self.store_timeout, self.store.append_log(&log)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::error!(task_id = %log.task_id, status = %log.status, error = %e, "Failed to write task log");
            }
            Err(_) => {
                tracing::error!(task_id = %log.task_id, status = %log.status, "Timed out writing task log");
            }
        }
    }
}

#[async_trait]
impl JobCallback for TaskExecutor {
    async fn on_fire(&self, task_id: Uuid) {
        self.execute(task_id).await;
    }
}
