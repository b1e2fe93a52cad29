//! Task Lifecycle Service.
//!
//! Every mutation goes through here so the persisted status and the live
//! timer set stay in agreement. Mutations are serialized by one async mutex;
//! reads are not.

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::error::{AppError, AppResult};
use crate::jobs::{ExecutionGate, JobRegistry, schedule};
use crate::models::{NewTask, Task, TaskChanges, TaskLog, TaskStatus};
use crate::repositories::SharedTaskStore;

#[derive(Clone)]
pub struct TaskService {
    store: SharedTaskStore,
    registry: Arc<JobRegistry>,
    gate: Arc<ExecutionGate>,
    lock: Arc<Mutex<()>>,
}

fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation {
            field: field.to_string(),
            reason: format!("{} is required", field),
        });
    }
    Ok(())
}

fn require_email(value: &str) -> AppResult<()> {
    if !value.trim().validate_email() {
        return Err(AppError::Validation {
            field: "email".to_string(),
            reason: format!("'{}' is not a valid email address", value),
        });
    }
    Ok(())
}

/// Treats blank strings as "not provided"
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TaskService {
    pub fn new(
        store: SharedTaskStore,
        registry: Arc<JobRegistry>,
        gate: Arc<ExecutionGate>,
    ) -> Self {
        Self {
            store,
            registry,
            gate,
            lock: Arc::new(Mutex::new(())),
        }
    }

    async fn find_existing(&self, task_id: Uuid) -> AppResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or_else(|| AppError::task_not_found(task_id))
    }

    async fn set_status(&self, task_id: Uuid, status: TaskStatus) -> AppResult<Task> {
        self.store
            .update_task(task_id, &TaskChanges::status(status))
            .await?
            .ok_or_else(|| AppError::task_not_found(task_id))
    }

    /// Validates, persists and schedules a new task.
    ///
    /// The schedule is checked before anything is written. If registration
    /// still fails, the inserted row is removed again.
    pub async fn create_task(&self, new_task: NewTask) -> AppResult<Task> {
        require_non_empty("name", &new_task.name)?;
        require_non_empty("schedule", &new_task.schedule)?;
        require_non_empty("email", &new_task.email)?;
        require_non_empty("message", &new_task.message)?;
        require_email(&new_task.email)?;
        schedule::validate(&new_task.schedule)?;

        let _guard = self.lock.lock().await;

        let task = self.store.insert_task(&new_task.into_task()).await?;

        if let Err(e) = self.registry.register(&task).await {
            if let Err(cleanup) = self.store.delete_task(task.task_id).await {
                tracing::error!(
                    task_id = %task.task_id,
                    error = %cleanup,
                    "Failed to remove task after registration failure"
                );
            }
            return Err(e.into());
        }

        tracing::info!(task_id = %task.task_id, name = %task.name, schedule = %task.schedule, "Task created");
        Ok(task)
    }

    /// Applies the non-blank fields of `changes`. Status is not editable here.
    pub async fn edit_task(&self, task_id: Uuid, changes: TaskChanges) -> AppResult<Task> {
        let changes = TaskChanges {
            name: non_blank(changes.name),
            schedule: non_blank(changes.schedule),
            email: non_blank(changes.email),
            message: non_blank(changes.message),
            status: None,
        };

        if let Some(email) = &changes.email {
            require_email(email)?;
        }
        if let Some(new_schedule) = &changes.schedule {
            schedule::validate(new_schedule)?;
        }

        let _guard = self.lock.lock().await;

        let current = self.find_existing(task_id).await?;
        if changes.is_empty() {
            return Ok(current);
        }

        let schedule_changed = changes
            .schedule
            .as_ref()
            .is_some_and(|s| s != &current.schedule);

        let updated = self
            .store
            .update_task(task_id, &changes)
            .await?
            .ok_or_else(|| AppError::task_not_found(task_id))?;

        if updated.is_active() && schedule_changed {
            if let Err(e) = self.registry.register(&updated).await {
                // the old timer is still live; put the old schedule back to match it
                let revert = TaskChanges {
                    schedule: Some(current.schedule.clone()),
                    ..TaskChanges::default()
                };
                if let Err(revert_err) = self.store.update_task(task_id, &revert).await {
                    tracing::error!(task_id = %task_id, error = %revert_err, "Failed to restore previous schedule");
                }
                return Err(e.into());
            }
        }

        tracing::info!(task_id = %task_id, rescheduled = schedule_changed && updated.is_active(), "Task updated");
        Ok(updated)
    }

    /// Cancels the timer, waits out a running firing, then removes the task
    /// and its logs.
    pub async fn delete_task(&self, task_id: Uuid) -> AppResult<()> {
        let _guard = self.lock.lock().await;

        let current = self.find_existing(task_id).await?;
        self.registry.cancel(task_id).await;

        if self.gate.is_running(task_id) {
            tracing::debug!(task_id = %task_id, "Waiting for running execution before delete");
        }
        let _running = self.gate.enter(task_id).await;

        match self.store.delete_task(task_id).await {
            Ok(true) => {
                self.gate.forget(task_id);
                tracing::info!(task_id = %task_id, "Task deleted");
                Ok(())
            }
            Ok(false) => Err(AppError::task_not_found(task_id)),
            Err(e) => {
                if current.is_active() {
                    if let Err(register_err) = self.registry.register(&current).await {
                        tracing::error!(
                            task_id = %task_id,
                            error = %register_err,
                            "Failed to restore timer after delete failure"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// Marks the task stopped and cancels its timer. Stopping twice is fine.
    pub async fn stop_task(&self, task_id: Uuid) -> AppResult<Task> {
        let _guard = self.lock.lock().await;

        let current = self.find_existing(task_id).await?;
        let task = if current.is_active() {
            self.set_status(task_id, TaskStatus::Stopped).await?
        } else {
            current
        };

        self.registry.cancel(task_id).await;
        tracing::info!(task_id = %task_id, "Task stopped");
        Ok(task)
    }

    /// Marks the task active and registers its timer.
    ///
    /// Starting an active task only registers a timer if none is live. A
    /// registration failure puts the task back to stopped.
    pub async fn start_task(&self, task_id: Uuid) -> AppResult<Task> {
        let _guard = self.lock.lock().await;

        let current = self.find_existing(task_id).await?;
        if current.is_active() {
            if !self.registry.is_registered(task_id) {
                self.registry.register(&current).await?;
            }
            return Ok(current);
        }

        let task = self.set_status(task_id, TaskStatus::Active).await?;

        if let Err(e) = self.registry.register(&task).await {
            if let Err(revert_err) = self.set_status(task_id, TaskStatus::Stopped).await {
                tracing::error!(task_id = %task_id, error = %revert_err, "Failed to revert task status");
            }
            return Err(e.into());
        }

        tracing::info!(task_id = %task_id, "Task started");
        Ok(task)
    }

    /// All tasks regardless of status, oldest first.
    pub async fn list_tasks(&self) -> AppResult<Vec<Task>> {
        self.store.list_tasks().await
    }

    pub async fn get_task(&self, task_id: Uuid) -> AppResult<Task> {
        self.find_existing(task_id).await
    }

    /// Execution logs for a task, newest first. `page` is 1-based.
    pub async fn list_task_logs(
        &self,
        task_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> AppResult<Vec<TaskLog>> {
        self.find_existing(task_id).await?;

        let limit = i64::from(page_size.max(1));
        let offset = i64::from(page.max(1) - 1) * limit;
        self.store.list_logs(task_id, limit, offset).await
    }
}
