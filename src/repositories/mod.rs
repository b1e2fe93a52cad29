//! Task Store: persistence for tasks and their execution logs.
//!
//! `TaskStore` is the seam the services and scheduler depend on. `PgTaskStore`
//! is the production implementation; `MemoryTaskStore` backs tests and the
//! `memory` store backend.

mod memory_task_repo;
mod task_repo;

pub use memory_task_repo::MemoryTaskStore;
pub use task_repo::PgTaskStore;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NewTaskLog, Task, TaskChanges, TaskLog, TaskStatus};

/// Async persistence operations for tasks and task logs.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a fully formed task.
    async fn insert_task(&self, task: &Task) -> AppResult<Task>;

    async fn find_task(&self, task_id: Uuid) -> AppResult<Option<Task>>;

    /// All tasks, oldest first.
    async fn list_tasks(&self) -> AppResult<Vec<Task>>;

    async fn list_tasks_by_status(&self, status: TaskStatus) -> AppResult<Vec<Task>>;

    /// Applies `changes` and returns the updated task, or `None` if absent.
    async fn update_task(&self, task_id: Uuid, changes: &TaskChanges) -> AppResult<Option<Task>>;

    /// Removes the task together with its logs. Returns whether it existed.
    async fn delete_task(&self, task_id: Uuid) -> AppResult<bool>;

    async fn append_log(&self, log: &NewTaskLog) -> AppResult<TaskLog>;

    /// Logs for one task, newest first.
    async fn list_logs(&self, task_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<TaskLog>>;

    /// Cheap liveness probe.
    async fn ping(&self) -> AppResult<()>;
}

pub type SharedTaskStore = Arc<dyn TaskStore>;
