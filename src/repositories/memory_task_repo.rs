//! In-process task store.
//!
//! Backs the `memory` store backend and the service and API tests. Nothing
//! survives a restart.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewTaskLog, Task, TaskChanges, TaskLog, TaskStatus};
use crate::repositories::TaskStore;

#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: DashMap<Uuid, Task>,
    logs: RwLock<Vec<TaskLog>>,
    next_log_id: AtomicI64,
    /// When set, every operation fails with a database error
    unavailable: AtomicBool,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an outage; used to exercise failure paths.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self, operation: &str) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database {
                operation: operation.to_string(),
                source: anyhow::anyhow!("memory store unavailable"),
            });
        }
        Ok(())
    }

    fn sorted(mut tasks: Vec<Task>) -> Vec<Task> {
        tasks.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        tasks
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert_task(&self, task: &Task) -> AppResult<Task> {
        self.check_available("insert task")?;

        match self.tasks.entry(task.task_id) {
            Entry::Occupied(_) => Err(AppError::Duplicate {
                entity: "Task".to_string(),
                field: "task_id".to_string(),
                value: task.task_id.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(task.clone());
                Ok(task.clone())
            }
        }
    }

    async fn find_task(&self, task_id: Uuid) -> AppResult<Option<Task>> {
        self.check_available("find task")?;
        Ok(self.tasks.get(&task_id).map(|task| task.clone()))
    }

    async fn list_tasks(&self) -> AppResult<Vec<Task>> {
        self.check_available("list tasks")?;
        Ok(Self::sorted(
            self.tasks.iter().map(|entry| entry.value().clone()).collect(),
        ))
    }

    async fn list_tasks_by_status(&self, status: TaskStatus) -> AppResult<Vec<Task>> {
        self.check_available("list tasks by status")?;
        Ok(Self::sorted(
            self.tasks
                .iter()
                .filter(|entry| entry.status == status)
                .map(|entry| entry.value().clone())
                .collect(),
        ))
    }

    async fn update_task(&self, task_id: Uuid, changes: &TaskChanges) -> AppResult<Option<Task>> {
        self.check_available("update task")?;
        Ok(self.tasks.get_mut(&task_id).map(|mut task| {
            changes.apply_to(&mut task);
            task.clone()
        }))
    }

    async fn delete_task(&self, task_id: Uuid) -> AppResult<bool> {
        self.check_available("delete task")?;
        let mut logs = self.logs.write().await;
        let existed = self.tasks.remove(&task_id).is_some();
        logs.retain(|log| log.task_id != task_id);
        Ok(existed)
    }

    async fn append_log(&self, log: &NewTaskLog) -> AppResult<TaskLog> {
        self.check_available("append task log")?;
        let entry = TaskLog {
            id: self.next_log_id.fetch_add(1, Ordering::SeqCst) + 1,
            task_id: log.task_id,
            executed_at: log.executed_at,
            status: log.status,
            error_message: log.error_message.clone(),
        };
        self.logs.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn list_logs(&self, task_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<TaskLog>> {
        self.check_available("list task logs")?;
        let logs = self.logs.read().await;
        let mut matching: Vec<TaskLog> = logs
            .iter()
            .filter(|log| log.task_id == task_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.executed_at.cmp(&a.executed_at).then(b.id.cmp(&a.id)));

        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn ping(&self) -> AppResult<()> {
        self.check_available("ping")
    }
}
