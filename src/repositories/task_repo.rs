//! PostgreSQL task store on diesel-async.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    NewTaskLog, NewTaskLogRecord, Task, TaskChanges, TaskLog, TaskLogRecord, TaskRecord,
    TaskStatus,
};
use crate::repositories::TaskStore;
use crate::schema::{task_logs, tasks};

/// Task store backed by the `tasks` and `task_logs` tables
#[derive(Clone)]
pub struct PgTaskStore {
    pool: AsyncDbPool,
}

impl PgTaskStore {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> AppResult<PooledConnection<'_, AsyncPgConnection>> {
        self.pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert_task(&self, task: &Task) -> AppResult<Task> {
        let mut conn = self.conn().await?;

        diesel::insert_into(tasks::table)
            .values(TaskRecord::from(task))
            .returning(TaskRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map(Task::from)
            .map_err(AppError::from)
    }

    async fn find_task(&self, task_id: Uuid) -> AppResult<Option<Task>> {
        let mut conn = self.conn().await?;

        tasks::table
            .find(task_id)
            .select(TaskRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|record| record.map(Task::from))
            .map_err(AppError::from)
    }

    async fn list_tasks(&self) -> AppResult<Vec<Task>> {
        let mut conn = self.conn().await?;

        let records = tasks::table
            .order(tasks::created_at.asc())
            .select(TaskRecord::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(records.into_iter().map(Task::from).collect())
    }

    async fn list_tasks_by_status(&self, status: TaskStatus) -> AppResult<Vec<Task>> {
        let mut conn = self.conn().await?;

        let records = tasks::table
            .filter(tasks::status.eq(status))
            .order(tasks::created_at.asc())
            .select(TaskRecord::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(records.into_iter().map(Task::from).collect())
    }

    async fn update_task(&self, task_id: Uuid, changes: &TaskChanges) -> AppResult<Option<Task>> {
        // diesel rejects an empty changeset
        if changes.is_empty() {
            return self.find_task(task_id).await;
        }

        let mut conn = self.conn().await?;

        diesel::update(tasks::table.find(task_id))
            .set(changes)
            .returning(TaskRecord::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map(|record| record.map(Task::from))
            .map_err(AppError::from)
    }

    async fn delete_task(&self, task_id: Uuid) -> AppResult<bool> {
        let mut conn = self.conn().await?;

        let deleted = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    diesel::delete(task_logs::table.filter(task_logs::task_id.eq(task_id)))
                        .execute(conn)
                        .await?;
                    diesel::delete(tasks::table.find(task_id))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(AppError::from)?;

        Ok(deleted > 0)
    }

    async fn append_log(&self, log: &NewTaskLog) -> AppResult<TaskLog> {
        let mut conn = self.conn().await?;

        diesel::insert_into(task_logs::table)
            .values(NewTaskLogRecord::from(log))
            .returning(TaskLogRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map(TaskLog::from)
            .map_err(AppError::from)
    }

    async fn list_logs(&self, task_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<TaskLog>> {
        let mut conn = self.conn().await?;

        let records = task_logs::table
            .filter(task_logs::task_id.eq(task_id))
            .order((task_logs::executed_at.desc(), task_logs::id.desc()))
            .offset(offset)
            .limit(limit)
            .select(TaskLogRecord::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(records.into_iter().map(TaskLog::from).collect())
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn().await?;

        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }
}
