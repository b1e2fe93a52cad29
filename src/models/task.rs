//! Task models for database operations.
//!
//! `Task` is the domain type handed around by services and the scheduler.
//! `TaskRecord` is its diesel row representation; timestamps cross the
//! boundary through `jiff_diesel` wrappers.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use jiff::Timestamp;
use jiff_diesel::ToDiesel;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

/// Whether a task's timer should be running.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Active,
    Stopped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TaskStatus::Active),
            "stopped" => Ok(TaskStatus::Stopped),
            _ => Err(format!("Unrecognized task status: {}", s)),
        }
    }
}

impl ToSql<Text, Pg> for TaskStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for TaskStatus {
    fn from_sql(
        bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        s.parse().map_err(Into::into)
    }
}

// ============================================================================
// Domain types
// ============================================================================

/// A scheduled email task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub task_id: Uuid,
    pub name: String,
    /// Cron expression as submitted by the client.
    pub schedule: String,
    pub email: String,
    pub message: String,
    pub status: TaskStatus,
    pub created_at: Timestamp,
    /// Stored and returned, not consulted by the scheduler.
    pub expiration: Option<Timestamp>,
}

impl Task {
    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active
    }
}

/// Input for creating a task. Identity, status and creation time are
/// assigned by [`NewTask::into_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub schedule: String,
    pub email: String,
    pub message: String,
    pub expiration: Option<Timestamp>,
}

impl NewTask {
    pub fn into_task(self) -> Task {
        Task {
            task_id: Uuid::new_v4(),
            name: self.name,
            schedule: self.schedule,
            email: self.email,
            message: self.message,
            status: TaskStatus::Active,
            created_at: Timestamp::now(),
            expiration: self.expiration,
        }
    }
}

/// Partial update for a task. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = crate::schema::tasks)]
pub struct TaskChanges {
    pub name: Option<String>,
    pub schedule: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskChanges {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.schedule.is_none()
            && self.email.is_none()
            && self.message.is_none()
            && self.status.is_none()
    }

    /// Applies the set fields to `task` in place.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(schedule) = &self.schedule {
            task.schedule = schedule.clone();
        }
        if let Some(email) = &self.email {
            task.email = email.clone();
        }
        if let Some(message) = &self.message {
            task.message = message.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

// ============================================================================
// Database rows
// ============================================================================

/// Row type for the `tasks` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRecord {
    pub task_id: Uuid,
    pub name: String,
    pub schedule: String,
    pub email: String,
    pub message: String,
    pub status: TaskStatus,
    pub created_at: jiff_diesel::Timestamp,
    pub expiration: Option<jiff_diesel::Timestamp>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        Self {
            task_id: record.task_id,
            name: record.name,
            schedule: record.schedule,
            email: record.email,
            message: record.message,
            status: record.status,
            created_at: record.created_at.to_jiff(),
            expiration: record.expiration.map(|ts| ts.to_jiff()),
        }
    }
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.task_id,
            name: task.name.clone(),
            schedule: task.schedule.clone(),
            email: task.email.clone(),
            message: task.message.clone(),
            status: task.status,
            created_at: task.created_at.to_diesel(),
            expiration: task.expiration.map(|ts| ts.to_diesel()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        NewTask {
            name: "reminder".to_string(),
            schedule: "*/5 * * * *".to_string(),
            email: "a@b.com".to_string(),
            message: "hi".to_string(),
            expiration: None,
        }
        .into_task()
    }

    #[test]
    fn test_new_task_starts_active() {
        let task = sample_task();
        assert_eq!(task.status, TaskStatus::Active);
        assert!(task.is_active());
        assert!(task.expiration.is_none());
    }

    #[test]
    fn test_new_task_ids_are_unique() {
        assert_ne!(sample_task().task_id, sample_task().task_id);
    }

    #[test]
    fn test_task_status_round_trip_through_str() {
        for status in [TaskStatus::Active, TaskStatus::Stopped] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("paused".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_task_status_serializes_lowercase() {
        let json = serde_json::to_string(&TaskStatus::Stopped).unwrap();
        assert_eq!(json, "\"stopped\"");
    }

    #[test]
    fn test_changes_apply_only_set_fields() {
        let mut task = sample_task();
        let original = task.clone();
        let changes = TaskChanges {
            message: Some("updated".to_string()),
            ..TaskChanges::default()
        };

        changes.apply_to(&mut task);

        assert_eq!(task.message, "updated");
        assert_eq!(task.name, original.name);
        assert_eq!(task.schedule, original.schedule);
        assert_eq!(task.status, original.status);
    }

    #[test]
    fn test_changes_is_empty() {
        assert!(TaskChanges::default().is_empty());
        assert!(!TaskChanges::status(TaskStatus::Stopped).is_empty());
    }

    #[test]
    fn test_record_conversion_preserves_fields() {
        let task = sample_task();
        let record = TaskRecord::from(&task);
        assert_eq!(Task::from(record), task);
    }
}
