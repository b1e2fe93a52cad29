//! Execution log models. One row is appended per execution attempt.

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

/// Outcome of a single execution attempt.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum TaskLogStatus {
    Success,
    Failure,
}

impl TaskLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskLogStatus::Success => "success",
            TaskLogStatus::Failure => "failure",
        }
    }
}

impl fmt::Display for TaskLogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskLogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(TaskLogStatus::Success),
            "failure" => Ok(TaskLogStatus::Failure),
            _ => Err(format!("Unrecognized task log status: {}", s)),
        }
    }
}

impl ToSql<Text, Pg> for TaskLogStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for TaskLogStatus {
    fn from_sql(
        bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        s.parse().map_err(Into::into)
    }
}

/// A persisted execution log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLog {
    pub id: i64,
    pub task_id: Uuid,
    pub executed_at: Timestamp,
    pub status: TaskLogStatus,
    pub error_message: Option<String>,
}

/// A log entry about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskLog {
    pub task_id: Uuid,
    pub executed_at: Timestamp,
    pub status: TaskLogStatus,
    pub error_message: Option<String>,
}

impl NewTaskLog {
    pub fn success(task_id: Uuid) -> Self {
        Self {
            task_id,
            executed_at: Timestamp::now(),
            status: TaskLogStatus::Success,
            error_message: None,
        }
    }

    pub fn failure(task_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            task_id,
            executed_at: Timestamp::now(),
            status: TaskLogStatus::Failure,
            error_message: Some(error.into()),
        }
    }
}

/// Row type for reading the `task_logs` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::task_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskLogRecord {
    pub id: i64,
    pub task_id: Uuid,
    pub executed_at: jiff_diesel::Timestamp,
    pub status: TaskLogStatus,
    pub error_message: Option<String>,
}

impl From<TaskLogRecord> for TaskLog {
    fn from(record: TaskLogRecord) -> Self {
        Self {
            id: record.id,
            task_id: record.task_id,
            executed_at: record.executed_at.to_jiff(),
            status: record.status,
            error_message: record.error_message,
        }
    }
}

/// Row type for inserting into the `task_logs` table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::task_logs)]
pub struct NewTaskLogRecord {
    pub task_id: Uuid,
    pub executed_at: jiff_diesel::Timestamp,
    pub status: TaskLogStatus,
    pub error_message: Option<String>,
}

impl From<&NewTaskLog> for NewTaskLogRecord {
    fn from(log: &NewTaskLog) -> Self {
        Self {
            task_id: log.task_id,
            executed_at: log.executed_at.to_diesel(),
            status: log.status,
            error_message: log.error_message.clone(),
        }
    }
}
