//! Task request and response DTOs.
//!
//! Request bodies identify a task by `uuid`, which is what existing clients
//! send. Responses use camelCase field names.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{NewTask, Task, TaskChanges, TaskLog, TaskLogStatus, TaskStatus};

// ============================================================================
// Request DTOs
// ============================================================================

/// Request body for creating a task.
///
/// Missing string fields deserialize as empty and are reported by validation
/// rather than as a JSON error.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[schema(example = json!({
    "name": "reminder",
    "schedule": "*/5 * * * *",
    "email": "a@b.com",
    "message": "hi"
}))]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    /// 5-field cron expression, or 6/7 fields with seconds
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Schedule is required"))]
    pub schedule: String,

    #[serde(default)]
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,

    /// Stored but not used for scheduling
    #[schema(value_type = Option<String>, format = DateTime)]
    pub expiration: Option<Timestamp>,
}

impl CreateTaskRequest {
    pub fn into_new_task(self) -> NewTask {
        NewTask {
            name: self.name,
            schedule: self.schedule,
            email: self.email,
            message: self.message,
            expiration: self.expiration,
        }
    }
}

/// Request body for editing a task. Absent or empty fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EditTaskRequest {
    pub uuid: Uuid,

    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 255, message = "Schedule must be at most 255 characters"))]
    pub schedule: Option<String>,

    pub email: Option<String>,

    pub message: Option<String>,
}

impl EditTaskRequest {
    pub fn into_changes(self) -> (Uuid, TaskChanges) {
        (
            self.uuid,
            TaskChanges {
                name: self.name,
                schedule: self.schedule,
                email: self.email,
                message: self.message,
                status: None,
            },
        )
    }
}

/// Request body naming one task.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TaskIdRequest {
    pub uuid: Uuid,
}

/// Query string naming one task.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct TaskIdQuery {
    /// Task id
    pub uuid: Uuid,
}

/// Query parameters for a page of task logs.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct TaskLogsQuery {
    /// Task id
    pub uuid: Uuid,

    /// Page number (1-based)
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: u32,

    /// Number of logs per page (max 100)
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    #[param(minimum = 1, maximum = 100, example = 20)]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub task_id: Uuid,
    pub name: String,
    pub schedule: String,
    pub email: String,
    pub message: String,
    pub status: TaskStatus,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: Timestamp,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub expiration: Option<Timestamp>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.task_id,
            name: task.name,
            schedule: task.schedule,
            email: task.email,
            message: task.message,
            status: task.status,
            created_at: task.created_at,
            expiration: task.expiration,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskLogResponse {
    pub id: i64,
    pub task_id: Uuid,
    #[schema(value_type = String, format = DateTime)]
    pub executed_at: Timestamp,
    pub status: TaskLogStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<TaskLog> for TaskLogResponse {
    fn from(log: TaskLog) -> Self {
        Self {
            id: log.id,
            task_id: log.task_id,
            executed_at: log.executed_at,
            status: log.status,
            error_message: log.error_message,
        }
    }
}

/// Confirmation message, with the affected task where there is one.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskResponse>,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            task: None,
        }
    }

    pub fn with_task(message: &str, task: Task) -> Self {
        Self {
            message: message.to_string(),
            task: Some(TaskResponse::from(task)),
        }
    }
}
