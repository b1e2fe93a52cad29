//! Data Transfer Objects for API requests and responses.

mod error;
mod health;
mod task;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use task::{
    CreateTaskRequest, EditTaskRequest, MessageResponse, TaskIdQuery, TaskIdRequest,
    TaskLogResponse, TaskLogsQuery, TaskResponse,
};
