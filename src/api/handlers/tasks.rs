//! Task request handlers.
//!
//! Paths and verbs follow the routes existing clients already call, so the
//! endpoints are action-named rather than resource-named.

use crate::api::doc::TASK_TAG;
use crate::api::dto::{
    CreateTaskRequest, EditTaskRequest, ErrorResponse, MessageResponse, TaskIdQuery,
    TaskIdRequest, TaskLogResponse, TaskLogsQuery, TaskResponse,
};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};
use axum::{Json, extract::State, http::StatusCode};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub fn task_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(create_task))
        .routes(routes!(edit_task))
        .routes(routes!(delete_task))
        .routes(routes!(list_tasks))
        .routes(routes!(get_task))
        .routes(routes!(stop_task))
        .routes(routes!(start_task))
        .routes(routes!(list_task_logs))
}

/// POST /api/createTask - Create and schedule a task
#[utoipa::path(
    post,
    path = "/createTask",
    tag = TASK_TAG,
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created and scheduled", body = MessageResponse),
        (status = 400, description = "Missing fields or invalid schedule", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
async fn create_task(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let task = state.services.tasks.create_task(req.into_new_task()).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_task(
            "Task created and scheduled successfully",
            task,
        )),
    ))
}

/// PUT /api/editTask - Update provided fields of a task
#[utoipa::path(
    put,
    path = "/editTask",
    tag = TASK_TAG,
    request_body = EditTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = MessageResponse),
        (status = 400, description = "Invalid field or schedule", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
async fn edit_task(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<EditTaskRequest>,
) -> AppResult<Json<MessageResponse>> {
    let (task_id, changes) = req.into_changes();
    let task = state.services.tasks.edit_task(task_id, changes).await?;
    Ok(Json(MessageResponse::with_task(
        "Task updated successfully.",
        task,
    )))
}

/// POST /api/deleteTask - Delete a task and all of its logs
#[utoipa::path(
    post,
    path = "/deleteTask",
    tag = TASK_TAG,
    request_body = TaskIdRequest,
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
async fn delete_task(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TaskIdRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.tasks.delete_task(req.uuid).await?;
    Ok(Json(MessageResponse::new("Task deleted successfully.")))
}

/// GET /api/getAllTasks - List every task regardless of status
#[utoipa::path(
    get,
    path = "/getAllTasks",
    tag = TASK_TAG,
    responses(
        (status = 200, description = "All tasks, oldest first", body = Vec<TaskResponse>)
    )
)]
async fn list_tasks(State(state): State<AppState>) -> AppResult<Json<Vec<TaskResponse>>> {
    let tasks = state.services.tasks.list_tasks().await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// GET /api/getTaskById - Fetch one task
#[utoipa::path(
    get,
    path = "/getTaskById",
    tag = TASK_TAG,
    params(TaskIdQuery),
    responses(
        (status = 200, description = "Task found", body = TaskResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
async fn get_task(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<TaskIdQuery>,
) -> AppResult<Json<TaskResponse>> {
    let task = state.services.tasks.get_task(query.uuid).await?;
    Ok(Json(TaskResponse::from(task)))
}

/// POST /api/stopTask - Mark a task stopped and cancel its timer
#[utoipa::path(
    post,
    path = "/stopTask",
    tag = TASK_TAG,
    request_body = TaskIdRequest,
    responses(
        (status = 200, description = "Task stopped", body = MessageResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
async fn stop_task(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TaskIdRequest>,
) -> AppResult<Json<MessageResponse>> {
    let task = state.services.tasks.stop_task(req.uuid).await?;
    Ok(Json(MessageResponse::with_task(
        "Task stopped successfully.",
        task,
    )))
}

/// POST /api/startTask - Mark a task active and schedule it
#[utoipa::path(
    post,
    path = "/startTask",
    tag = TASK_TAG,
    request_body = TaskIdRequest,
    responses(
        (status = 200, description = "Task activated", body = MessageResponse),
        (status = 400, description = "Stored schedule is invalid", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
async fn start_task(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TaskIdRequest>,
) -> AppResult<Json<MessageResponse>> {
    let task = state.services.tasks.start_task(req.uuid).await?;
    Ok(Json(MessageResponse::with_task(
        "Task Activated successfully.",
        task,
    )))
}

/// GET /api/getTaskLogs - Execution logs of a task, newest first
#[utoipa::path(
    get,
    path = "/getTaskLogs",
    tag = TASK_TAG,
    params(TaskLogsQuery),
    responses(
        (status = 200, description = "One page of logs", body = Vec<TaskLogResponse>),
        (status = 400, description = "Invalid paging parameters", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
async fn list_task_logs(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<TaskLogsQuery>,
) -> AppResult<Json<Vec<TaskLogResponse>>> {
    let logs = state
        .services
        .tasks
        .list_task_logs(query.uuid, query.page, query.page_size)
        .await?;
    Ok(Json(logs.into_iter().map(TaskLogResponse::from).collect()))
}
