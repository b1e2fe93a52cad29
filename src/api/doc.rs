use utoipa::OpenApi;

pub const TASK_TAG: &str = "Tasks";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cronmail",
        description = "Schedules recurring email tasks from cron expressions",
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::models::TaskStatus,
            crate::models::TaskLogStatus,
        )
    ),
    tags(
        (name = TASK_TAG, description = "Task lifecycle and execution log endpoints"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
