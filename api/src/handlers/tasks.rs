//! Task endpoints, all scoped under `/users/:user_id/tasks`.
//!
//! The owner id in the path is the scope every operation runs against; a
//! task that exists under a different owner is reported as absent.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use service::TaskUpdate;
use storage::TaskStatus;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        validate_description, CreateTaskRequest, DeleteResponse, TaskListQuery, TaskListResponse,
        TaskResponse, UpdateTaskRequest,
    },
    principal::CurrentPrincipal,
    AppState,
};

fn parse_status_filter(query: &TaskListQuery) -> ApiResult<Option<TaskStatus>> {
    match query.status.as_deref() {
        None => Ok(None),
        Some(raw) => TaskStatus::parse(raw).map(Some).ok_or_else(|| {
            ApiError::Validation(format!("unknown task status: {}", raw))
        }),
    }
}

/// List an owner's tasks, optionally filtered by status
///
/// GET /users/:user_id/tasks?status=
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentPrincipal(caller): CurrentPrincipal,
    Path(user_id): Path<Uuid>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = parse_status_filter(&query)?;
    let tasks = state.tasks.list(&caller, user_id, status).await?;
    Ok(Json(TaskListResponse {
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
    }))
}

/// Create a task under an owner
///
/// POST /users/:user_id/tasks
pub async fn create_task(
    State(state): State<AppState>,
    CurrentPrincipal(caller): CurrentPrincipal,
    Path(user_id): Path<Uuid>,
    Json(body): Json<CreateTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_description(&body.description)?;

    let task = state
        .tasks
        .create(&caller, user_id, body.description)
        .await?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

/// Fetch a single task
///
/// GET /users/:user_id/tasks/:task_id
pub async fn get_task(
    State(state): State<AppState>,
    CurrentPrincipal(caller): CurrentPrincipal,
    Path((user_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let task = state.tasks.get(&caller, user_id, task_id).await?;
    Ok(Json(TaskResponse::from(task)))
}

/// Apply partial changes to a task
///
/// PATCH /users/:user_id/tasks/:task_id
pub async fn update_task(
    State(state): State<AppState>,
    CurrentPrincipal(caller): CurrentPrincipal,
    Path((user_id, task_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(description) = &body.description {
        validate_description(description)?;
    }

    let task = state
        .tasks
        .update(
            &caller,
            user_id,
            task_id,
            TaskUpdate {
                description: body.description,
                status: body.status,
            },
        )
        .await?;

    Ok(Json(TaskResponse::from(task)))
}

/// Delete a task
///
/// DELETE /users/:user_id/tasks/:task_id
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentPrincipal(caller): CurrentPrincipal,
    Path((user_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    state.tasks.delete(&caller, user_id, task_id).await?;
    Ok(Json(DeleteResponse { deleted: true }))
}
