/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks` - List visible active tasks
/// - `POST /api/tasks` - Create and assign a task (admin)
/// - `GET /api/tasks/search?q=&status=&limit=` - Search own open tasks
/// - `GET /api/tasks/my-tasks?limit=` - Own active tasks, any status
/// - `GET /api/tasks/stats` - Counts by status and priority, overdue count
/// - `GET /api/tasks/:id` - Read a task with comments
/// - `PUT /api/tasks/:id` - Update a task
/// - `DELETE /api/tasks/:id` - Deactivate a task (admin)
/// - `POST /api/tasks/:id/comments` - Comment on a task

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppJson, AppPath, AppQuery},
    routes::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use dailyreport_shared::{
    auth::middleware::AuthContext,
    models::{
        comment::{AddCommentRequest, CommentView},
        task::{CreateTaskRequest, TaskBrief, TaskStats, TaskView, UpdateTaskRequest},
    },
    query::{
        builder::{MyTasksParams, TaskListParams, TaskSearchParams},
        pagination::Page,
    },
};
use uuid::Uuid;

pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    AppQuery(params): AppQuery<TaskListParams>,
) -> ApiResult<Json<Page<TaskView>>> {
    Ok(Json(state.tasks.list(&auth, &params).await?))
}

/// Creates a task
///
/// # Endpoint
///
/// ```text
/// POST /api/tasks
/// Content-Type: application/json
///
/// {
///   "title": "Prepare the release notes",
///   "description": "Collect merged changes since the last tag",
///   "assigned_to": "uuid",
///   "due_date": "2025-05-01",
///   "priority": "high"
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: Assignee does not exist
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(req): AppJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let task = state.tasks.create(&auth, req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn search_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    AppQuery(params): AppQuery<TaskSearchParams>,
) -> ApiResult<Json<Vec<TaskBrief>>> {
    Ok(Json(state.tasks.search(&auth, &params).await?))
}

pub async fn my_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    AppQuery(params): AppQuery<MyTasksParams>,
) -> ApiResult<Json<Vec<TaskBrief>>> {
    Ok(Json(state.tasks.my_tasks(&auth, &params).await?))
}

pub async fn task_stats(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<TaskStats>> {
    Ok(Json(state.tasks.stats(&auth).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<TaskView>> {
    Ok(Json(state.tasks.get(&auth, id).await?))
}

/// Updates a task
///
/// Assignees cannot change `assigned_to`, `assigned_by` or `priority`;
/// those fields are dropped from their payload.
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskView>> {
    Ok(Json(state.tasks.update(&auth, id, req).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.tasks.delete(&auth, id).await?;
    Ok(MessageResponse::new("Task deleted successfully"))
}

pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    let comment = state.tasks.add_comment(&auth, id, req).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
