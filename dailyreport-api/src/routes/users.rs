/// User administration endpoints (admin only)
///
/// # Endpoints
///
/// - `GET /api/users` - List accounts with `page`, `limit`, `role`,
///   `is_active`, `search`, `sort_by` and `sort_order`
/// - `GET /api/users/:id` - Read an account
/// - `PUT /api/users/:id` - Change name, email, role or active flag
/// - `DELETE /api/users/:id` - Delete an account; its tasks and reports remain

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppJson, AppPath, AppQuery},
    routes::MessageResponse,
};
use axum::{extract::State, Json};
use dailyreport_shared::{
    auth::middleware::AuthContext,
    models::user::{AdminUpdateUser, UserProfile},
    query::{builder::UserListParams, pagination::Page},
};
use uuid::Uuid;

pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthContext,
    AppQuery(params): AppQuery<UserListParams>,
) -> ApiResult<Json<Page<UserProfile>>> {
    Ok(Json(state.users.list(&auth, &params).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.users.get(&auth, id).await?))
}

/// Updates an account
///
/// # Errors
///
/// - `409 Conflict`: Email belongs to another account
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<AdminUpdateUser>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.users.update(&auth, id, req).await?))
}

/// Deletes an account
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Admin tried to delete their own account
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.users.delete(&auth, id).await?;
    Ok(MessageResponse::new("User deleted successfully"))
}
