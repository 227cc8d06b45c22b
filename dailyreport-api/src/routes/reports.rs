/// Report endpoints
///
/// # Endpoints
///
/// - `GET /api/reports` - List visible reports (own and public; all for admins)
/// - `POST /api/reports` - File a report
/// - `GET /api/reports/user/:user_id` - One user's reports (self or admin)
/// - `GET /api/reports/:id` - Read a report with comments
/// - `PUT /api/reports/:id` - Update a report
/// - `DELETE /api/reports/:id` - Delete a report
/// - `POST /api/reports/:id/comments` - Comment on a report
///
/// # Query parameters of the listing
///
/// `page`, `limit` (1-100), `status`, `category`, `author` (admins only),
/// `start_date`, `end_date`, `search`, `sort_by` (`date`, `title`,
/// `status`, `createdAt`) and `sort_order` (`asc` or `desc`).

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
        report::{CreateReportRequest, ReportView, UpdateReportRequest},
    },
    query::{
        builder::{ReportListParams, UserReportParams},
        pagination::Page,
    },
};
use uuid::Uuid;

pub async fn list_reports(
    State(state): State<AppState>,
    auth: AuthContext,
    AppQuery(params): AppQuery<ReportListParams>,
) -> ApiResult<Json<Page<ReportView>>> {
    Ok(Json(state.reports.list(&auth, &params).await?))
}

/// Lists one user's reports
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither that user nor an admin
pub async fn list_user_reports(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(user_id): AppPath<Uuid>,
    AppQuery(params): AppQuery<UserReportParams>,
) -> ApiResult<Json<Page<ReportView>>> {
    Ok(Json(
        state.reports.list_by_user(&auth, user_id, &params).await?,
    ))
}

pub async fn get_report(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ReportView>> {
    Ok(Json(state.reports.get(&auth, id).await?))
}

/// Files a report as the caller
///
/// # Endpoint
///
/// ```text
/// POST /api/reports
/// Content-Type: application/json
///
/// {
///   "title": "Monday",
///   "content": "Finished the importer",
///   "task": "uuid",
///   "category": "daily",
///   "tags": ["backend"]
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Linked task is assigned to someone else
/// - `404 Not Found`: Linked task does not exist
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_report(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(req): AppJson<CreateReportRequest>,
) -> ApiResult<(StatusCode, Json<ReportView>)> {
    let report = state.reports.create(&auth, req).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// Updates a report
///
/// Review fields (`status`, `approved_by`, `approved_at`) are ignored unless
/// the caller is an admin.
pub async fn update_report(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateReportRequest>,
) -> ApiResult<Json<ReportView>> {
    Ok(Json(state.reports.update(&auth, id, req).await?))
}

pub async fn delete_report(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.reports.delete(&auth, id).await?;
    Ok(MessageResponse::new("Report deleted successfully"))
}

pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    let comment = state.reports.add_comment(&auth, id, req).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
