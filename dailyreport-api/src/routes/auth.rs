/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Create an account and get a token
/// - `POST /api/auth/login` - Exchange credentials for a token
/// - `GET /api/auth/current` - The caller's profile
/// - `PUT /api/auth/profile` - Update the caller's name or email
/// - `PUT /api/auth/password` - Change the caller's password
///
/// All of them sit behind the auth rate limiter.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::AppJson,
    routes::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use dailyreport_shared::{
    auth::middleware::AuthContext,
    models::user::{ChangePassword, LoginUser, RegisterUser, UpdateProfile, UserProfile},
    services::AuthSession,
};

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "password": "Secret123"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "token": "eyJ...",
///   "user": { "id": "uuid", "name": "Ada Lovelace", "email": "ada@example.com", "role": "user", ... }
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterUser>,
) -> ApiResult<(StatusCode, Json<AuthSession>)> {
    let session = state.users.register(req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Login endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email, wrong password or deactivated account
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginUser>,
) -> ApiResult<Json<AuthSession>> {
    Ok(Json(state.users.login(req).await?))
}

/// The authenticated caller's profile
pub async fn current(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.users.current(&auth).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(req): AppJson<UpdateProfile>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.users.update_profile(&auth, req).await?))
}

/// Change password
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Current password wrong or new one too weak
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(req): AppJson<ChangePassword>,
) -> ApiResult<Json<MessageResponse>> {
    state.users.change_password(&auth, req).await?;
    Ok(MessageResponse::new("Password updated successfully"))
}
