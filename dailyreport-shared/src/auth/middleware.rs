/// Request authentication
///
/// The API's JWT layer calls [`authenticate`] for every protected request. It
/// validates the bearer token, loads the account from the store and rejects
/// unknown or deactivated users. The resulting [`AuthContext`] is the identity
/// every engine operation receives; its role always comes from the stored
/// user, never from the token.
///
/// # Request Extensions
///
/// After successful authentication the layer inserts an [`AuthContext`].
/// Handlers take it as an argument directly:
///
/// ```
/// use dailyreport_shared::auth::middleware::AuthContext;
///
/// async fn handler(auth: AuthContext) -> String {
///     format!("User: {}, admin: {}", auth.user_id, auth.is_admin())
/// }
/// ```

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::user::Role;
use crate::store::Store;

/// Verified caller identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Role of the stored user at request time
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Invalid authorization header format
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed, or its user is gone or inactive
    #[error("{0}")]
    InvalidToken(String),

    /// Store lookup failed
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AuthError::MissingCredentials | AuthError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
            AuthError::InvalidFormat(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AuthError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = match &self {
            AuthError::DatabaseError(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if token.trim().is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token.trim())
}

/// Resolves the caller of a request
///
/// # Errors
///
/// - `MissingCredentials` / `InvalidFormat` for a missing or malformed header
/// - `InvalidToken` for a bad, expired or foreign token, or when the user no
///   longer exists or is deactivated
/// - `DatabaseError` when the store lookup fails
pub async fn authenticate(
    store: &dyn Store,
    secret: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let token = extract_bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    let user = store
        .find_user(claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or_else(|| AuthError::InvalidToken("User no longer exists".to_string()))?;

    if !user.is_active {
        tracing::debug!(user_id = %user.id, "Rejected token of deactivated user");
        return Err(AuthError::InvalidToken("Account is deactivated".to_string()));
    }

    Ok(AuthContext::new(user.id, user.role))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::issue_token;
    use crate::models::user::CreateUser;
    use crate::store::memory::MemoryStore;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    async fn seed(store: &MemoryStore, role: Role) -> Uuid {
        store
            .insert_user(CreateUser {
                name: "Jane".to_string(),
                email: format!("{}@example.com", Uuid::new_v4()),
                password_hash: "hash".to_string(),
                role,
            })
            .await
            .unwrap()
            .id
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&bearer("abc")).unwrap(), "abc");
        assert!(matches!(
            extract_bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));

        let mut basic = HeaderMap::new();
        basic.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            extract_bearer_token(&basic),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_uses_stored_role() {
        let store = MemoryStore::new();
        let id = seed(&store, Role::Admin).await;

        // Token claims say user, the account says admin
        let token = issue_token(id, Role::User, 1, SECRET).unwrap();
        let auth = authenticate(&store, SECRET, &bearer(&token)).await.unwrap();

        assert_eq!(auth, AuthContext::new(id, Role::Admin));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_unknown_and_inactive_users() {
        let store = MemoryStore::new();

        let token = issue_token(Uuid::new_v4(), Role::User, 1, SECRET).unwrap();
        assert!(matches!(
            authenticate(&store, SECRET, &bearer(&token)).await,
            Err(AuthError::InvalidToken(_))
        ));

        let id = seed(&store, Role::User).await;
        store
            .update_user(
                id,
                crate::models::user::UpdateUser {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let token = issue_token(id, Role::User, 1, SECRET).unwrap();
        assert!(matches!(
            authenticate(&store, SECRET, &bearer(&token)).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_auth_error_into_response() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidFormat("test".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::DatabaseError("test".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
