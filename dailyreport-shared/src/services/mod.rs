/// Report, task and user engines
///
/// Each engine combines the filter builder, the authorization guard and the
/// store into the operations the HTTP layer exposes. Every operation takes the
/// caller's [`AuthContext`](crate::auth::middleware::AuthContext) and fails
/// with a [`ServiceError`]; none of them retries.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use dailyreport_shared::auth::middleware::AuthContext;
/// use dailyreport_shared::models::user::Role;
/// use dailyreport_shared::query::builder::TaskListParams;
/// use dailyreport_shared::services::TaskService;
/// use dailyreport_shared::store::memory::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tasks = TaskService::new(Arc::new(MemoryStore::new()));
/// let auth = AuthContext::new(Uuid::new_v4(), Role::User);
///
/// let page = tasks.list(&auth, &TaskListParams::default()).await?;
/// assert_eq!(page.total_count, 0);
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::models::user::UserSummary;
use crate::store::{Store, StoreError};
use crate::validation::FieldError;

pub mod reports;
pub mod tasks;
pub mod users;

pub use reports::ReportService;
pub use tasks::TaskService;
pub use users::{AuthSession, TokenSettings, UserService};

/// Failure of an engine operation
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed or out-of-range input
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// A referenced record is absent
    #[error("{0}")]
    NotFound(String),

    /// Authenticated but not permitted
    #[error("{0}")]
    Forbidden(String),

    /// A uniqueness rule rejected the write
    #[error("{0}")]
    Conflict(String),

    /// Credentials did not check out
    #[error("{0}")]
    Unauthenticated(String),

    /// Hashing or token signing failed
    #[error("{0}")]
    Internal(String),

    /// Persistence failure
    #[error(transparent)]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(field: &str, message: &str) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(message) => ServiceError::Conflict(message),
            StoreError::InvalidReference(message) => ServiceError::NotFound(message),
            other => ServiceError::Store(other),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(e: AuthzError) -> Self {
        ServiceError::Forbidden(e.to_string())
    }
}

impl From<Vec<FieldError>> for ServiceError {
    fn from(errors: Vec<FieldError>) -> Self {
        ServiceError::Validation(errors)
    }
}

impl From<PasswordError> for ServiceError {
    fn from(e: PasswordError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

impl From<JwtError> for ServiceError {
    fn from(e: JwtError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

/// Fails with every collected field error, if any
pub(crate) fn ensure_valid(errors: Vec<FieldError>) -> ServiceResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(errors))
    }
}

/// Resolves user references to display projections in one round trip
pub(crate) async fn user_lookup(
    store: &dyn Store,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, UserSummary>, StoreError> {
    let mut wanted: Vec<Uuid> = ids.into_iter().collect();
    wanted.sort();
    wanted.dedup();

    Ok(store
        .user_summaries(&wanted)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_taxonomy() {
        assert!(matches!(
            ServiceError::from(StoreError::Conflict("taken".to_string())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::InvalidReference("gone".to_string())),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::Database(sqlx::Error::PoolTimedOut)),
            ServiceError::Store(_)
        ));
    }

    #[test]
    fn test_ensure_valid() {
        assert!(ensure_valid(Vec::new()).is_ok());
        assert!(matches!(
            ensure_valid(vec![FieldError::new("title", "Title is required")]),
            Err(ServiceError::Validation(errors)) if errors.len() == 1
        ));
    }

    #[test]
    fn test_authz_denial_becomes_forbidden() {
        let err = ServiceError::from(AuthzError::AdminRequired);
        assert_eq!(err.to_string(), "Admin access required");
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }
}
