/// Persistence collaborator
///
/// The engines never talk to the database directly. They receive an
/// `Arc<dyn Store>` and use the operations below, which is everything the
/// report, task and user workflows need:
///
/// - filtered find with sort/skip/limit and count-matching-filter
/// - find by id, insert, update by id, delete by id
/// - conditional set-once writes for `completed_date` and `approved_at`
/// - atomic comment append
/// - group counts by a field
/// - display projections for reference fields
///
/// # Backends
///
/// - [`postgres::PgStore`]: renders the predicate tree to SQL
/// - [`memory::MemoryStore`]: evaluates the predicate tree in process; used by
///   the test suites
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use dailyreport_shared::store::{memory::MemoryStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::comment::{Comment, CommentParent, CreateComment};
use crate::models::report::{CreateReport, Report, UpdateReport};
use crate::models::task::{CreateTask, Task, TaskPriority, TaskStatus, TaskSummary, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User, UserSummary};
use crate::query::filter::Filter;
use crate::query::QuerySpec;

pub mod memory;
pub mod postgres;

/// Unique constraint on `users.email`
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("{0}")]
    Conflict(String),

    /// The write referenced a record that does not exist
    #[error("{0}")]
    InvalidReference(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.constraint() == Some(USERS_EMAIL_KEY) {
                return StoreError::Conflict("Email already in use".to_string());
            }
            if db.is_foreign_key_violation() {
                return StoreError::InvalidReference(
                    db.constraint()
                        .map(|c| format!("Referenced record not found ({})", c))
                        .unwrap_or_else(|| "Referenced record not found".to_string()),
                );
            }
        }
        StoreError::Database(e)
    }
}

/// Persistence operations used by the engines
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a user; a taken email is a [`StoreError::Conflict`]
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Case-insensitive email lookup
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list_users(&self, spec: &QuerySpec) -> Result<Vec<User>, StoreError>;

    async fn count_users(&self, filter: &Filter) -> Result<i64, StoreError>;

    /// Writes the `Some` fields; `None` when the user does not exist
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError>;

    /// Removes the user row only; tasks, reports and comments that reference
    /// the user stay and resolve its projection to `None`
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, StoreError>;

    /// Inserts a task, stamping `completed_date` when created completed
    async fn insert_task(&self, data: CreateTask) -> Result<Task, StoreError>;

    /// Finds a task whether active or not
    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn list_tasks(&self, spec: &QuerySpec) -> Result<Vec<Task>, StoreError>;

    async fn count_tasks(&self, filter: &Filter) -> Result<i64, StoreError>;

    /// Group count by status; statuses without tasks may be absent
    async fn count_tasks_by_status(
        &self,
        filter: &Filter,
    ) -> Result<Vec<(TaskStatus, i64)>, StoreError>;

    /// Group count by priority; priorities without tasks may be absent
    async fn count_tasks_by_priority(
        &self,
        filter: &Filter,
    ) -> Result<Vec<(TaskPriority, i64)>, StoreError>;

    /// Writes the `Some` fields in one conditional statement
    ///
    /// `completed_date` is set to now only when it is unset and the written
    /// status is `completed`.
    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError>;

    /// Clears `is_active`; `false` when the task does not exist
    async fn soft_delete_task(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn task_summaries(&self, ids: &[Uuid]) -> Result<Vec<TaskSummary>, StoreError>;

    /// Inserts a report, stamping `approved_at` when created approved
    async fn insert_report(&self, data: CreateReport) -> Result<Report, StoreError>;

    async fn find_report(&self, id: Uuid) -> Result<Option<Report>, StoreError>;

    async fn list_reports(&self, spec: &QuerySpec) -> Result<Vec<Report>, StoreError>;

    async fn count_reports(&self, filter: &Filter) -> Result<i64, StoreError>;

    /// Writes the `Some` fields in one conditional statement
    ///
    /// Unless `approved_at` is given explicitly, it is set to now only when it
    /// is unset and the written status is `approved`.
    async fn update_report(
        &self,
        id: Uuid,
        data: UpdateReport,
    ) -> Result<Option<Report>, StoreError>;

    /// Removes a report and its comments
    async fn delete_report(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Appends a comment without rewriting its parent
    async fn append_comment(&self, data: CreateComment) -> Result<Comment, StoreError>;

    /// Comments of one parent, oldest first
    async fn list_comments(
        &self,
        parent_kind: CommentParent,
        parent_id: Uuid,
    ) -> Result<Vec<Comment>, StoreError>;

    /// Verifies the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn test_conflict_message() {
        let err = StoreError::Conflict("Email already in use".to_string());
        assert_eq!(err.to_string(), "Email already in use");
    }
}
