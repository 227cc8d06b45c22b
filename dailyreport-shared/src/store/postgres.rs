/// PostgreSQL store
///
/// Thin adapter from the [`Store`] trait onto the SQL that lives with each
/// model. Constraint violations are translated by `StoreError::from`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::db::pool::health_check;
use crate::models::comment::{Comment, CommentParent, CreateComment};
use crate::models::report::{CreateReport, Report, UpdateReport};
use crate::models::task::{CreateTask, Task, TaskPriority, TaskStatus, TaskSummary, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User, UserSummary};
use crate::query::filter::Filter;
use crate::query::QuerySpec;

/// [`Store`] backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn list_users(&self, spec: &QuerySpec) -> Result<Vec<User>, StoreError> {
        Ok(User::list(&self.pool, spec).await?)
    }

    async fn count_users(&self, filter: &Filter) -> Result<i64, StoreError> {
        Ok(User::count(&self.pool, filter).await?)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        Ok(User::update(&self.pool, id, data).await?)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(User::delete(&self.pool, id).await?)
    }

    async fn user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, StoreError> {
        Ok(User::summaries(&self.pool, ids).await?)
    }

    async fn insert_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(&self, spec: &QuerySpec) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list(&self.pool, spec).await?)
    }

    async fn count_tasks(&self, filter: &Filter) -> Result<i64, StoreError> {
        Ok(Task::count(&self.pool, filter).await?)
    }

    async fn count_tasks_by_status(
        &self,
        filter: &Filter,
    ) -> Result<Vec<(TaskStatus, i64)>, StoreError> {
        Ok(Task::count_by_status(&self.pool, filter).await?)
    }

    async fn count_tasks_by_priority(
        &self,
        filter: &Filter,
    ) -> Result<Vec<(TaskPriority, i64)>, StoreError> {
        Ok(Task::count_by_priority(&self.pool, filter).await?)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn soft_delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Task::soft_delete(&self.pool, id).await?)
    }

    async fn task_summaries(&self, ids: &[Uuid]) -> Result<Vec<TaskSummary>, StoreError> {
        Ok(Task::summaries(&self.pool, ids).await?)
    }

    async fn insert_report(&self, data: CreateReport) -> Result<Report, StoreError> {
        Ok(Report::create(&self.pool, data).await?)
    }

    async fn find_report(&self, id: Uuid) -> Result<Option<Report>, StoreError> {
        Ok(Report::find_by_id(&self.pool, id).await?)
    }

    async fn list_reports(&self, spec: &QuerySpec) -> Result<Vec<Report>, StoreError> {
        Ok(Report::list(&self.pool, spec).await?)
    }

    async fn count_reports(&self, filter: &Filter) -> Result<i64, StoreError> {
        Ok(Report::count(&self.pool, filter).await?)
    }

    async fn update_report(
        &self,
        id: Uuid,
        data: UpdateReport,
    ) -> Result<Option<Report>, StoreError> {
        Ok(Report::update(&self.pool, id, data).await?)
    }

    async fn delete_report(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Report::delete(&self.pool, id).await?)
    }

    async fn append_comment(&self, data: CreateComment) -> Result<Comment, StoreError> {
        Ok(Comment::create(&self.pool, data).await?)
    }

    async fn list_comments(
        &self,
        parent_kind: CommentParent,
        parent_id: Uuid,
    ) -> Result<Vec<Comment>, StoreError> {
        Ok(Comment::list_for_parent(&self.pool, parent_kind, parent_id).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }
}
