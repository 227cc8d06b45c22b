/// Task engine
///
/// Admins create and assign tasks; assignees read them, move them through
/// their statuses and comment on them. Deletion is soft: the task keeps its
/// row and comments but drops out of every listing.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ensure_valid, user_lookup, ServiceError, ServiceResult};
use crate::auth::authorization::{authorize, may_write_field, require_admin, Operation, Target};
use crate::auth::middleware::AuthContext;
use crate::models::comment::{AddCommentRequest, CommentParent, CommentView, CreateComment};
use crate::models::task::{
    complete_counts, CreateTaskRequest, Task, TaskBrief, TaskStats, TaskView, UpdateTaskRequest,
};
use crate::models::ResourceKind;
use crate::query::builder::{
    build_my_tasks, build_task_query, build_task_search, overdue_filter, task_scope,
    MyTasksParams, TaskListParams, TaskSearchParams,
};
use crate::query::pagination::Page;
use crate::query::QuerySpec;
use crate::store::Store;

/// Task operations
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Lists the active tasks visible to the caller
    pub async fn list(
        &self,
        auth: &AuthContext,
        params: &TaskListParams,
    ) -> ServiceResult<Page<TaskView>> {
        let spec = build_task_query(auth, params)?;

        let tasks = self.store.list_tasks(&spec).await?;
        let total = self.store.count_tasks(&spec.filter).await?;
        let views = self.views(tasks).await?;

        Ok(Page::new(views, total, spec.page, spec.limit))
    }

    /// Reads one task with its comments
    ///
    /// Soft-deleted tasks are only visible to admins.
    pub async fn get(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<TaskView> {
        let task = self.load_visible(auth, id).await?;
        authorize(auth, Operation::Read, &target(&task))?;

        let comments = self.store.list_comments(CommentParent::Task, id).await?;
        let users = user_lookup(self.store.as_ref(), comments.iter().map(|c| c.user_id)).await?;
        let comments = comments
            .into_iter()
            .map(|c| {
                let user = users.get(&c.user_id).cloned();
                CommentView::new(c, user)
            })
            .collect();

        Ok(self.view(task).await?.with_comments(comments))
    }

    /// Creates and assigns a task; admin only
    pub async fn create(
        &self,
        auth: &AuthContext,
        payload: CreateTaskRequest,
    ) -> ServiceResult<TaskView> {
        require_admin(auth)?;

        let data = payload.into_create(auth.user_id)?;
        self.require_user(data.assigned_to).await?;

        let task = self.store.insert_task(data).await?;
        info!(
            task_id = %task.id,
            assigned_to = %task.assigned_to,
            assigned_by = %task.assigned_by,
            "Task created"
        );

        self.view(task).await
    }

    /// Applies a partial update
    ///
    /// Assignees may not reassign or reprioritize; those fields are dropped
    /// from their payload and the rest is applied.
    pub async fn update(
        &self,
        auth: &AuthContext,
        id: Uuid,
        mut payload: UpdateTaskRequest,
    ) -> ServiceResult<TaskView> {
        let task = self.load_visible(auth, id).await?;
        authorize(auth, Operation::Update, &target(&task))?;

        let stripped = payload.strip(|field| may_write_field(auth, ResourceKind::Task, field));
        if !stripped.is_empty() {
            debug!(
                user_id = %auth.user_id,
                task_id = %id,
                fields = ?stripped,
                "Stripped fields the caller may not write"
            );
        }

        let data = payload.into_update()?;
        for user_id in [data.assigned_to, data.assigned_by].into_iter().flatten() {
            self.require_user(user_id).await?;
        }

        let updated = self
            .store
            .update_task(id, data)
            .await?
            .ok_or_else(not_found)?;

        info!(
            task_id = %id,
            user_id = %auth.user_id,
            status = ?updated.status,
            "Task updated"
        );

        self.view(updated).await
    }

    /// Soft-deletes a task; repeating the call succeeds
    pub async fn delete(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<()> {
        let task = self.load(id).await?;
        authorize(auth, Operation::Delete, &target(&task))?;

        if task.is_active {
            self.store.soft_delete_task(id).await?;
            info!(task_id = %id, user_id = %auth.user_id, "Task deactivated");
        }

        Ok(())
    }

    /// Appends a comment as the caller
    pub async fn add_comment(
        &self,
        auth: &AuthContext,
        id: Uuid,
        mut payload: AddCommentRequest,
    ) -> ServiceResult<CommentView> {
        ensure_valid(payload.check())?;

        let task = self.load_visible(auth, id).await?;
        authorize(auth, Operation::Comment, &target(&task))?;

        let comment = self
            .store
            .append_comment(CreateComment {
                parent_kind: CommentParent::Task,
                parent_id: id,
                user_id: auth.user_id,
                content: payload.content,
            })
            .await?;
        debug!(task_id = %id, user_id = %auth.user_id, "Comment added to task");

        let user = self.store.find_user(auth.user_id).await?;
        Ok(CommentView::new(comment, user.as_ref().map(Into::into)))
    }

    /// Searches the caller's open tasks by title and description
    pub async fn search(
        &self,
        auth: &AuthContext,
        params: &TaskSearchParams,
    ) -> ServiceResult<Vec<TaskBrief>> {
        let spec = build_task_search(auth, params)?;
        self.briefs(&spec).await
    }

    /// The caller's active tasks in any status
    pub async fn my_tasks(
        &self,
        auth: &AuthContext,
        params: &MyTasksParams,
    ) -> ServiceResult<Vec<TaskBrief>> {
        let spec = build_my_tasks(auth, params)?;
        self.briefs(&spec).await
    }

    /// Counts over the caller's visible tasks
    pub async fn stats(&self, auth: &AuthContext) -> ServiceResult<TaskStats> {
        let scope = task_scope(auth);

        let total = self.store.count_tasks(&scope).await?;
        let by_status = self.store.count_tasks_by_status(&scope).await?;
        let by_priority = self.store.count_tasks_by_priority(&scope).await?;
        let overdue_count = self
            .store
            .count_tasks(&overdue_filter(auth, Utc::now()))
            .await?;

        Ok(TaskStats {
            total,
            by_status: complete_counts(&by_status),
            by_priority: complete_counts(&by_priority),
            overdue_count,
        })
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Task> {
        self.store.find_task(id).await?.ok_or_else(not_found)
    }

    async fn load_visible(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<Task> {
        let task = self.load(id).await?;
        if !task.is_active && !auth.is_admin() {
            return Err(not_found());
        }
        Ok(task)
    }

    async fn require_user(&self, id: Uuid) -> ServiceResult<()> {
        match self.store.find_user(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound("Assigned user not found".to_string())),
        }
    }

    async fn briefs(&self, spec: &QuerySpec) -> ServiceResult<Vec<TaskBrief>> {
        let now = Utc::now();
        Ok(self
            .store
            .list_tasks(spec)
            .await?
            .into_iter()
            .map(|task| TaskBrief::new(task, now))
            .collect())
    }

    async fn view(&self, task: Task) -> ServiceResult<TaskView> {
        let mut views = self.views(vec![task]).await?;
        views.pop().ok_or_else(not_found)
    }

    async fn views(&self, tasks: Vec<Task>) -> ServiceResult<Vec<TaskView>> {
        let users = user_lookup(
            self.store.as_ref(),
            tasks.iter().flat_map(|t| [t.assigned_to, t.assigned_by]),
        )
        .await?;
        let now = Utc::now();

        Ok(tasks
            .into_iter()
            .map(|task| {
                let assigned_to = users.get(&task.assigned_to).cloned();
                let assigned_by = users.get(&task.assigned_by).cloned();
                TaskView::new(task, assigned_to, assigned_by, now)
            })
            .collect())
    }
}

fn target(task: &Task) -> Target {
    Target::Task {
        assigned_to: task.assigned_to,
    }
}

fn not_found() -> ServiceError {
    ServiceError::NotFound("Task not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use crate::models::user::{CreateUser, Role};
    use crate::store::memory::MemoryStore;

    async fn setup() -> (TaskService, AuthContext, AuthContext) {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for (email, role) in [("admin@example.com", Role::Admin), ("u@example.com", Role::User)] {
            let user = store
                .insert_user(CreateUser {
                    name: "Test".to_string(),
                    email: email.to_string(),
                    password_hash: "hash".to_string(),
                    role,
                })
                .await
                .unwrap();
            ids.push(AuthContext::new(user.id, role));
        }
        (TaskService::new(store), ids[0], ids[1])
    }

    fn request(assignee: Uuid) -> CreateTaskRequest {
        CreateTaskRequest {
            title: "Write the weekly summary".to_string(),
            description: "Collect the numbers and write it up".to_string(),
            assigned_to: Some(assignee.to_string()),
            due_date: Some("2030-01-15".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let (tasks, _, user) = setup().await;
        let err = tasks.create(&user, request(user.user_id)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(m) if m == "Admin access required"));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_assignee() {
        let (tasks, admin, _) = setup().await;
        let err = tasks.create(&admin, request(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_resolves_references() {
        let (tasks, admin, user) = setup().await;
        let view = tasks.create(&admin, request(user.user_id)).await.unwrap();

        assert_eq!(view.assigned_to.map(|u| u.id), Some(user.user_id));
        assert_eq!(view.assigned_by.map(|u| u.id), Some(admin.user_id));
        assert_eq!(view.status, TaskStatus::Pending);
        assert_eq!(view.priority, TaskPriority::Medium);
        assert!(!view.is_overdue);
    }

    #[tokio::test]
    async fn test_assignee_cannot_reprioritize() {
        let (tasks, admin, user) = setup().await;
        let created = tasks.create(&admin, request(user.user_id)).await.unwrap();

        let view = tasks
            .update(
                &user,
                created.id,
                UpdateTaskRequest {
                    status: Some("in_progress".to_string()),
                    priority: Some("urgent".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.status, TaskStatus::InProgress);
        assert_eq!(view.priority, TaskPriority::Medium);
    }

    #[tokio::test]
    async fn test_deleted_task_hidden_from_assignee() {
        let (tasks, admin, user) = setup().await;
        let created = tasks.create(&admin, request(user.user_id)).await.unwrap();

        tasks.delete(&admin, created.id).await.unwrap();
        tasks.delete(&admin, created.id).await.unwrap();

        assert!(matches!(
            tasks.get(&user, created.id).await,
            Err(ServiceError::NotFound(_))
        ));
        let view = tasks.get(&admin, created.id).await.unwrap();
        assert!(!view.is_active);
    }

    #[tokio::test]
    async fn test_stats_cover_every_variant() {
        let (tasks, admin, user) = setup().await;
        tasks.create(&admin, request(user.user_id)).await.unwrap();

        let stats = tasks.stats(&user).await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.by_status.len(), 4);
        assert_eq!(stats.by_priority.len(), 4);
        assert_eq!(stats.overdue_count, 0);
    }
}
