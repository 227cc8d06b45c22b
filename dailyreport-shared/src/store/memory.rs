/// In-memory store
///
/// Keeps every table in a `Vec` behind one `RwLock` and evaluates query specs
/// with [`Filter::matches`] and [`compare_by`]. It mirrors the PostgreSQL
/// backend's constraints: unique case-insensitive emails, task link checks,
/// user deletes that leave tasks, reports and comments in place, and the
/// set-once timestamps.
///
/// Records keep insertion order, so sorts with equal keys are stable.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::comment::{Comment, CommentParent, CreateComment};
use crate::models::report::{CreateReport, Report, ReportStatus, UpdateReport};
use crate::models::task::{CreateTask, Task, TaskPriority, TaskStatus, TaskSummary, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User, UserSummary};
use crate::query::filter::{compare_by, Filter, Filterable};
use crate::query::QuerySpec;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tasks: Vec<Task>,
    reports: Vec<Report>,
    comments: Vec<Comment>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }

    fn require_task(&self, id: Uuid) -> Result<(), StoreError> {
        if self.tasks.iter().any(|t| t.id == id) {
            Ok(())
        } else {
            Err(StoreError::InvalidReference("Linked task does not exist".to_string()))
        }
    }
}

/// [`Store`] held entirely in process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn select<R: Filterable + Clone>(rows: &[R], spec: &QuerySpec) -> Vec<R> {
    let mut matched: Vec<&R> = rows.iter().filter(|r| spec.filter.matches(*r)).collect();
    matched.sort_by(|a, b| compare_by(*a, *b, &spec.sort));

    matched
        .into_iter()
        .skip(spec.skip.max(0) as usize)
        .take(spec.limit.max(0) as usize)
        .cloned()
        .collect()
}

fn count<R: Filterable>(rows: &[R], filter: &Filter) -> i64 {
    rows.iter().filter(|r| filter.matches(*r)).count() as i64
}

fn group_count<R: Filterable, K: PartialEq + Copy>(
    rows: &[R],
    filter: &Filter,
    key: impl Fn(&R) -> K,
) -> Vec<(K, i64)> {
    let mut groups: Vec<(K, i64)> = Vec::new();
    for row in rows.iter().filter(|r| filter.matches(*r)) {
        let k = key(row);
        match groups.iter_mut().find(|(g, _)| *g == k) {
            Some((_, n)) => *n += 1,
            None => groups.push((k, 1)),
        }
    }
    groups
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&data.email, None) {
            return Err(StoreError::Conflict("Email already in use".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self, spec: &QuerySpec) -> Result<Vec<User>, StoreError> {
        Ok(select(&self.tables.read().await.users, spec))
    }

    async fn count_users(&self, filter: &Filter) -> Result<i64, StoreError> {
        Ok(count(&self.tables.read().await.users, filter))
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &data.email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::Conflict("Email already in use".to_string()));
            }
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(password_hash) = data.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = data.role {
            user.role = role;
        }
        if let Some(is_active) = data.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);

        Ok(tables.users.len() < before)
    }

    async fn user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(UserSummary::from)
            .collect())
    }

    async fn insert_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            assigned_to: data.assigned_to,
            assigned_by: data.assigned_by,
            status: data.status,
            priority: data.priority,
            category: data.category,
            due_date: data.due_date,
            start_date: data.start_date.unwrap_or(now),
            completed_date: (data.status == TaskStatus::Completed).then_some(now),
            tags: data.tags,
            is_active: true,
            estimated_hours: data.estimated_hours,
            actual_hours: data.actual_hours,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, spec: &QuerySpec) -> Result<Vec<Task>, StoreError> {
        Ok(select(&self.tables.read().await.tasks, spec))
    }

    async fn count_tasks(&self, filter: &Filter) -> Result<i64, StoreError> {
        Ok(count(&self.tables.read().await.tasks, filter))
    }

    async fn count_tasks_by_status(
        &self,
        filter: &Filter,
    ) -> Result<Vec<(TaskStatus, i64)>, StoreError> {
        Ok(group_count(&self.tables.read().await.tasks, filter, |t| t.status))
    }

    async fn count_tasks_by_priority(
        &self,
        filter: &Filter,
    ) -> Result<Vec<(TaskPriority, i64)>, StoreError> {
        Ok(group_count(&self.tables.read().await.tasks, filter, |t| t.priority))
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(task) = tables.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        let now = Utc::now();

        if let Some(title) = data.title {
            task.title = title;
        }
        if let Some(description) = data.description {
            task.description = description;
        }
        if let Some(assigned_to) = data.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(assigned_by) = data.assigned_by {
            task.assigned_by = assigned_by;
        }
        if let Some(status) = data.status {
            task.status = status;
            if task.completed_date.is_none() && status == TaskStatus::Completed {
                task.completed_date = Some(now);
            }
        }
        if let Some(priority) = data.priority {
            task.priority = priority;
        }
        if let Some(category) = data.category {
            task.category = category;
        }
        if let Some(due_date) = data.due_date {
            task.due_date = due_date;
        }
        if let Some(start_date) = data.start_date {
            task.start_date = start_date;
        }
        if let Some(tags) = data.tags {
            task.tags = tags;
        }
        if let Some(hours) = data.estimated_hours {
            task.estimated_hours = Some(hours);
        }
        if let Some(hours) = data.actual_hours {
            task.actual_hours = Some(hours);
        }
        task.updated_at = now;

        Ok(Some(task.clone()))
    }

    async fn soft_delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(task) = tables.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };

        if task.is_active {
            task.is_active = false;
            task.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn task_summaries(&self, ids: &[Uuid]) -> Result<Vec<TaskSummary>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .filter(|t| ids.contains(&t.id))
            .map(TaskSummary::from)
            .collect())
    }

    async fn insert_report(&self, data: CreateReport) -> Result<Report, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(task_id) = data.task_id {
            tables.require_task(task_id)?;
        }

        let now = Utc::now();
        let report = Report {
            id: Uuid::new_v4(),
            title: data.title,
            content: data.content,
            date: data.date.unwrap_or(now),
            author_id: data.author_id,
            task_id: data.task_id,
            status: data.status,
            category: data.category,
            tags: data.tags,
            approved_by: data.approved_by,
            approved_at: (data.status == ReportStatus::Approved).then_some(now),
            is_public: data.is_public,
            created_at: now,
            updated_at: now,
        };
        tables.reports.push(report.clone());
        Ok(report)
    }

    async fn find_report(&self, id: Uuid) -> Result<Option<Report>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.reports.iter().find(|r| r.id == id).cloned())
    }

    async fn list_reports(&self, spec: &QuerySpec) -> Result<Vec<Report>, StoreError> {
        Ok(select(&self.tables.read().await.reports, spec))
    }

    async fn count_reports(&self, filter: &Filter) -> Result<i64, StoreError> {
        Ok(count(&self.tables.read().await.reports, filter))
    }

    async fn update_report(
        &self,
        id: Uuid,
        data: UpdateReport,
    ) -> Result<Option<Report>, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(Some(task_id)) = data.task_id {
            tables.require_task(task_id)?;
        }

        let Some(report) = tables.reports.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        let now = Utc::now();

        if let Some(title) = data.title {
            report.title = title;
        }
        if let Some(content) = data.content {
            report.content = content;
        }
        if let Some(date) = data.date {
            report.date = date;
        }
        if let Some(task_id) = data.task_id {
            report.task_id = task_id;
        }
        if let Some(status) = data.status {
            report.status = status;
            if data.approved_at.is_none()
                && report.approved_at.is_none()
                && status == ReportStatus::Approved
            {
                report.approved_at = Some(now);
            }
        }
        if let Some(category) = data.category {
            report.category = category;
        }
        if let Some(tags) = data.tags {
            report.tags = tags;
        }
        if let Some(approved_by) = data.approved_by {
            report.approved_by = Some(approved_by);
        }
        if let Some(approved_at) = data.approved_at {
            report.approved_at = Some(approved_at);
        }
        if let Some(is_public) = data.is_public {
            report.is_public = is_public;
        }
        report.updated_at = now;

        Ok(Some(report.clone()))
    }

    async fn delete_report(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.reports.len();
        tables.reports.retain(|r| r.id != id);
        if tables.reports.len() == before {
            return Ok(false);
        }

        tables
            .comments
            .retain(|c| !(c.parent_kind == CommentParent::Report && c.parent_id == id));
        Ok(true)
    }

    async fn append_comment(&self, data: CreateComment) -> Result<Comment, StoreError> {
        let mut tables = self.tables.write().await;
        let comment = Comment {
            id: Uuid::new_v4(),
            parent_kind: data.parent_kind,
            parent_id: data.parent_id,
            user_id: data.user_id,
            content: data.content,
            created_at: Utc::now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(
        &self,
        parent_kind: CommentParent,
        parent_id: Uuid,
    ) -> Result<Vec<Comment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.parent_kind == parent_kind && c.parent_id == parent_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
