/// Task model and database operations
///
/// Tasks are created by admins and assigned to a single user. They are never
/// physically removed: deleting a task clears `is_active`, which hides it from
/// every listing, search and statistic.
///
/// `completed_date` is stamped once, by the database, the first time the task
/// enters `completed`. Later updates never move it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed', 'cancelled');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'urgent');
/// CREATE TYPE task_category AS ENUM (
///     'development', 'design', 'testing', 'documentation', 'meeting', 'other'
/// );
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description VARCHAR(1000) NOT NULL,
///     assigned_to UUID NOT NULL,
///     assigned_by UUID NOT NULL,
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     category task_category NOT NULL DEFAULT 'other',
///     due_date TIMESTAMPTZ NOT NULL,
///     start_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     completed_date TIMESTAMPTZ,
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     estimated_hours DOUBLE PRECISION CHECK (estimated_hours >= 0),
///     actual_hours DOUBLE PRECISION CHECK (actual_hours >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use dailyreport_shared::models::task::{CreateTaskRequest, Task};
/// use dailyreport_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let admin_id = Uuid::new_v4();
///
/// let request = CreateTaskRequest {
///     title: "Write release notes".to_string(),
///     description: "Summarize every change since 1.2".to_string(),
///     assigned_to: Some(Uuid::new_v4().to_string()),
///     due_date: Some("2025-06-30".to_string()),
///     ..Default::default()
/// };
///
/// let data = request.into_create(admin_id).map_err(|e| format!("{:?}", e))?;
/// let task = Task::create(&pool, data).await?;
/// Task::soft_delete(&pool, task.id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use super::comment::CommentView;
use super::user::UserSummary;
use super::Enumerated;
use crate::query::filter::{Field, Filter, Filterable, Value};
use crate::query::{sql, QuerySpec};
use crate::validation::{
    check_date, check_enum, check_tags, check_uuid, normalize_tags, run_derived, trim_in_place,
    FieldError,
};

/// Longest accepted task tag
pub const MAX_TAG_LEN: usize = 30;

const TASK_COLUMNS: &str = "id, title, description, assigned_to, assigned_by, status, priority, \
     category, due_date, start_date, completed_date, tags, is_active, estimated_hours, \
     actual_hours, created_at, updated_at";

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl Enumerated for TaskStatus {
    const TYPE_NAME: &'static str = "task_status";
    const ALL: &'static [Self] = &[
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

/// Task priority, lowest first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Enumerated for TaskPriority {
    const TYPE_NAME: &'static str = "task_priority";
    const ALL: &'static [Self] = &[
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Urgent,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

/// Kind of work a task represents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Development,
    Design,
    Testing,
    Documentation,
    Meeting,
    #[default]
    Other,
}

impl Enumerated for TaskCategory {
    const TYPE_NAME: &'static str = "task_category";
    const ALL: &'static [Self] = &[
        TaskCategory::Development,
        TaskCategory::Design,
        TaskCategory::Testing,
        TaskCategory::Documentation,
        TaskCategory::Meeting,
        TaskCategory::Other,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Development => "development",
            TaskCategory::Design => "design",
            TaskCategory::Testing => "testing",
            TaskCategory::Documentation => "documentation",
            TaskCategory::Meeting => "meeting",
            TaskCategory::Other => "other",
        }
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,

    /// User doing the work
    pub assigned_to: Uuid,

    /// Admin who created the task
    pub assigned_by: Uuid,

    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    pub due_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,

    /// Set once, on the first transition to `completed`
    pub completed_date: Option<DateTime<Utc>>,

    pub tags: Vec<String>,

    /// Cleared by soft delete
    pub is_active: bool,

    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Display projection used when a report links a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskSummary {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
        }
    }
}

/// Input for inserting a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub assigned_to: Uuid,
    pub assigned_by: Uuid,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    pub due_date: DateTime<Utc>,
    pub start_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
}

/// Input for updating a task; only `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<TaskCategory>,
    pub due_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
}

/// Task creation payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateTaskRequest {
    #[validate(length(min = 5, max = 200, message = "Title must be between 5 and 200 characters"))]
    pub title: String,

    #[validate(length(
        min = 10,
        max = 1000,
        message = "Description must be between 10 and 1000 characters"
    ))]
    pub description: String,

    #[serde(alias = "assignedTo")]
    pub assigned_to: Option<String>,

    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,

    #[serde(alias = "dueDate")]
    pub due_date: Option<String>,

    #[serde(alias = "startDate")]
    pub start_date: Option<String>,

    pub tags: Vec<String>,

    #[serde(alias = "estimatedHours")]
    #[validate(range(min = 0.0, message = "Estimated hours must be a positive number"))]
    pub estimated_hours: Option<f64>,

    #[serde(alias = "actualHours")]
    #[validate(range(min = 0.0, message = "Actual hours must be a positive number"))]
    pub actual_hours: Option<f64>,
}

impl CreateTaskRequest {
    /// Validates the payload and converts it into an insert for `assigned_by`
    pub fn into_create(mut self, assigned_by: Uuid) -> Result<CreateTask, Vec<FieldError>> {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.description);

        let mut errors = Vec::new();
        run_derived(&self, &mut errors);
        check_tags("tags", &trimmed(&self.tags), MAX_TAG_LEN, &mut errors);

        let assigned_to = check_uuid(
            "assigned_to",
            Some(self.assigned_to.as_deref().unwrap_or_default()),
            "Valid assigned user ID is required",
            &mut errors,
        );
        let status = check_enum::<TaskStatus>("status", self.status.as_deref(), &mut errors);
        let priority = check_enum::<TaskPriority>("priority", self.priority.as_deref(), &mut errors);
        let category = check_enum::<TaskCategory>("category", self.category.as_deref(), &mut errors);
        let due_date = check_date(
            "due_date",
            Some(self.due_date.as_deref().unwrap_or_default()),
            "Valid due date is required",
            &mut errors,
        );
        let start_date = check_date(
            "start_date",
            self.start_date.as_deref(),
            "Valid start date is required",
            &mut errors,
        );

        match (assigned_to, due_date) {
            (Some(assigned_to), Some(due_date)) if errors.is_empty() => Ok(CreateTask {
                title: self.title,
                description: self.description,
                assigned_to,
                assigned_by,
                status: status.unwrap_or_default(),
                priority: priority.unwrap_or_default(),
                category: category.unwrap_or_default(),
                due_date,
                start_date,
                tags: normalize_tags(self.tags),
                estimated_hours: self.estimated_hours,
                actual_hours: self.actual_hours,
            }),
            _ => Err(errors),
        }
    }
}

/// Task update payload; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 5, max = 200, message = "Title must be between 5 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(
        min = 10,
        max = 1000,
        message = "Description must be between 10 and 1000 characters"
    ))]
    pub description: Option<String>,

    #[serde(alias = "assignedTo")]
    pub assigned_to: Option<String>,

    #[serde(alias = "assignedBy")]
    pub assigned_by: Option<String>,

    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,

    #[serde(alias = "dueDate")]
    pub due_date: Option<String>,

    #[serde(alias = "startDate")]
    pub start_date: Option<String>,

    pub tags: Option<Vec<String>>,

    #[serde(alias = "estimatedHours")]
    #[validate(range(min = 0.0, message = "Estimated hours must be a positive number"))]
    pub estimated_hours: Option<f64>,

    #[serde(alias = "actualHours")]
    #[validate(range(min = 0.0, message = "Actual hours must be a positive number"))]
    pub actual_hours: Option<f64>,
}

impl UpdateTaskRequest {
    /// Removes every field `allowed` rejects, returning the removed names
    pub fn strip(&mut self, allowed: impl Fn(&str) -> bool) -> Vec<&'static str> {
        let payload = self;
        let mut stripped = Vec::new();
        strip_fields!(payload, allowed, stripped;
            title, description, assigned_to, assigned_by, status, priority, category,
            due_date, start_date, tags, estimated_hours, actual_hours);
        stripped
    }

    /// Validates the payload and converts it into a partial update
    pub fn into_update(mut self) -> Result<UpdateTask, Vec<FieldError>> {
        if let Some(title) = self.title.as_mut() {
            trim_in_place(title);
        }
        if let Some(description) = self.description.as_mut() {
            trim_in_place(description);
        }

        let mut errors = Vec::new();
        run_derived(&self, &mut errors);
        if let Some(tags) = &self.tags {
            check_tags("tags", &trimmed(tags), MAX_TAG_LEN, &mut errors);
        }

        let update = UpdateTask {
            assigned_to: check_uuid(
                "assigned_to",
                self.assigned_to.as_deref(),
                "Valid assigned user ID is required",
                &mut errors,
            ),
            assigned_by: check_uuid(
                "assigned_by",
                self.assigned_by.as_deref(),
                "Valid assigning user ID is required",
                &mut errors,
            ),
            status: check_enum("status", self.status.as_deref(), &mut errors),
            priority: check_enum("priority", self.priority.as_deref(), &mut errors),
            category: check_enum("category", self.category.as_deref(), &mut errors),
            due_date: check_date(
                "due_date",
                self.due_date.as_deref(),
                "Valid due date is required",
                &mut errors,
            ),
            start_date: check_date(
                "start_date",
                self.start_date.as_deref(),
                "Valid start date is required",
                &mut errors,
            ),
            title: self.title,
            description: self.description,
            tags: self.tags.map(normalize_tags),
            estimated_hours: self.estimated_hours,
            actual_hours: self.actual_hours,
        };

        if errors.is_empty() {
            Ok(update)
        } else {
            Err(errors)
        }
    }
}

fn trimmed(tags: &[String]) -> Vec<String> {
    tags.iter().map(|t| t.trim().to_string()).collect()
}

/// `true` when the task is not completed and its due date has passed
pub fn is_overdue(status: TaskStatus, due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status != TaskStatus::Completed && due_date < now
}

/// Whole days until the due date, rounded up; negative once past due
pub fn days_until_due(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (due_date - now).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) > 0 {
        days + 1
    } else {
        days
    }
}

/// Task as returned to callers, with references resolved and derived fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub assigned_to: Option<UserSummary>,
    pub assigned_by: Option<UserSummary>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    pub due_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub is_active: bool,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_overdue: bool,
    pub days_until_due: i64,
    pub formatted_due_date: String,

    /// Present on single-task reads only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentView>>,
}

impl TaskView {
    pub fn new(
        task: Task,
        assigned_to: Option<UserSummary>,
        assigned_by: Option<UserSummary>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            is_overdue: is_overdue(task.status, task.due_date, now),
            days_until_due: days_until_due(task.due_date, now),
            formatted_due_date: task.due_date.format("%Y-%m-%d").to_string(),
            id: task.id,
            title: task.title,
            description: task.description,
            assigned_to,
            assigned_by,
            status: task.status,
            priority: task.priority,
            category: task.category,
            due_date: task.due_date,
            start_date: task.start_date,
            completed_date: task.completed_date,
            tags: task.tags,
            is_active: task.is_active,
            estimated_hours: task.estimated_hours,
            actual_hours: task.actual_hours,
            created_at: task.created_at,
            updated_at: task.updated_at,
            comments: None,
        }
    }

    pub fn with_comments(mut self, comments: Vec<CommentView>) -> Self {
        self.comments = Some(comments);
        self
    }
}

/// Compact task entry for search results and the task picker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskBrief {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    pub due_date: DateTime<Utc>,
    pub is_overdue: bool,
    pub days_until_due: i64,
}

impl TaskBrief {
    pub fn new(task: Task, now: DateTime<Utc>) -> Self {
        Self {
            is_overdue: is_overdue(task.status, task.due_date, now),
            days_until_due: days_until_due(task.due_date, now),
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            category: task.category,
            due_date: task.due_date,
        }
    }
}

/// Count of tasks sharing one value of a grouped field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount<T> {
    pub value: T,
    pub count: i64,
}

/// Aggregate statistics over the caller's visible tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: i64,
    pub by_status: Vec<GroupCount<TaskStatus>>,
    pub by_priority: Vec<GroupCount<TaskPriority>>,
    pub overdue_count: i64,
}

/// Expands raw group counts to one entry per variant, in declaration order
pub fn complete_counts<T: Enumerated + PartialEq>(raw: &[(T, i64)]) -> Vec<GroupCount<T>> {
    T::ALL
        .iter()
        .map(|value| GroupCount {
            value: *value,
            count: raw
                .iter()
                .filter(|(v, _)| v == value)
                .map(|(_, c)| *c)
                .sum(),
        })
        .collect()
}

impl Filterable for Task {
    fn value_of(&self, field: Field) -> Option<Value> {
        match field {
            Field::Id => Some(Value::Uuid(self.id)),
            Field::Title => Some(Value::Text(self.title.clone())),
            Field::Description => Some(Value::Text(self.description.clone())),
            Field::AssignedTo => Some(Value::Uuid(self.assigned_to)),
            Field::AssignedBy => Some(Value::Uuid(self.assigned_by)),
            Field::Status => Some(Value::of(self.status)),
            Field::Priority => Some(Value::of(self.priority)),
            Field::Category => Some(Value::of(self.category)),
            Field::DueDate => Some(Value::Time(self.due_date)),
            Field::IsActive => Some(Value::Bool(self.is_active)),
            Field::CreatedAt => Some(Value::Time(self.created_at)),
            Field::UpdatedAt => Some(Value::Time(self.updated_at)),
            _ => None,
        }
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Task {
    /// Creates a new task
    ///
    /// A task created directly in `completed` gets its `completed_date` now.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (
                title, description, assigned_to, assigned_by, status, priority, category,
                due_date, start_date, completed_date, tags, estimated_hours, actual_hours
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, NOW()),
                CASE WHEN $5 = 'completed'::task_status THEN NOW() END,
                $10, $11, $12
            )
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.assigned_to)
            .bind(data.assigned_by)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.category)
            .bind(data.due_date)
            .bind(data.start_date)
            .bind(data.tags)
            .bind(data.estimated_hours)
            .bind(data.actual_hours)
            .fetch_one(pool)
            .await
    }

    /// Finds a task by ID, active or not
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists tasks matching a query
    pub async fn list(pool: &PgPool, spec: &QuerySpec) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM tasks", TASK_COLUMNS));
        sql::push_query(&mut qb, spec);

        qb.build_query_as::<Task>().fetch_all(pool).await
    }

    /// Counts tasks matching a filter
    pub async fn count(pool: &PgPool, filter: &Filter) -> Result<i64, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM tasks");
        sql::push_where(&mut qb, filter);

        let (count,): (i64,) = qb.build_query_as().fetch_one(pool).await?;
        Ok(count)
    }

    /// Counts tasks matching a filter, grouped by status
    pub async fn count_by_status(
        pool: &PgPool,
        filter: &Filter,
    ) -> Result<Vec<(TaskStatus, i64)>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT status, COUNT(*) FROM tasks");
        sql::push_where(&mut qb, filter);
        qb.push(" GROUP BY status");

        qb.build_query_as().fetch_all(pool).await
    }

    /// Counts tasks matching a filter, grouped by priority
    pub async fn count_by_priority(
        pool: &PgPool,
        filter: &Filter,
    ) -> Result<Vec<(TaskPriority, i64)>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT priority, COUNT(*) FROM tasks");
        sql::push_where(&mut qb, filter);
        qb.push(" GROUP BY priority");

        qb.build_query_as().fetch_all(pool).await
    }

    /// Resolves display projections for a set of task IDs
    pub async fn summaries(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<TaskSummary>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, TaskSummary>(
            "SELECT id, title, status, priority, due_date FROM tasks WHERE id = ANY($1)",
        )
        .bind(ids.to_vec())
        .fetch_all(pool)
        .await
    }

    /// Updates an existing task
    ///
    /// Only `Some` fields are written. When `status` is written,
    /// `completed_date` is stamped in the same statement if it is still unset
    /// and the new status is `completed`. Returns `None` when the task does
    /// not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }
        if data.assigned_by.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_by = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                ", status = ${0}, completed_date = CASE \
                 WHEN completed_date IS NULL AND ${0} = 'completed'::task_status THEN NOW() \
                 ELSE completed_date END",
                bind_count
            ));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.category.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.start_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", start_date = ${}", bind_count));
        }
        if data.tags.is_some() {
            bind_count += 1;
            query.push_str(&format!(", tags = ${}", bind_count));
        }
        if data.estimated_hours.is_some() {
            bind_count += 1;
            query.push_str(&format!(", estimated_hours = ${}", bind_count));
        }
        if data.actual_hours.is_some() {
            bind_count += 1;
            query.push_str(&format!(", actual_hours = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", TASK_COLUMNS));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(assigned_by) = data.assigned_by {
            q = q.bind(assigned_by);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(category) = data.category {
            q = q.bind(category);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(tags) = data.tags {
            q = q.bind(tags);
        }
        if let Some(estimated_hours) = data.estimated_hours {
            q = q.bind(estimated_hours);
        }
        if let Some(actual_hours) = data.actual_hours {
            q = q.bind(actual_hours);
        }

        q.fetch_optional(pool).await
    }

    /// Marks a task inactive
    ///
    /// Returns `false` when the task does not exist. Deleting an inactive task
    /// again succeeds and changes nothing.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET is_active = FALSE, \
             updated_at = CASE WHEN is_active THEN NOW() ELSE updated_at END \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
