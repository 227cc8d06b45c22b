/// Report model and database operations
///
/// Reports are written by any user, optionally linked to a task, and moved
/// through `draft → submitted → approved | rejected` by their author and by
/// admins. Deleting a report removes the row.
///
/// `approved_at` is stamped once, by the database, the first time the report
/// enters `approved`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE report_status AS ENUM ('draft', 'submitted', 'approved', 'rejected');
/// CREATE TYPE report_category AS ENUM ('daily', 'weekly', 'monthly', 'project', 'other');
///
/// CREATE TABLE reports (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(100) NOT NULL,
///     content VARCHAR(2000) NOT NULL,
///     date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     author_id UUID NOT NULL,
///     task_id UUID REFERENCES tasks(id) ON DELETE SET NULL,
///     status report_status NOT NULL DEFAULT 'draft',
///     category report_category NOT NULL DEFAULT 'daily',
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     approved_by UUID,
///     approved_at TIMESTAMPTZ,
///     is_public BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use super::comment::CommentView;
use super::task::TaskSummary;
use super::user::UserSummary;
use super::Enumerated;
use crate::query::filter::{Field, Filter, Filterable, Value};
use crate::query::{sql, QuerySpec};
use crate::validation::{
    check_date, check_enum, check_tags, check_uuid, normalize_tags, run_derived, trim_in_place,
    FieldError,
};

/// Longest accepted report tag
pub const MAX_TAG_LEN: usize = 20;

const REPORT_COLUMNS: &str = "id, title, content, \"date\", author_id, task_id, status, category, \
     tags, approved_by, approved_at, is_public, created_at, updated_at";

/// Report review status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl Enumerated for ReportStatus {
    const TYPE_NAME: &'static str = "report_status";
    const ALL: &'static [Self] = &[
        ReportStatus::Draft,
        ReportStatus::Submitted,
        ReportStatus::Approved,
        ReportStatus::Rejected,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Draft => "draft",
            ReportStatus::Submitted => "submitted",
            ReportStatus::Approved => "approved",
            ReportStatus::Rejected => "rejected",
        }
    }
}

impl ReportStatus {
    /// Statuses only an admin may assign
    pub fn is_review_outcome(&self) -> bool {
        matches!(self, ReportStatus::Approved | ReportStatus::Rejected)
    }
}

/// Reporting period or subject
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportCategory {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Project,
    Other,
}

impl Enumerated for ReportCategory {
    const TYPE_NAME: &'static str = "report_category";
    const ALL: &'static [Self] = &[
        ReportCategory::Daily,
        ReportCategory::Weekly,
        ReportCategory::Monthly,
        ReportCategory::Project,
        ReportCategory::Other,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::Daily => "daily",
            ReportCategory::Weekly => "weekly",
            ReportCategory::Monthly => "monthly",
            ReportCategory::Project => "project",
            ReportCategory::Other => "other",
        }
    }
}

/// Report record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub content: String,

    /// Day the report covers
    pub date: DateTime<Utc>,

    pub author_id: Uuid,

    /// Linked task, if any
    pub task_id: Option<Uuid>,

    pub status: ReportStatus,
    pub category: ReportCategory,
    pub tags: Vec<String>,
    pub approved_by: Option<Uuid>,

    /// Set once, on the first transition to `approved`
    pub approved_at: Option<DateTime<Utc>>,

    /// Public reports are readable by every user
    pub is_public: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a report
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub title: String,
    pub content: String,
    pub date: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub task_id: Option<Uuid>,
    pub status: ReportStatus,
    pub category: ReportCategory,
    pub tags: Vec<String>,
    pub approved_by: Option<Uuid>,
    pub is_public: bool,
}

/// Input for updating a report; only `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// `Some(None)` unlinks the task
    pub task_id: Option<Option<Uuid>>,
    pub status: Option<ReportStatus>,
    pub category: Option<ReportCategory>,
    pub tags: Option<Vec<String>>,
    pub approved_by: Option<Uuid>,
    /// Explicit approval time; when absent the database stamps it on approval
    pub approved_at: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
}

/// Report creation payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateReportRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "Content must be between 1 and 2000 characters"
    ))]
    pub content: String,

    pub date: Option<String>,

    /// ID of the task this report covers
    pub task: Option<String>,

    pub status: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,

    #[serde(alias = "isPublic")]
    pub is_public: Option<bool>,
}

impl CreateReportRequest {
    /// Validates the payload and converts it into an insert for `author_id`
    pub fn into_create(mut self, author_id: Uuid) -> Result<CreateReport, Vec<FieldError>> {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.content);

        let mut errors = Vec::new();
        run_derived(&self, &mut errors);
        check_tags("tags", &trimmed(&self.tags), MAX_TAG_LEN, &mut errors);

        let date = check_date("date", self.date.as_deref(), "Valid date is required", &mut errors);
        let task_id = check_uuid("task", self.task.as_deref(), "Invalid task ID", &mut errors);
        let status = check_enum::<ReportStatus>("status", self.status.as_deref(), &mut errors);
        let category = check_enum::<ReportCategory>("category", self.category.as_deref(), &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CreateReport {
            title: self.title,
            content: self.content,
            date,
            author_id,
            task_id,
            status: status.unwrap_or_default(),
            category: category.unwrap_or_default(),
            tags: normalize_tags(self.tags),
            approved_by: None,
            is_public: self.is_public.unwrap_or(false),
        })
    }
}

/// Report update payload; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateReportRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: Option<String>,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "Content must be between 1 and 2000 characters"
    ))]
    pub content: Option<String>,

    pub date: Option<String>,

    /// Task ID to link, or `null` to unlink
    #[serde(deserialize_with = "super::double_option")]
    pub task: Option<Option<String>>,

    pub status: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,

    #[serde(alias = "isPublic")]
    pub is_public: Option<bool>,

    #[serde(alias = "approvedBy")]
    pub approved_by: Option<String>,

    #[serde(alias = "approvedAt")]
    pub approved_at: Option<String>,
}

impl UpdateReportRequest {
    /// Removes every field `allowed` rejects, returning the removed names
    pub fn strip(&mut self, allowed: impl Fn(&str) -> bool) -> Vec<&'static str> {
        let payload = self;
        let mut stripped = Vec::new();
        strip_fields!(payload, allowed, stripped;
            title, content, date, task, status, category, tags, is_public,
            approved_by, approved_at);
        stripped
    }

    /// Validates the payload and converts it into a partial update
    pub fn into_update(mut self) -> Result<UpdateReport, Vec<FieldError>> {
        if let Some(title) = self.title.as_mut() {
            trim_in_place(title);
        }
        if let Some(content) = self.content.as_mut() {
            trim_in_place(content);
        }

        let mut errors = Vec::new();
        run_derived(&self, &mut errors);
        if let Some(tags) = &self.tags {
            check_tags("tags", &trimmed(tags), MAX_TAG_LEN, &mut errors);
        }

        let update = UpdateReport {
            date: check_date("date", self.date.as_deref(), "Valid date is required", &mut errors),
            task_id: match self.task.as_ref() {
                None => None,
                Some(None) => Some(None),
                Some(Some(raw)) => {
                    check_uuid("task", Some(raw), "Invalid task ID", &mut errors).map(Some)
                }
            },
            status: check_enum("status", self.status.as_deref(), &mut errors),
            category: check_enum("category", self.category.as_deref(), &mut errors),
            approved_by: check_uuid(
                "approved_by",
                self.approved_by.as_deref(),
                "Invalid approver ID",
                &mut errors,
            ),
            approved_at: check_date(
                "approved_at",
                self.approved_at.as_deref(),
                "Valid approval date is required",
                &mut errors,
            ),
            title: self.title,
            content: self.content,
            tags: self.tags.map(normalize_tags),
            is_public: self.is_public,
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

/// Report as returned to callers, with references resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub formatted_date: String,
    pub author: Option<UserSummary>,
    pub task: Option<TaskSummary>,
    pub status: ReportStatus,
    pub category: ReportCategory,
    pub tags: Vec<String>,
    pub approved_by: Option<UserSummary>,
    pub approved_at: Option<DateTime<Utc>>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Present on single-report reads only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentView>>,
}

impl ReportView {
    pub fn new(
        report: Report,
        author: Option<UserSummary>,
        task: Option<TaskSummary>,
        approved_by: Option<UserSummary>,
    ) -> Self {
        Self {
            formatted_date: report.date.format("%Y-%m-%d").to_string(),
            id: report.id,
            title: report.title,
            content: report.content,
            date: report.date,
            author,
            task,
            status: report.status,
            category: report.category,
            tags: report.tags,
            approved_by,
            approved_at: report.approved_at,
            is_public: report.is_public,
            created_at: report.created_at,
            updated_at: report.updated_at,
            comments: None,
        }
    }

    pub fn with_comments(mut self, comments: Vec<CommentView>) -> Self {
        self.comments = Some(comments);
        self
    }
}

impl Filterable for Report {
    fn value_of(&self, field: Field) -> Option<Value> {
        match field {
            Field::Id => Some(Value::Uuid(self.id)),
            Field::Title => Some(Value::Text(self.title.clone())),
            Field::Content => Some(Value::Text(self.content.clone())),
            Field::Date => Some(Value::Time(self.date)),
            Field::Author => Some(Value::Uuid(self.author_id)),
            Field::Task => self.task_id.map(Value::Uuid),
            Field::Status => Some(Value::of(self.status)),
            Field::Category => Some(Value::of(self.category)),
            Field::ApprovedBy => self.approved_by.map(Value::Uuid),
            Field::ApprovedAt => self.approved_at.map(Value::Time),
            Field::IsPublic => Some(Value::Bool(self.is_public)),
            Field::CreatedAt => Some(Value::Time(self.created_at)),
            Field::UpdatedAt => Some(Value::Time(self.updated_at)),
            _ => None,
        }
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Report {
    /// Creates a new report
    ///
    /// A report created directly in `approved` gets its `approved_at` now.
    pub async fn create(pool: &PgPool, data: CreateReport) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO reports (
                title, content, "date", author_id, task_id, status, category, tags,
                approved_by, approved_at, is_public
            )
            VALUES (
                $1, $2, COALESCE($3, NOW()), $4, $5, $6, $7, $8, $9,
                CASE WHEN $6 = 'approved'::report_status THEN NOW() END,
                $10
            )
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );

        sqlx::query_as::<_, Report>(&query)
            .bind(data.title)
            .bind(data.content)
            .bind(data.date)
            .bind(data.author_id)
            .bind(data.task_id)
            .bind(data.status)
            .bind(data.category)
            .bind(data.tags)
            .bind(data.approved_by)
            .bind(data.is_public)
            .fetch_one(pool)
            .await
    }

    /// Finds a report by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM reports WHERE id = $1", REPORT_COLUMNS);

        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists reports matching a query
    pub async fn list(pool: &PgPool, spec: &QuerySpec) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM reports", REPORT_COLUMNS));
        sql::push_query(&mut qb, spec);

        qb.build_query_as::<Report>().fetch_all(pool).await
    }

    /// Counts reports matching a filter
    pub async fn count(pool: &PgPool, filter: &Filter) -> Result<i64, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM reports");
        sql::push_where(&mut qb, filter);

        let (count,): (i64,) = qb.build_query_as().fetch_one(pool).await?;
        Ok(count)
    }

    /// Updates an existing report
    ///
    /// Only `Some` fields are written. Unless an explicit `approved_at` is
    /// given, writing `status` stamps `approved_at` in the same statement when
    /// it is still unset and the new status is `approved`. Returns `None` when
    /// the report does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateReport,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE reports SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.content.is_some() {
            bind_count += 1;
            query.push_str(&format!(", content = ${}", bind_count));
        }
        if data.date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", \"date\" = ${}", bind_count));
        }
        if data.task_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", task_id = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
            if data.approved_at.is_none() {
                query.push_str(&format!(
                    ", approved_at = CASE \
                     WHEN approved_at IS NULL AND ${} = 'approved'::report_status THEN NOW() \
                     ELSE approved_at END",
                    bind_count
                ));
            }
        }
        if data.category.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category = ${}", bind_count));
        }
        if data.tags.is_some() {
            bind_count += 1;
            query.push_str(&format!(", tags = ${}", bind_count));
        }
        if data.approved_by.is_some() {
            bind_count += 1;
            query.push_str(&format!(", approved_by = ${}", bind_count));
        }
        if data.approved_at.is_some() {
            bind_count += 1;
            query.push_str(&format!(", approved_at = ${}", bind_count));
        }
        if data.is_public.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_public = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", REPORT_COLUMNS));

        let mut q = sqlx::query_as::<_, Report>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(content) = data.content {
            q = q.bind(content);
        }
        if let Some(date) = data.date {
            q = q.bind(date);
        }
        if let Some(task_id) = data.task_id {
            q = q.bind(task_id);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(category) = data.category {
            q = q.bind(category);
        }
        if let Some(tags) = data.tags {
            q = q.bind(tags);
        }
        if let Some(approved_by) = data.approved_by {
            q = q.bind(approved_by);
        }
        if let Some(approved_at) = data.approved_at {
            q = q.bind(approved_at);
        }
        if let Some(is_public) = data.is_public {
            q = q.bind(is_public);
        }

        q.fetch_optional(pool).await
    }

    /// Permanently deletes a report and its comments
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE parent_kind = 'report' AND parent_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}
