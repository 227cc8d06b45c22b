/// Role-scoped query construction
///
/// Each `build_*` function takes the caller's identity and the raw query
/// parameters of one list operation and returns a [`QuerySpec`]. The scope
/// clause derived from the identity always comes first and is combined with
/// caller filters by conjunction only, so no parameter can widen it.
///
/// Parameters arrive as raw strings. Every malformed value is reported as a
/// [`FieldError`]; parsing does not stop at the first failure.
///
/// | Resource | Caller | Scope |
/// |----------|--------|-------|
/// | Task | user | `assigned_to = caller AND is_active` |
/// | Task | admin | `is_active` |
/// | Report | user | `author = caller OR is_public` |
/// | Report | admin | none |

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::filter::{Field, Filter, Value};
use super::{QuerySpec, SortKey, SortOrder, DEFAULT_LIMIT, MAX_LIMIT};
use crate::auth::middleware::AuthContext;
use crate::models::report::{ReportCategory, ReportStatus};
use crate::models::task::{TaskCategory, TaskPriority, TaskStatus};
use crate::models::user::Role;
use crate::models::Enumerated;
use crate::validation::{check_date, check_enum, check_uuid, FieldError};

/// Default page size for task search
pub const SEARCH_LIMIT: i64 = 20;

/// Default page size for the caller's task picker
pub const MY_TASKS_LIMIT: i64 = 50;

/// Minimum length of a task search query
pub const MIN_SEARCH_LEN: usize = 2;

/// Maximum length of a user search term
pub const MAX_USER_SEARCH_LEN: usize = 50;

const REPORT_SORT_FIELDS: &[(&str, Field)] = &[
    ("date", Field::Date),
    ("title", Field::Title),
    ("status", Field::Status),
    ("createdAt", Field::CreatedAt),
    ("created_at", Field::CreatedAt),
];

const TASK_SORT_FIELDS: &[(&str, Field)] = &[
    ("title", Field::Title),
    ("status", Field::Status),
    ("priority", Field::Priority),
    ("dueDate", Field::DueDate),
    ("due_date", Field::DueDate),
    ("createdAt", Field::CreatedAt),
    ("created_at", Field::CreatedAt),
    ("updatedAt", Field::UpdatedAt),
    ("updated_at", Field::UpdatedAt),
];

const USER_SORT_FIELDS: &[(&str, Field)] = &[
    ("name", Field::Name),
    ("email", Field::Email),
    ("role", Field::Role),
    ("createdAt", Field::CreatedAt),
    ("created_at", Field::CreatedAt),
];

/// Query parameters of `GET /api/reports`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    #[serde(alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(alias = "endDate")]
    pub end_date: Option<String>,
    pub search: Option<String>,
    #[serde(alias = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(alias = "sortOrder")]
    pub sort_order: Option<String>,
}

/// Query parameters of `GET /api/tasks`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "assignedTo")]
    pub assigned_to: Option<String>,
    #[serde(alias = "assignedBy")]
    pub assigned_by: Option<String>,
    pub search: Option<String>,
    #[serde(alias = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(alias = "sortOrder")]
    pub sort_order: Option<String>,
}

/// Query parameters of `GET /api/reports/user/:user_id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserReportParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
}

/// Query parameters of `GET /api/tasks/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskSearchParams {
    pub q: Option<String>,
    /// Comma-separated statuses, defaults to `pending,in_progress`
    pub status: Option<String>,
    pub limit: Option<String>,
}

/// Query parameters of `GET /api/tasks/my-tasks`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MyTasksParams {
    pub limit: Option<String>,
}

/// Query parameters of `GET /api/users`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub role: Option<String>,
    #[serde(alias = "isActive")]
    pub is_active: Option<String>,
    pub search: Option<String>,
    #[serde(alias = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(alias = "sortOrder")]
    pub sort_order: Option<String>,
}

/// Accumulates field errors while parsing raw parameters
#[derive(Default)]
struct Parser {
    errors: Vec<FieldError>,
}

impl Parser {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn page(&mut self, raw: Option<&str>) -> i64 {
        match present(raw) {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(page) if page >= 1 => page,
                _ => {
                    self.fail("page", "Page must be a positive integer");
                    1
                }
            },
        }
    }

    fn limit(&mut self, raw: Option<&str>, default: i64) -> i64 {
        match present(raw) {
            None => default,
            Some(raw) => match raw.parse::<i64>() {
                Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => limit,
                _ => {
                    self.fail("limit", format!("Limit must be between 1 and {}", MAX_LIMIT));
                    default
                }
            },
        }
    }

    fn enumerated<T: Enumerated>(&mut self, field: &str, raw: Option<&str>) -> Option<T> {
        check_enum(field, present(raw), &mut self.errors)
    }

    fn uuid(&mut self, field: &str, raw: Option<&str>) -> Option<Uuid> {
        check_uuid(field, present(raw), &format!("Invalid {} ID", field), &mut self.errors)
    }

    fn date(&mut self, field: &str, raw: Option<&str>) -> Option<DateTime<Utc>> {
        check_date(field, present(raw), "Must be an ISO 8601 date", &mut self.errors)
    }

    fn flag(&mut self, field: &str, raw: Option<&str>) -> Option<bool> {
        match present(raw)? {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                self.fail(field, "Must be true or false");
                None
            }
        }
    }

    fn sort(
        &mut self,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
        allowed: &[(&str, Field)],
        default: Field,
    ) -> SortKey {
        let field = match present(sort_by) {
            None => default,
            Some(raw) => match allowed.iter().find(|(name, _)| *name == raw) {
                Some((_, field)) => *field,
                None => {
                    self.fail("sort_by", "Invalid sort field");
                    default
                }
            },
        };

        let order = match present(sort_order) {
            None | Some("desc") => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some(_) => {
                self.fail("sort_order", "Sort order must be asc or desc");
                SortOrder::Desc
            }
        };

        SortKey { field, order }
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

/// Treats missing and blank parameters alike
fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn window(filter: Filter, sort: Vec<SortKey>, page: i64, limit: i64) -> QuerySpec {
    QuerySpec {
        filter,
        sort,
        skip: (page - 1).saturating_mul(limit),
        limit,
        page,
    }
}

fn search_clause(fields: &[Field], term: &str) -> Filter {
    Filter::Or(
        fields
            .iter()
            .map(|field| Filter::Contains(*field, term.to_string()))
            .collect(),
    )
}

/// Visibility scope of reports for a caller
pub fn report_scope(auth: &AuthContext) -> Filter {
    if auth.is_admin() {
        return Filter::All;
    }

    Filter::Or(vec![
        Filter::Eq(Field::Author, Value::Uuid(auth.user_id)),
        Filter::Eq(Field::IsPublic, Value::Bool(true)),
    ])
}

/// Visibility scope of tasks for a caller; soft-deleted tasks are never visible
pub fn task_scope(auth: &AuthContext) -> Filter {
    let active = Filter::Eq(Field::IsActive, Value::Bool(true));
    if auth.is_admin() {
        return active;
    }

    Filter::And(vec![
        Filter::Eq(Field::AssignedTo, Value::Uuid(auth.user_id)),
        active,
    ])
}

/// Open tasks in the caller's scope that are past due at `now`
pub fn overdue_filter(auth: &AuthContext, now: DateTime<Utc>) -> Filter {
    Filter::and(vec![
        task_scope(auth),
        Filter::NotIn(
            Field::Status,
            vec![
                Value::of(TaskStatus::Completed),
                Value::of(TaskStatus::Cancelled),
            ],
        ),
        Filter::Lt(Field::DueDate, Value::Time(now)),
    ])
}

/// Builds the query for listing reports
pub fn build_report_query(
    auth: &AuthContext,
    params: &ReportListParams,
) -> Result<QuerySpec, Vec<FieldError>> {
    let mut p = Parser::default();
    let page = p.page(params.page.as_deref());
    let limit = p.limit(params.limit.as_deref(), DEFAULT_LIMIT);
    let status = p.enumerated::<ReportStatus>("status", params.status.as_deref());
    let category = p.enumerated::<ReportCategory>("category", params.category.as_deref());
    let author = if auth.is_admin() {
        p.uuid("author", params.author.as_deref())
    } else {
        None
    };
    let start = p.date("start_date", params.start_date.as_deref());
    let end = p.date("end_date", params.end_date.as_deref());
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            p.fail("end_date", "End date must not be before start date");
        }
    }
    let sort = p.sort(
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
        REPORT_SORT_FIELDS,
        Field::Date,
    );

    let mut clauses = vec![report_scope(auth)];
    if let Some(status) = status {
        clauses.push(Filter::Eq(Field::Status, Value::of(status)));
    }
    if let Some(category) = category {
        clauses.push(Filter::Eq(Field::Category, Value::of(category)));
    }
    if let Some(author) = author {
        clauses.push(Filter::Eq(Field::Author, Value::Uuid(author)));
    }
    if let Some(start) = start {
        clauses.push(Filter::Gte(Field::Date, Value::Time(start)));
    }
    if let Some(end) = end {
        clauses.push(Filter::Lte(Field::Date, Value::Time(end)));
    }
    if let Some(term) = present(params.search.as_deref()) {
        clauses.push(search_clause(&[Field::Title, Field::Content, Field::Tags], term));
    }

    p.finish(window(Filter::and(clauses), vec![sort], page, limit))
}

/// Builds the query for one user's reports
///
/// The caller must already be authorized to see `user_id`'s reports.
pub fn build_user_reports_query(
    user_id: Uuid,
    params: &UserReportParams,
) -> Result<QuerySpec, Vec<FieldError>> {
    let mut p = Parser::default();
    let page = p.page(params.page.as_deref());
    let limit = p.limit(params.limit.as_deref(), DEFAULT_LIMIT);
    let status = p.enumerated::<ReportStatus>("status", params.status.as_deref());
    let category = p.enumerated::<ReportCategory>("category", params.category.as_deref());

    let mut clauses = vec![Filter::Eq(Field::Author, Value::Uuid(user_id))];
    if let Some(status) = status {
        clauses.push(Filter::Eq(Field::Status, Value::of(status)));
    }
    if let Some(category) = category {
        clauses.push(Filter::Eq(Field::Category, Value::of(category)));
    }

    p.finish(window(
        Filter::and(clauses),
        vec![SortKey::desc(Field::Date)],
        page,
        limit,
    ))
}

/// Builds the query for listing tasks
pub fn build_task_query(
    auth: &AuthContext,
    params: &TaskListParams,
) -> Result<QuerySpec, Vec<FieldError>> {
    let mut p = Parser::default();
    let page = p.page(params.page.as_deref());
    let limit = p.limit(params.limit.as_deref(), DEFAULT_LIMIT);
    let status = p.enumerated::<TaskStatus>("status", params.status.as_deref());
    let priority = p.enumerated::<TaskPriority>("priority", params.priority.as_deref());
    let category = p.enumerated::<TaskCategory>("category", params.category.as_deref());
    let (assigned_to, assigned_by) = if auth.is_admin() {
        (
            p.uuid("assigned_to", params.assigned_to.as_deref()),
            p.uuid("assigned_by", params.assigned_by.as_deref()),
        )
    } else {
        (None, None)
    };
    let sort = p.sort(
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
        TASK_SORT_FIELDS,
        Field::CreatedAt,
    );

    let mut clauses = vec![task_scope(auth)];
    if let Some(status) = status {
        clauses.push(Filter::Eq(Field::Status, Value::of(status)));
    }
    if let Some(priority) = priority {
        clauses.push(Filter::Eq(Field::Priority, Value::of(priority)));
    }
    if let Some(category) = category {
        clauses.push(Filter::Eq(Field::Category, Value::of(category)));
    }
    if let Some(id) = assigned_to {
        clauses.push(Filter::Eq(Field::AssignedTo, Value::Uuid(id)));
    }
    if let Some(id) = assigned_by {
        clauses.push(Filter::Eq(Field::AssignedBy, Value::Uuid(id)));
    }
    if let Some(term) = present(params.search.as_deref()) {
        clauses.push(search_clause(
            &[Field::Title, Field::Description, Field::Tags],
            term,
        ));
    }

    p.finish(window(Filter::and(clauses), vec![sort], page, limit))
}

fn picker_sort() -> Vec<SortKey> {
    vec![SortKey::asc(Field::DueDate), SortKey::desc(Field::Priority)]
}

/// Builds the query for searching the caller's own tasks
pub fn build_task_search(
    auth: &AuthContext,
    params: &TaskSearchParams,
) -> Result<QuerySpec, Vec<FieldError>> {
    let mut p = Parser::default();

    let term = params.q.as_deref().map(str::trim).unwrap_or_default();
    if term.chars().count() < MIN_SEARCH_LEN {
        p.fail(
            "q",
            format!("Search query must be at least {} characters", MIN_SEARCH_LEN),
        );
    }

    let statuses = match present(params.status.as_deref()) {
        None => vec![TaskStatus::Pending, TaskStatus::InProgress],
        Some(raw) => raw
            .split(',')
            .filter_map(|s| p.enumerated::<TaskStatus>("status", Some(s)))
            .collect(),
    };
    let limit = p.limit(params.limit.as_deref(), SEARCH_LIMIT);

    let filter = Filter::And(vec![
        Filter::Eq(Field::AssignedTo, Value::Uuid(auth.user_id)),
        Filter::Eq(Field::IsActive, Value::Bool(true)),
        Filter::In(Field::Status, statuses.into_iter().map(Value::of).collect()),
        search_clause(&[Field::Title, Field::Description], term),
    ]);

    p.finish(QuerySpec::first(filter, picker_sort(), limit))
}

/// Builds the query for the caller's own active tasks, any status
pub fn build_my_tasks(
    auth: &AuthContext,
    params: &MyTasksParams,
) -> Result<QuerySpec, Vec<FieldError>> {
    let mut p = Parser::default();
    let limit = p.limit(params.limit.as_deref(), MY_TASKS_LIMIT);

    let filter = Filter::And(vec![
        Filter::Eq(Field::AssignedTo, Value::Uuid(auth.user_id)),
        Filter::Eq(Field::IsActive, Value::Bool(true)),
    ]);

    p.finish(QuerySpec::first(filter, picker_sort(), limit))
}

/// Builds the query for the admin user listing
pub fn build_user_query(params: &UserListParams) -> Result<QuerySpec, Vec<FieldError>> {
    let mut p = Parser::default();
    let page = p.page(params.page.as_deref());
    let limit = p.limit(params.limit.as_deref(), DEFAULT_LIMIT);
    let role = p.enumerated::<Role>("role", params.role.as_deref());
    let is_active = p.flag("is_active", params.is_active.as_deref());
    let search = present(params.search.as_deref());
    if let Some(term) = search {
        if term.chars().count() > MAX_USER_SEARCH_LEN {
            p.fail(
                "search",
                format!("Search term must be between 1 and {} characters", MAX_USER_SEARCH_LEN),
            );
        }
    }
    let sort = p.sort(
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
        USER_SORT_FIELDS,
        Field::CreatedAt,
    );

    let mut clauses = Vec::new();
    if let Some(role) = role {
        clauses.push(Filter::Eq(Field::Role, Value::of(role)));
    }
    if let Some(is_active) = is_active {
        clauses.push(Filter::Eq(Field::IsActive, Value::Bool(is_active)));
    }
    if let Some(term) = search {
        clauses.push(search_clause(&[Field::Name, Field::Email], term));
    }

    p.finish(window(Filter::and(clauses), vec![sort], page, limit))
}
