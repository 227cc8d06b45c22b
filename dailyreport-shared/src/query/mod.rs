/// Query shaping for list operations
///
/// The filter builder turns an identity plus raw query parameters into a
/// [`QuerySpec`]: a predicate tree, a sort specification and a `{skip, limit}`
/// window. The same spec is rendered to SQL by the PostgreSQL store and
/// evaluated in process by the in-memory store.
///
/// # Modules
///
/// - [`filter`]: Predicate tree and record field access
/// - [`builder`]: Role-scoped query construction per resource
/// - [`pagination`]: Page metadata arithmetic
/// - [`sql`]: Rendering predicates into `sqlx::QueryBuilder`
///
/// # Example
///
/// ```
/// use dailyreport_shared::auth::middleware::AuthContext;
/// use dailyreport_shared::models::user::Role;
/// use dailyreport_shared::query::builder::{build_task_query, TaskListParams};
/// use uuid::Uuid;
///
/// let auth = AuthContext::new(Uuid::new_v4(), Role::User);
/// let params = TaskListParams {
///     page: Some("2".to_string()),
///     ..Default::default()
/// };
///
/// let spec = build_task_query(&auth, &params).unwrap();
/// assert_eq!(spec.skip, 10);
/// assert_eq!(spec.limit, 10);
/// ```

use serde::{Deserialize, Serialize};

pub mod builder;
pub mod filter;
pub mod pagination;
pub mod sql;

use filter::{Field, Filter};

/// Default page size for list operations
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page size a caller may request
pub const MAX_LIMIT: i64 = 100;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: Field,
    pub order: SortOrder,
}

impl SortKey {
    pub fn asc(field: Field) -> Self {
        Self {
            field,
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: Field) -> Self {
        Self {
            field,
            order: SortOrder::Desc,
        }
    }
}

/// A fully shaped query, ready for the persistence collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Predicate every returned record satisfies
    pub filter: Filter,

    /// Sort keys, most significant first
    pub sort: Vec<SortKey>,

    /// Records to skip
    pub skip: i64,

    /// Maximum records to return
    pub limit: i64,

    /// 1-based page number the window was derived from
    pub page: i64,
}

impl QuerySpec {
    /// Unpaged spec returning at most `limit` records from the start
    pub fn first(filter: Filter, sort: Vec<SortKey>, limit: i64) -> Self {
        Self {
            filter,
            sort,
            skip: 0,
            limit,
            page: 1,
        }
    }
}
