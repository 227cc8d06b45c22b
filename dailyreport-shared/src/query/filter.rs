/// Predicate tree shared by every store backend
///
/// A [`Filter`] is an opaque description of which records a query may return.
/// The PostgreSQL store renders it to SQL (see [`super::sql`]); the in-memory
/// store evaluates it with [`Filter::matches`] against any [`Filterable`]
/// record.
///
/// Composition rule: [`Filter::and`] only flattens nested `And` nodes. An `Or`
/// clause always stays a single conjunct, so a caller-supplied search can
/// never widen a mandatory scope clause.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

use super::SortKey;
use crate::models::Enumerated;

/// Record fields that can be filtered or sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Name,
    Email,
    Role,
    Title,
    Content,
    Description,
    Tags,
    Status,
    Priority,
    Category,
    Author,
    Task,
    AssignedTo,
    AssignedBy,
    ApprovedBy,
    ApprovedAt,
    IsPublic,
    IsActive,
    Date,
    DueDate,
    CreatedAt,
    UpdatedAt,
}

impl Field {
    /// Column name in the backing table
    pub fn column(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Name => "name",
            Field::Email => "email",
            Field::Role => "role",
            Field::Title => "title",
            Field::Content => "content",
            Field::Description => "description",
            Field::Tags => "tags",
            Field::Status => "status",
            Field::Priority => "priority",
            Field::Category => "category",
            Field::Author => "author_id",
            Field::Task => "task_id",
            Field::AssignedTo => "assigned_to",
            Field::AssignedBy => "assigned_by",
            Field::ApprovedBy => "approved_by",
            Field::ApprovedAt => "approved_at",
            Field::IsPublic => "is_public",
            Field::IsActive => "is_active",
            Field::Date => "\"date\"",
            Field::DueDate => "due_date",
            Field::CreatedAt => "created_at",
            Field::UpdatedAt => "updated_at",
        }
    }

    /// Name used in payloads and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Author => "author",
            Field::Task => "task",
            other => other.column(),
        }
    }
}

/// A comparable field value
///
/// Enum values carry their declaration rank first so that ordering matches
/// PostgreSQL's ordering of enum types.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
    Time(DateTime<Utc>),
    Enum {
        rank: u8,
        type_name: &'static str,
        label: &'static str,
    },
}

impl Value {
    /// Wraps an enumerated domain value
    pub fn of<T: Enumerated>(value: T) -> Self {
        Value::Enum {
            rank: value.rank(),
            type_name: T::TYPE_NAME,
            label: value.as_str(),
        }
    }
}

/// Field access for records evaluated in process
pub trait Filterable {
    /// Current value of a scalar field, `None` when unset or not applicable
    fn value_of(&self, field: Field) -> Option<Value>;

    /// Tag set, for tag substring matching
    fn tags(&self) -> &[String] {
        &[]
    }
}

/// Predicate over a single record
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every record
    All,
    Eq(Field, Value),
    In(Field, Vec<Value>),
    NotIn(Field, Vec<Value>),
    Gte(Field, Value),
    Lte(Field, Value),
    Lt(Field, Value),
    /// Case-insensitive substring match; on `Field::Tags` matches any tag
    Contains(Field, String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// Conjunction of `clauses`
    ///
    /// `All` clauses are dropped and nested `And`s are flattened. A single
    /// remaining clause is returned as is; none yields `All`.
    pub fn and(clauses: Vec<Filter>) -> Filter {
        let mut flat = Vec::with_capacity(clauses.len());
        for clause in clauses {
            match clause {
                Filter::All => {}
                Filter::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => Filter::All,
            1 => flat.remove(0),
            _ => Filter::And(flat),
        }
    }

    /// Evaluates the predicate against a record
    pub fn matches<R: Filterable + ?Sized>(&self, record: &R) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => record.value_of(*field).as_ref() == Some(value),
            Filter::In(field, values) => record
                .value_of(*field)
                .map(|v| values.contains(&v))
                .unwrap_or(false),
            Filter::NotIn(field, values) => record
                .value_of(*field)
                .map(|v| !values.contains(&v))
                .unwrap_or(false),
            Filter::Gte(field, value) => compare(record, *field, value)
                .map(|o| o != Ordering::Less)
                .unwrap_or(false),
            Filter::Lte(field, value) => compare(record, *field, value)
                .map(|o| o != Ordering::Greater)
                .unwrap_or(false),
            Filter::Lt(field, value) => compare(record, *field, value)
                .map(|o| o == Ordering::Less)
                .unwrap_or(false),
            Filter::Contains(Field::Tags, needle) => {
                let needle = needle.to_lowercase();
                record
                    .tags()
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&needle))
            }
            Filter::Contains(field, needle) => match record.value_of(*field) {
                Some(Value::Text(text)) => text.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
            Filter::And(clauses) => clauses.iter().all(|c| c.matches(record)),
            Filter::Or(clauses) => clauses.iter().any(|c| c.matches(record)),
        }
    }
}

fn compare<R: Filterable + ?Sized>(record: &R, field: Field, value: &Value) -> Option<Ordering> {
    record.value_of(field)?.partial_cmp(value)
}

/// Orders two records by `keys`
///
/// Unset values sort after set ones in ascending order and before them in
/// descending order, as PostgreSQL does by default.
pub fn compare_by<R: Filterable + ?Sized>(a: &R, b: &R, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ordering = match (a.value_of(key.field), b.value_of(key.field)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };

        let ordering = match key.order {
            super::SortOrder::Asc => ordering,
            super::SortOrder::Desc => ordering.reverse(),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskPriority;

    struct Row {
        owner: Uuid,
        public: bool,
        title: String,
        priority: TaskPriority,
        tags: Vec<String>,
    }

    impl Filterable for Row {
        fn value_of(&self, field: Field) -> Option<Value> {
            match field {
                Field::Author => Some(Value::Uuid(self.owner)),
                Field::IsPublic => Some(Value::Bool(self.public)),
                Field::Title => Some(Value::Text(self.title.clone())),
                Field::Priority => Some(Value::of(self.priority)),
                _ => None,
            }
        }

        fn tags(&self) -> &[String] {
            &self.tags
        }
    }

    fn row(owner: Uuid, public: bool, title: &str) -> Row {
        Row {
            owner,
            public,
            title: title.to_string(),
            priority: TaskPriority::Medium,
            tags: vec!["Backend".to_string()],
        }
    }

    #[test]
    fn test_and_drops_all_and_flattens() {
        let eq = Filter::Eq(Field::IsPublic, Value::Bool(true));
        assert_eq!(Filter::and(vec![Filter::All]), Filter::All);
        assert_eq!(Filter::and(vec![Filter::All, eq.clone()]), eq);

        let nested = Filter::and(vec![
            Filter::And(vec![eq.clone(), eq.clone()]),
            eq.clone(),
        ]);
        assert_eq!(nested, Filter::And(vec![eq.clone(), eq.clone(), eq]));
    }

    #[test]
    fn test_and_keeps_or_clauses_separate() {
        let me = Uuid::new_v4();
        let scope = Filter::Or(vec![
            Filter::Eq(Field::Author, Value::Uuid(me)),
            Filter::Eq(Field::IsPublic, Value::Bool(true)),
        ]);
        let search = Filter::Or(vec![Filter::Contains(Field::Title, "x".to_string())]);

        let combined = Filter::and(vec![scope.clone(), search.clone()]);
        assert_eq!(combined, Filter::And(vec![scope, search]));

        // A private record owned by someone else stays hidden even if the search matches
        let other = row(Uuid::new_v4(), false, "x marks the spot");
        assert!(!combined.matches(&other));
        assert!(combined.matches(&row(me, false, "X")));
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let record = row(Uuid::new_v4(), true, "Weekly Summary");
        assert!(Filter::Contains(Field::Title, "summ".to_string()).matches(&record));
        assert!(Filter::Contains(Field::Tags, "backend".to_string()).matches(&record));
        assert!(!Filter::Contains(Field::Tags, "frontend".to_string()).matches(&record));
        assert!(!Filter::Contains(Field::Content, "summ".to_string()).matches(&record));
    }

    #[test]
    fn test_in_and_not_in() {
        let record = row(Uuid::new_v4(), true, "t");
        let medium = Value::of(TaskPriority::Medium);
        let high = Value::of(TaskPriority::High);

        assert!(Filter::In(Field::Priority, vec![medium.clone()]).matches(&record));
        assert!(!Filter::In(Field::Priority, vec![]).matches(&record));
        assert!(Filter::NotIn(Field::Priority, vec![high]).matches(&record));
        assert!(!Filter::NotIn(Field::Priority, vec![medium]).matches(&record));
    }

    #[test]
    fn test_enum_values_order_by_rank() {
        assert!(Value::of(TaskPriority::Urgent) > Value::of(TaskPriority::High));
        assert!(Value::of(TaskPriority::Low) < Value::of(TaskPriority::Medium));
    }

    #[test]
    fn test_compare_by_priority_desc() {
        let mut rows = vec![
            Row { priority: TaskPriority::Low, ..row(Uuid::new_v4(), true, "a") },
            Row { priority: TaskPriority::Urgent, ..row(Uuid::new_v4(), true, "b") },
            Row { priority: TaskPriority::High, ..row(Uuid::new_v4(), true, "c") },
        ];

        rows.sort_by(|a, b| compare_by(a, b, &[SortKey::desc(Field::Priority)]));
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c", "a"]);
    }
}
