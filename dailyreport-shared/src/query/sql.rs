/// Rendering of [`Filter`] trees into PostgreSQL
///
/// Every value is bound as a parameter; column names come from the closed
/// [`Field`] enum, so no caller input is ever spliced into the SQL text.
/// Substring matches use `ILIKE` with `%`, `_` and `\` escaped.

use sqlx::{Postgres, QueryBuilder};

use super::filter::{Field, Filter, Value};
use super::{QuerySpec, SortKey};

/// Appends `WHERE`, `ORDER BY`, `LIMIT` and `OFFSET` for a query spec
pub fn push_query(qb: &mut QueryBuilder<'_, Postgres>, spec: &QuerySpec) {
    push_where(qb, &spec.filter);
    push_order(qb, &spec.sort);
    qb.push(" LIMIT ").push_bind(spec.limit);
    qb.push(" OFFSET ").push_bind(spec.skip);
}

/// Appends a `WHERE` clause, or nothing for [`Filter::All`]
pub fn push_where(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    if matches!(filter, Filter::All) {
        return;
    }

    qb.push(" WHERE ");
    push_filter(qb, filter);
}

/// Appends an `ORDER BY` clause, or nothing when `sort` is empty
pub fn push_order(qb: &mut QueryBuilder<'_, Postgres>, sort: &[SortKey]) {
    for (i, key) in sort.iter().enumerate() {
        qb.push(if i == 0 { " ORDER BY " } else { ", " });
        qb.push(key.field.column()).push(" ").push(key.order.as_sql());
    }
}

/// Appends a single predicate
pub fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {
            qb.push("TRUE");
        }
        Filter::Eq(field, value) => push_comparison(qb, *field, " = ", value),
        Filter::Gte(field, value) => push_comparison(qb, *field, " >= ", value),
        Filter::Lte(field, value) => push_comparison(qb, *field, " <= ", value),
        Filter::Lt(field, value) => push_comparison(qb, *field, " < ", value),
        Filter::In(field, values) => push_membership(qb, *field, " IN (", values, "FALSE"),
        Filter::NotIn(field, values) => push_membership(qb, *field, " NOT IN (", values, "TRUE"),
        Filter::Contains(Field::Tags, needle) => {
            qb.push("EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE ");
            qb.push_bind(like_pattern(needle));
            qb.push(" ESCAPE '\\')");
        }
        Filter::Contains(field, needle) => {
            qb.push(field.column()).push(" ILIKE ");
            qb.push_bind(like_pattern(needle));
            qb.push(" ESCAPE '\\'");
        }
        Filter::And(clauses) => push_joined(qb, clauses, " AND ", "TRUE"),
        Filter::Or(clauses) => push_joined(qb, clauses, " OR ", "FALSE"),
    }
}

fn push_comparison(qb: &mut QueryBuilder<'_, Postgres>, field: Field, op: &str, value: &Value) {
    qb.push(field.column()).push(op);
    push_value(qb, value);
}

fn push_membership(
    qb: &mut QueryBuilder<'_, Postgres>,
    field: Field,
    open: &str,
    values: &[Value],
    when_empty: &str,
) {
    if values.is_empty() {
        qb.push(when_empty);
        return;
    }

    qb.push(field.column()).push(open);
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_value(qb, value);
    }
    qb.push(")");
}

fn push_joined(qb: &mut QueryBuilder<'_, Postgres>, clauses: &[Filter], sep: &str, when_empty: &str) {
    if clauses.is_empty() {
        qb.push(when_empty);
        return;
    }

    qb.push("(");
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            qb.push(sep);
        }
        push_filter(qb, clause);
    }
    qb.push(")");
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    match value {
        Value::Uuid(id) => {
            qb.push_bind(*id);
        }
        Value::Text(text) => {
            qb.push_bind(text.clone());
        }
        Value::Bool(flag) => {
            qb.push_bind(*flag);
        }
        Value::Time(at) => {
            qb.push_bind(*at);
        }
        Value::Enum {
            type_name, label, ..
        } => {
            qb.push_bind(*label).push("::").push(*type_name);
        }
    }
}

/// Builds an `ILIKE` pattern matching `needle` anywhere
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;
    use crate::query::SortKey;
    use uuid::Uuid;

    fn render(filter: &Filter) -> String {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM tasks");
        push_where(&mut qb, filter);
        qb.sql().to_string()
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(like_pattern("plain"), "%plain%");
    }

    #[test]
    fn test_render_all_has_no_where() {
        assert_eq!(render(&Filter::All), "SELECT * FROM tasks");
    }

    #[test]
    fn test_render_scope_and_search() {
        let filter = Filter::And(vec![
            Filter::Eq(Field::AssignedTo, Value::Uuid(Uuid::new_v4())),
            Filter::Eq(Field::IsActive, Value::Bool(true)),
            Filter::Or(vec![
                Filter::Contains(Field::Title, "db".to_string()),
                Filter::Contains(Field::Tags, "db".to_string()),
            ]),
        ]);

        assert_eq!(
            render(&filter),
            "SELECT * FROM tasks WHERE (assigned_to = $1 AND is_active = $2 AND \
             (title ILIKE $3 ESCAPE '\\' OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE $4 ESCAPE '\\')))"
        );
    }

    #[test]
    fn test_render_enum_membership() {
        let filter = Filter::In(
            Field::Status,
            vec![Value::of(TaskStatus::Pending), Value::of(TaskStatus::InProgress)],
        );
        assert_eq!(
            render(&filter),
            "SELECT * FROM tasks WHERE status IN ($1::task_status, $2::task_status)"
        );

        assert_eq!(render(&Filter::In(Field::Status, vec![])), "SELECT * FROM tasks WHERE FALSE");
    }

    #[test]
    fn test_render_order_and_window() {
        let spec = QuerySpec {
            filter: Filter::All,
            sort: vec![SortKey::asc(Field::DueDate), SortKey::desc(Field::Priority)],
            skip: 20,
            limit: 10,
            page: 3,
        };

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM tasks");
        push_query(&mut qb, &spec);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM tasks ORDER BY due_date ASC, priority DESC LIMIT $1 OFFSET $2"
        );
    }
}
