/// Field-level validation errors
///
/// Payload types derive [`validator::Validate`] for the simple rules (length,
/// email, range) and expose a `check()` method that adds the rules the derive
/// cannot express. Both paths end up as a flat list of [`FieldError`]s so the
/// HTTP layer can report every problem in one response.
///
/// # Example
///
/// ```
/// use dailyreport_shared::validation::{check_tags, FieldError};
///
/// let mut errors = Vec::new();
/// check_tags("tags", &["ok".to_string(), "".to_string()], 20, &mut errors);
/// assert_eq!(errors, vec![FieldError::new("tags", "Each tag must be between 1 and 20 characters")]);
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::models::Enumerated;

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Flattens derived validator errors into field errors, sorted by field name
pub fn from_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();

    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

/// Runs the derived rules of `payload` and appends their failures to `out`
pub fn run_derived<T: validator::Validate>(payload: &T, out: &mut Vec<FieldError>) {
    if let Err(e) = payload.validate() {
        out.extend(from_validation_errors(&e));
    }
}

/// Checks that every tag is between 1 and `max` characters
pub fn check_tags(field: &str, tags: &[String], max: usize, out: &mut Vec<FieldError>) {
    let bad = tags.iter().any(|tag| {
        let len = tag.chars().count();
        len == 0 || len > max
    });

    if bad {
        out.push(FieldError::new(
            field,
            format!("Each tag must be between 1 and {} characters", max),
        ));
    }
}

/// Checks that a present value is not blank
pub fn check_not_blank(field: &str, value: Option<&str>, message: &str, out: &mut Vec<FieldError>) {
    if let Some(value) = value {
        if value.trim().is_empty() {
            out.push(FieldError::new(field, message));
        }
    }
}

/// Trims tags and drops empty strings and duplicates, keeping first occurrence order
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

/// Trims a string in place
pub fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Parses an optional date field, recording `message` when malformed
pub fn check_date(
    field: &str,
    raw: Option<&str>,
    message: &str,
    out: &mut Vec<FieldError>,
) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    let parsed = parse_date(raw);
    if parsed.is_none() {
        out.push(FieldError::new(field, message));
    }
    parsed
}

/// Parses an optional ID field, recording `message` when malformed
pub fn check_uuid(field: &str, raw: Option<&str>, message: &str, out: &mut Vec<FieldError>) -> Option<Uuid> {
    let raw = raw?.trim();
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            out.push(FieldError::new(field, message));
            None
        }
    }
}

/// Parses an optional enumerated field
pub fn check_enum<T: Enumerated>(field: &str, raw: Option<&str>, out: &mut Vec<FieldError>) -> Option<T> {
    let raw = raw?;
    let parsed = T::parse(raw.trim());
    if parsed.is_none() {
        out.push(FieldError::new(
            field,
            format!("Invalid {}; expected one of: {}", field, T::expected()),
        ));
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tags_limits() {
        let mut errors = Vec::new();
        check_tags("tags", &["a".repeat(20)], 20, &mut errors);
        assert!(errors.is_empty());

        check_tags("tags", &["a".repeat(21)], 20, &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "tags");
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            " rust ".to_string(),
            "rust".to_string(),
            "".to_string(),
            "api".to_string(),
        ];
        assert_eq!(normalize_tags(tags), vec!["rust".to_string(), "api".to_string()]);
    }

    #[test]
    fn test_check_not_blank() {
        let mut errors = Vec::new();
        check_not_blank("content", Some("   "), "Content is required", &mut errors);
        check_not_blank("title", None, "Title is required", &mut errors);
        assert_eq!(errors, vec![FieldError::new("content", "Content is required")]);
    }

    #[test]
    fn test_parse_date_forms() {
        let midnight = parse_date("2025-03-04").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2025-03-04T00:00:00+00:00");
        assert!(parse_date("2025-03-04T10:00:00+02:00").is_some());
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn test_check_enum_and_uuid() {
        use crate::models::task::TaskPriority;

        let mut errors = Vec::new();
        assert_eq!(
            check_enum::<TaskPriority>("priority", Some("high"), &mut errors),
            Some(TaskPriority::High)
        );
        assert_eq!(check_enum::<TaskPriority>("priority", Some("extreme"), &mut errors), None);
        assert_eq!(check_uuid("task", Some("abc"), "Invalid task ID", &mut errors), None);
        assert_eq!(check_uuid("task", None, "Invalid task ID", &mut errors), None);

        assert_eq!(
            errors,
            vec![
                FieldError::new("priority", "Invalid priority; expected one of: low, medium, high, urgent"),
                FieldError::new("task", "Invalid task ID"),
            ]
        );
    }

    #[test]
    fn test_trim_in_place() {
        let mut value = "  hello ".to_string();
        trim_in_place(&mut value);
        assert_eq!(value, "hello");
    }
}
