/// Domain models
///
/// This module contains the records the engines operate on, the payloads
/// callers submit, and the display projections returned to callers.
///
/// # Models
///
/// - `user`: Accounts, roles and the `{id, name, email}` projection
/// - `task`: Admin-assigned work items with derived due-date fields
/// - `report`: User-authored reports with approval tracking
/// - `comment`: Append-only comments on tasks and reports
///
/// # Example
///
/// ```
/// use dailyreport_shared::models::{task::TaskStatus, Enumerated};
///
/// assert_eq!(TaskStatus::parse("in_progress"), Some(TaskStatus::InProgress));
/// assert_eq!(TaskStatus::Completed.as_str(), "completed");
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clears every listed `Option` field the caller may not write and records its name
macro_rules! strip_fields {
    ($payload:ident, $allowed:ident, $stripped:ident; $($field:ident),+ $(,)?) => {
        $(
            if $payload.$field.is_some() && !$allowed(stringify!($field)) {
                $payload.$field = None;
                $stripped.push(stringify!($field));
            }
        )+
    };
}

/// Deserializes a field where `null` differs from absent
///
/// Pair with `#[serde(default)]`: an absent field stays `None`, `null` becomes
/// `Some(None)`.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

pub mod comment;
pub mod report;
pub mod task;
pub mod user;

/// Closed set of string-valued variants stored as PostgreSQL enums
///
/// `ALL` lists the variants in declaration order, which is also the order
/// PostgreSQL uses when sorting the matching enum type.
pub trait Enumerated: Sized + Copy + 'static {
    /// PostgreSQL enum type name
    const TYPE_NAME: &'static str;

    /// Every variant in declaration order
    const ALL: &'static [Self];

    /// Wire and storage representation
    fn as_str(&self) -> &'static str;

    /// Parses the wire representation
    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == value)
    }

    /// Position in declaration order
    fn rank(&self) -> u8 {
        Self::ALL
            .iter()
            .position(|v| v.as_str() == self.as_str())
            .unwrap_or(0) as u8
    }

    /// Comma-separated list of accepted values, for error messages
    fn expected() -> String {
        Self::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Kind of record an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    User,
    Task,
    Report,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Task => "task",
            ResourceKind::Report => "report",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
