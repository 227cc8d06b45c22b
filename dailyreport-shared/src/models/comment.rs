/// Append-only comments on tasks and reports
///
/// Comments for both parents live in one table keyed by
/// `(parent_kind, parent_id)`. Adding a comment is a single `INSERT`, so
/// concurrent commenters never overwrite each other. There is no edit or
/// delete operation.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE comment_parent AS ENUM ('task', 'report');
///
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     parent_kind comment_parent NOT NULL,
///     parent_id UUID NOT NULL,
///     user_id UUID NOT NULL,
///     content VARCHAR(500) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;
use crate::validation::{run_derived, trim_in_place, FieldError};

const COMMENT_COLUMNS: &str = "id, parent_kind, parent_id, user_id, content, created_at";

/// Kind of record a comment is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "comment_parent", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CommentParent {
    Task,
    Report,
}

/// Comment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub parent_kind: CommentParent,
    pub parent_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Input for appending a comment
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub parent_kind: CommentParent,
    pub parent_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

/// Comment payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, max = 500, message = "Comment must be between 1 and 500 characters"))]
    pub content: String,
}

impl AddCommentRequest {
    pub fn check(&mut self) -> Vec<FieldError> {
        trim_in_place(&mut self.content);

        let mut errors = Vec::new();
        run_derived(self, &mut errors);
        errors
    }
}

/// Comment as returned to callers, with its author resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub user: Option<UserSummary>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn new(comment: Comment, user: Option<UserSummary>) -> Self {
        Self {
            id: comment.id,
            user,
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}

impl Comment {
    /// Appends a comment
    pub async fn create(pool: &PgPool, data: CreateComment) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments (parent_kind, parent_id, user_id, content) VALUES ($1, $2, $3, $4) RETURNING {}",
            COMMENT_COLUMNS
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(data.parent_kind)
            .bind(data.parent_id)
            .bind(data.user_id)
            .bind(data.content)
            .fetch_one(pool)
            .await
    }

    /// Lists the comments of one parent, oldest first
    pub async fn list_for_parent(
        pool: &PgPool,
        parent_kind: CommentParent,
        parent_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM comments WHERE parent_kind = $1 AND parent_id = $2 ORDER BY created_at ASC, id ASC",
            COMMENT_COLUMNS
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(parent_kind)
            .bind(parent_id)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_trims_and_bounds_content() {
        let mut request = AddCommentRequest {
            content: "  looks good  ".to_string(),
        };
        assert!(request.check().is_empty());
        assert_eq!(request.content, "looks good");

        let mut blank = AddCommentRequest {
            content: "   ".to_string(),
        };
        assert_eq!(blank.check()[0].field, "content");

        let mut long = AddCommentRequest {
            content: "x".repeat(501),
        };
        assert_eq!(long.check().len(), 1);
    }

    #[test]
    fn test_parent_wire_name() {
        assert_eq!(
            serde_json::to_value(CommentParent::Report).unwrap(),
            serde_json::json!("report")
        );
    }
}
