/// Authorization guard
///
/// Every single-record decision in the engines goes through [`authorize`],
/// which encodes one table for both resources:
///
/// | Resource | Caller | Condition | read | create | update | delete | comment |
/// |----------|--------|-----------|------|--------|--------|--------|---------|
/// | Task | admin | any | ✓ | ✓ | ✓ | ✓ | ✓ |
/// | Task | user | assignee | ✓ | ✗ | ✓ (limited) | ✗ | ✓ |
/// | Task | user | other | ✗ | ✗ | ✗ | ✗ | ✗ |
/// | Report | admin | any | ✓ | ✓ | ✓ | ✓ | ✓ |
/// | Report | user | author | ✓ | ✓ | ✓ (limited) | ✓ | ✓ |
/// | Report | user | public | ✓ | n/a | ✗ | ✗ | ✓ |
/// | Report | user | other | ✗ | n/a | ✗ | ✗ | ✗ |
///
/// A denial is an error, never an empty result. List scoping is separate and
/// lives in the filter builder.
///
/// "Limited" updates are expressed by [`may_write_field`]: the engines strip
/// the fields it rejects instead of refusing the whole request.
///
/// # Example
///
/// ```
/// use dailyreport_shared::auth::authorization::{authorize, Operation, Target};
/// use dailyreport_shared::auth::middleware::AuthContext;
/// use dailyreport_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let me = AuthContext::new(Uuid::new_v4(), Role::User);
/// let mine = Target::Task { assigned_to: me.user_id };
/// let theirs = Target::Task { assigned_to: Uuid::new_v4() };
///
/// assert!(authorize(&me, Operation::Read, &mine).is_ok());
/// assert!(authorize(&me, Operation::Read, &theirs).is_err());
/// assert!(authorize(&me, Operation::Delete, &mine).is_err());
/// ```

use std::fmt;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::ResourceKind;

/// Task fields only an admin may write
pub const TASK_ADMIN_FIELDS: &[&str] = &["assigned_to", "assigned_by", "priority"];

/// Report fields only an admin may write
pub const REPORT_ADMIN_FIELDS: &[&str] = &["status", "approved_by", "approved_at"];

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Operation is reserved for admins
    #[error("Admin access required")]
    AdminRequired,

    /// Caller has no relationship granting the operation
    #[error("Not authorized to {operation} this {resource}")]
    Denied {
        operation: Operation,
        resource: ResourceKind,
    },
}

/// Operation being authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    Comment,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Read => "access",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Comment => "comment on",
        })
    }
}

/// What an operation acts on, with the ownership fields the table needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// An existing task
    Task { assigned_to: Uuid },

    /// An existing report
    Report { author_id: Uuid, is_public: bool },

    /// A user account, or data filed under it
    User { id: Uuid },

    /// A whole collection, for `Create`
    Collection(ResourceKind),
}

impl Target {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Target::Task { .. } => ResourceKind::Task,
            Target::Report { .. } => ResourceKind::Report,
            Target::User { .. } => ResourceKind::User,
            Target::Collection(kind) => *kind,
        }
    }
}

/// Decides one cell of the table
pub fn is_allowed(auth: &AuthContext, operation: Operation, target: &Target) -> bool {
    if auth.is_admin() {
        return true;
    }

    let me = auth.user_id;
    match *target {
        Target::Task { assigned_to } => {
            assigned_to == me
                && matches!(
                    operation,
                    Operation::Read | Operation::Update | Operation::Comment
                )
        }
        Target::Report {
            author_id,
            is_public,
        } => match operation {
            Operation::Read | Operation::Comment => author_id == me || is_public,
            Operation::Update | Operation::Delete => author_id == me,
            Operation::Create => false,
        },
        Target::User { id } => id == me && operation == Operation::Read,
        Target::Collection(kind) => kind == ResourceKind::Report && operation == Operation::Create,
    }
}

/// Like [`is_allowed`], but a denial is an error
pub fn authorize(auth: &AuthContext, operation: Operation, target: &Target) -> Result<(), AuthzError> {
    if is_allowed(auth, operation, target) {
        return Ok(());
    }

    tracing::debug!(
        user_id = %auth.user_id,
        operation = %operation,
        resource = %target.kind(),
        "Authorization denied"
    );

    Err(AuthzError::Denied {
        operation,
        resource: target.kind(),
    })
}

/// Requires the caller to be an admin
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.is_admin() {
        Ok(())
    } else {
        tracing::debug!(user_id = %auth.user_id, "Admin access required");
        Err(AuthzError::AdminRequired)
    }
}

/// Whether the caller may write `field` of a record of `kind` they may update
pub fn may_write_field(auth: &AuthContext, kind: ResourceKind, field: &str) -> bool {
    if auth.is_admin() {
        return true;
    }

    match kind {
        ResourceKind::Task => !TASK_ADMIN_FIELDS.contains(&field),
        ResourceKind::Report => !REPORT_ADMIN_FIELDS.contains(&field),
        ResourceKind::User => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    const ALL_OPS: [Operation; 5] = [
        Operation::Read,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
        Operation::Comment,
    ];

    fn user() -> AuthContext {
        AuthContext::new(Uuid::new_v4(), Role::User)
    }

    fn admin() -> AuthContext {
        AuthContext::new(Uuid::new_v4(), Role::Admin)
    }

    fn allowed_ops(auth: &AuthContext, target: Target) -> Vec<Operation> {
        ALL_OPS
            .iter()
            .copied()
            .filter(|op| is_allowed(auth, *op, &target))
            .collect()
    }

    #[test]
    fn test_admin_may_do_everything() {
        let auth = admin();
        let other = Uuid::new_v4();

        for target in [
            Target::Task { assigned_to: other },
            Target::Report { author_id: other, is_public: false },
            Target::User { id: other },
            Target::Collection(ResourceKind::Task),
        ] {
            assert_eq!(allowed_ops(&auth, target), ALL_OPS.to_vec());
        }
    }

    #[test]
    fn test_task_rows() {
        let auth = user();

        assert_eq!(
            allowed_ops(&auth, Target::Task { assigned_to: auth.user_id }),
            vec![Operation::Read, Operation::Update, Operation::Comment]
        );
        assert!(allowed_ops(&auth, Target::Task { assigned_to: Uuid::new_v4() }).is_empty());
        assert!(!is_allowed(&auth, Operation::Create, &Target::Collection(ResourceKind::Task)));
    }

    #[test]
    fn test_report_rows() {
        let auth = user();
        let other = Uuid::new_v4();

        assert_eq!(
            allowed_ops(&auth, Target::Report { author_id: auth.user_id, is_public: false }),
            vec![Operation::Read, Operation::Update, Operation::Delete, Operation::Comment]
        );
        assert_eq!(
            allowed_ops(&auth, Target::Report { author_id: other, is_public: true }),
            vec![Operation::Read, Operation::Comment]
        );
        assert!(allowed_ops(&auth, Target::Report { author_id: other, is_public: false }).is_empty());
        assert!(is_allowed(&auth, Operation::Create, &Target::Collection(ResourceKind::Report)));
    }

    #[test]
    fn test_user_target() {
        let auth = user();
        assert!(is_allowed(&auth, Operation::Read, &Target::User { id: auth.user_id }));
        assert!(!is_allowed(&auth, Operation::Read, &Target::User { id: Uuid::new_v4() }));
        assert!(!is_allowed(&auth, Operation::Update, &Target::User { id: auth.user_id }));
    }

    #[test]
    fn test_denial_message() {
        let auth = user();
        let err = authorize(
            &auth,
            Operation::Comment,
            &Target::Task { assigned_to: Uuid::new_v4() },
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "Not authorized to comment on this task");
        assert_eq!(require_admin(&auth), Err(AuthzError::AdminRequired));
        assert!(require_admin(&admin()).is_ok());
    }

    #[test]
    fn test_may_write_field() {
        let auth = user();

        assert!(may_write_field(&auth, ResourceKind::Task, "status"));
        assert!(may_write_field(&auth, ResourceKind::Task, "due_date"));
        assert!(!may_write_field(&auth, ResourceKind::Task, "priority"));
        assert!(!may_write_field(&auth, ResourceKind::Task, "assigned_to"));

        assert!(may_write_field(&auth, ResourceKind::Report, "title"));
        assert!(!may_write_field(&auth, ResourceKind::Report, "status"));
        assert!(!may_write_field(&auth, ResourceKind::Report, "approved_at"));

        assert!(may_write_field(&admin(), ResourceKind::Report, "status"));
    }
}
