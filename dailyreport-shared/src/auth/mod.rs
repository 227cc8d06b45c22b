/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: JWT token generation and validation
/// - [`middleware`]: Caller identity ([`middleware::AuthContext`]) and request authentication
/// - [`authorization`]: The single decision table for task and report access
///
/// # Example
///
/// ```no_run
/// use dailyreport_shared::auth::password::{hash_password, verify_password};
/// use dailyreport_shared::auth::jwt::{issue_token, validate_token};
/// use dailyreport_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Secret1")?;
/// assert!(verify_password("Secret1", &hash)?);
///
/// let token = issue_token(Uuid::new_v4(), Role::User, 168, "secret-key-at-least-32-bytes-long")?;
/// let claims = validate_token(&token, "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
