/// User model and database operations
///
/// Users authenticate with email and password and carry a single global
/// role. Admins manage users and tasks and moderate reports.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(50) NOT NULL,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use dailyreport_shared::models::user::{CreateUser, Role, User};
/// use dailyreport_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Jane Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: Role::User,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "JANE@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use super::Enumerated;
use crate::query::filter::{Field, Filter, Filterable, Value};
use crate::query::{sql, QuerySpec};
use crate::validation::{check_not_blank, run_derived, trim_in_place, FieldError};

// CITEXT does not decode into `String`, so email is read back as text.
const USER_COLUMNS: &str =
    "id, name, email::text AS email, password_hash, role, is_active, created_at, updated_at";

/// Global user role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user: sees own tasks, files reports
    #[default]
    User,

    /// Administrator: manages users and tasks, moderates reports
    Admin,
}

impl Enumerated for Role {
    const TYPE_NAME: &'static str = "user_role";
    const ALL: &'static [Self] = &[Role::User, Role::Admin];

    fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// User account record
///
/// Never serialized to callers directly; use [`UserProfile`] or
/// [`UserSummary`] so the password hash stays inside the service layer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (unique, case-insensitive)
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Global role
    pub role: Role,

    /// Inactive users cannot log in
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Display projection used wherever a user reference is resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Account view returned by the auth and user administration endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Input for inserting a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Input for updating a user; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

/// Registration payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    pub password: String,
}

/// Login payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginUser {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Self-service profile update
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfile {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
}

/// Password change payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePassword {
    #[serde(alias = "currentPassword")]
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[serde(alias = "newPassword")]
    pub new_password: String,
}

/// Admin update of another account
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AdminUpdateUser {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,

    pub role: Option<Role>,

    #[serde(alias = "isActive")]
    pub is_active: Option<bool>,
}

/// Lowercases and trims an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl RegisterUser {
    /// Trims input and returns every validation failure
    pub fn check(&mut self) -> Vec<FieldError> {
        trim_in_place(&mut self.name);
        self.email = normalize_email(&self.email);

        let mut errors = Vec::new();
        run_derived(self, &mut errors);
        errors
    }
}

impl LoginUser {
    pub fn check(&mut self) -> Vec<FieldError> {
        self.email = normalize_email(&self.email);

        let mut errors = Vec::new();
        run_derived(self, &mut errors);
        errors
    }
}

impl UpdateProfile {
    pub fn check(&mut self) -> Vec<FieldError> {
        if let Some(name) = self.name.as_mut() {
            trim_in_place(name);
        }
        self.email = self.email.as_deref().map(normalize_email);

        let mut errors = Vec::new();
        run_derived(self, &mut errors);
        errors
    }
}

impl ChangePassword {
    pub fn check(&mut self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        run_derived(self, &mut errors);
        check_not_blank(
            "new_password",
            Some(self.new_password.as_str()),
            "New password is required",
            &mut errors,
        );
        errors
    }
}

impl AdminUpdateUser {
    pub fn check(&mut self) -> Vec<FieldError> {
        if let Some(name) = self.name.as_mut() {
            trim_in_place(name);
        }
        self.email = self.email.as_deref().map(normalize_email);

        let mut errors = Vec::new();
        run_derived(self, &mut errors);
        errors
    }
}

impl Filterable for User {
    fn value_of(&self, field: Field) -> Option<Value> {
        match field {
            Field::Id => Some(Value::Uuid(self.id)),
            Field::Name => Some(Value::Text(self.name.clone())),
            Field::Email => Some(Value::Text(self.email.clone())),
            Field::Role => Some(Value::of(self.role)),
            Field::IsActive => Some(Value::Bool(self.is_active)),
            Field::CreatedAt => Some(Value::Time(self.created_at)),
            Field::UpdatedAt => Some(Value::Time(self.updated_at)),
            _ => None,
        }
    }
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (`users_email_key`
    /// constraint) or the database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(data.name)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.role)
            .fetch_one(pool)
            .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1::citext", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Lists users matching a query
    pub async fn list(pool: &PgPool, spec: &QuerySpec) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM users", USER_COLUMNS));
        sql::push_query(&mut qb, spec);

        qb.build_query_as::<User>().fetch_all(pool).await
    }

    /// Counts users matching a filter
    pub async fn count(pool: &PgPool, filter: &Filter) -> Result<i64, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM users");
        sql::push_where(&mut qb, filter);

        let (count,): (i64,) = qb.build_query_as().fetch_one(pool).await?;
        Ok(count)
    }

    /// Resolves display projections for a set of user IDs
    pub async fn summaries(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<UserSummary>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, UserSummary>("SELECT id, name, email::text AS email FROM users WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(pool)
            .await
    }

    /// Updates an existing user
    ///
    /// Only `Some` fields in `data` are written. `updated_at` is always bumped.
    /// Returns `None` when the user does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", USER_COLUMNS));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(role) = data.role {
            q = q.bind(role);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }

        q.fetch_optional(pool).await
    }

    /// Permanently deletes a user
    ///
    /// Tasks, reports and comments referencing the user are left in place.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("ADMIN"), None);
        assert_eq!(Role::default(), Role::User);
        assert!(Role::Admin.is_admin());
        assert!(!Role::User.is_admin());
    }

    #[test]
    fn test_register_check_normalizes_email() {
        let mut payload = RegisterUser {
            name: "  Jane  ".to_string(),
            email: " Jane@Example.COM ".to_string(),
            password: "Secret1".to_string(),
        };

        assert!(payload.check().is_empty());
        assert_eq!(payload.name, "Jane");
        assert_eq!(payload.email, "jane@example.com");
    }

    #[test]
    fn test_register_check_reports_every_field() {
        let mut payload = RegisterUser {
            name: "J".to_string(),
            email: "not-an-email".to_string(),
            password: "Secret1".to_string(),
        };

        let errors = payload.check();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "name"]);
    }

    #[test]
    fn test_profile_serialization_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::User,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "user");
    }
}
