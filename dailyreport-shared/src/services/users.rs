/// Accounts: registration, login, self-service and administration
///
/// Passwords are hashed with Argon2id and never leave this module; every
/// response carries a [`UserProfile`]. Login failures are reported with a
/// single message so callers cannot probe which emails exist.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ensure_valid, ServiceError, ServiceResult};
use crate::auth::authorization::require_admin;
use crate::auth::jwt::issue_token;
use crate::auth::middleware::AuthContext;
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::models::user::{
    normalize_email, AdminUpdateUser, ChangePassword, CreateUser, LoginUser, RegisterUser, Role,
    UpdateProfile, UpdateUser, User, UserProfile,
};
use crate::query::builder::{build_user_query, UserListParams};
use crate::query::pagination::Page;
use crate::store::Store;
use crate::validation::FieldError;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Token signing parameters
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub expiration_hours: i64,
}

/// Result of a successful register or login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

/// Account operations
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenSettings>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenSettings) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
        }
    }

    /// Creates a regular account and signs the caller in
    pub async fn register(&self, mut payload: RegisterUser) -> ServiceResult<AuthSession> {
        let mut errors = payload.check();
        if let Err(message) = validate_password_strength(&payload.password) {
            errors.push(FieldError::new("password", message));
        }
        ensure_valid(errors)?;

        if self.store.find_user_by_email(&payload.email).await?.is_some() {
            return Err(email_taken());
        }

        let user = self
            .store
            .insert_user(CreateUser {
                name: payload.name,
                email: payload.email,
                password_hash: hash_password(&payload.password)?,
                role: Role::User,
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        self.session(user)
    }

    /// Verifies credentials and issues a token
    pub async fn login(&self, mut payload: LoginUser) -> ServiceResult<AuthSession> {
        ensure_valid(payload.check())?;

        let user = match self.store.find_user_by_email(&payload.email).await? {
            Some(user) if user.is_active => user,
            Some(user) => {
                warn!(user_id = %user.id, "Login attempt on deactivated account");
                return Err(invalid_credentials());
            }
            None => return Err(invalid_credentials()),
        };

        if !verify_password(&payload.password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(invalid_credentials());
        }

        info!(user_id = %user.id, "User logged in");
        self.session(user)
    }

    /// The caller's own profile
    pub async fn current(&self, auth: &AuthContext) -> ServiceResult<UserProfile> {
        Ok(self.load(auth.user_id).await?.into())
    }

    /// Updates the caller's name or email
    pub async fn update_profile(
        &self,
        auth: &AuthContext,
        mut payload: UpdateProfile,
    ) -> ServiceResult<UserProfile> {
        ensure_valid(payload.check())?;

        if let Some(email) = &payload.email {
            self.ensure_email_free(email, auth.user_id).await?;
        }

        self.write(
            auth.user_id,
            UpdateUser {
                name: payload.name,
                email: payload.email,
                ..Default::default()
            },
        )
        .await
    }

    /// Replaces the caller's password after checking the current one
    pub async fn change_password(
        &self,
        auth: &AuthContext,
        mut payload: ChangePassword,
    ) -> ServiceResult<()> {
        let mut errors = payload.check();
        if !payload.new_password.trim().is_empty() {
            if let Err(message) = validate_password_strength(&payload.new_password) {
                errors.push(FieldError::new("new_password", message));
            }
        }
        ensure_valid(errors)?;

        let user = self.load(auth.user_id).await?;
        if !verify_password(&payload.current_password, &user.password_hash)? {
            return Err(ServiceError::validation(
                "current_password",
                "Current password is incorrect",
            ));
        }

        self.write(
            user.id,
            UpdateUser {
                password_hash: Some(hash_password(&payload.new_password)?),
                ..Default::default()
            },
        )
        .await?;

        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Lists accounts; admin only
    pub async fn list(
        &self,
        auth: &AuthContext,
        params: &UserListParams,
    ) -> ServiceResult<Page<UserProfile>> {
        require_admin(auth)?;

        let spec = build_user_query(params)?;
        let users = self.store.list_users(&spec).await?;
        let total = self.store.count_users(&spec.filter).await?;

        Ok(Page::new(users, total, spec.page, spec.limit).map(UserProfile::from))
    }

    /// Reads one account; admin only
    pub async fn get(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<UserProfile> {
        require_admin(auth)?;
        Ok(self.load(id).await?.into())
    }

    /// Updates another account; admin only
    pub async fn update(
        &self,
        auth: &AuthContext,
        id: Uuid,
        mut payload: AdminUpdateUser,
    ) -> ServiceResult<UserProfile> {
        require_admin(auth)?;
        ensure_valid(payload.check())?;

        self.load(id).await?;
        if let Some(email) = &payload.email {
            self.ensure_email_free(email, id).await?;
        }

        let profile = self
            .write(
                id,
                UpdateUser {
                    name: payload.name,
                    email: payload.email,
                    role: payload.role,
                    is_active: payload.is_active,
                    ..Default::default()
                },
            )
            .await?;

        info!(user_id = %id, admin_id = %auth.user_id, "User updated by admin");
        Ok(profile)
    }

    /// Removes an account; admin only
    ///
    /// Tasks, reports and comments that reference the account stay, and their
    /// projections of it render as `null`.
    pub async fn delete(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<()> {
        require_admin(auth)?;

        if id == auth.user_id {
            return Err(ServiceError::validation(
                "id",
                "Cannot delete your own account",
            ));
        }

        if !self.store.delete_user(id).await? {
            return Err(not_found());
        }

        info!(user_id = %id, admin_id = %auth.user_id, "User deleted");
        Ok(())
    }

    /// Grants the admin role to the account with `email`
    ///
    /// Returns `None` when no such account exists.
    pub async fn promote_to_admin(&self, email: &str) -> ServiceResult<Option<UserProfile>> {
        let email = normalize_email(email);
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            return Ok(None);
        };

        let profile = self
            .write(
                user.id,
                UpdateUser {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await?;

        info!(user_id = %profile.id, "User promoted to admin");
        Ok(Some(profile))
    }

    async fn load(&self, id: Uuid) -> ServiceResult<User> {
        self.store.find_user(id).await?.ok_or_else(not_found)
    }

    async fn write(&self, id: Uuid, data: UpdateUser) -> ServiceResult<UserProfile> {
        if data.is_empty() {
            return Ok(self.load(id).await?.into());
        }

        Ok(self
            .store
            .update_user(id, data)
            .await?
            .ok_or_else(not_found)?
            .into())
    }

    async fn ensure_email_free(&self, email: &str, owner: Uuid) -> ServiceResult<()> {
        match self.store.find_user_by_email(email).await? {
            Some(other) if other.id != owner => Err(email_taken()),
            _ => Ok(()),
        }
    }

    fn session(&self, user: User) -> ServiceResult<AuthSession> {
        let token = issue_token(
            user.id,
            user.role,
            self.tokens.expiration_hours,
            &self.tokens.secret,
        )?;

        Ok(AuthSession {
            token,
            user: user.into(),
        })
    }
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Unauthenticated(INVALID_CREDENTIALS.to_string())
}

fn email_taken() -> ServiceError {
    ServiceError::Conflict("Email already exists".to_string())
}

fn not_found() -> ServiceError {
    ServiceError::NotFound("User not found".to_string())
}
