/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An in-memory store seeded with an admin and two users
/// - JWT token generation
/// - A small request helper that returns status, headers and JSON body

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use dailyreport_api::app::{build_router, AppState};
use dailyreport_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, RateLimitConfig};
use dailyreport_shared::auth::jwt::issue_token;
use dailyreport_shared::auth::password::hash_password;
use dailyreport_shared::models::user::{CreateUser, Role, User};
use dailyreport_shared::store::{memory::MemoryStore, Store};
use serde_json::Value;
use std::sync::Arc;
use tower::Service as _;

pub const PASSWORD: &str = "Secret123";

/// A seeded account and a token for it
pub struct TestUser {
    pub user: User,
    pub token: String,
}

/// Test context containing the router and the seeded accounts
pub struct TestContext {
    pub app: axum::Router,
    pub config: Config,
    pub admin: TestUser,
    pub alice: TestUser,
    pub bob: TestUser,
}

/// Response pieces the tests assert on
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-at-least-32-chars".to_string(),
            expiration_hours: 1,
        },
        rate_limit: RateLimitConfig {
            auth_max_requests: 100,
            auth_window_seconds: 120,
        },
    }
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_config(test_config()).await
    }

    /// Creates a context over a fresh in-memory store
    pub async fn with_config(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

        let admin = seed(store.as_ref(), &config, "Admin", "admin@example.com", Role::Admin).await?;
        let alice = seed(store.as_ref(), &config, "Alice", "alice@example.com", Role::User).await?;
        let bob = seed(store.as_ref(), &config, "Bob", "bob@example.com", Role::User).await?;

        let app = build_router(AppState::new(store, config.clone()));

        Ok(TestContext {
            app,
            config,
            admin,
            alice,
            bob,
        })
    }

    /// Sends a request through the full router
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.7");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("Non-JSON body: {}", String::from_utf8_lossy(&bytes))
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, uri, Some(token), None).await
    }
}

async fn seed(
    store: &dyn Store,
    config: &Config,
    name: &str,
    email: &str,
    role: Role,
) -> anyhow::Result<TestUser> {
    let user = store
        .insert_user(CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(PASSWORD)?,
            role,
        })
        .await?;
    let token = issue_token(user.id, role, config.jwt.expiration_hours, &config.jwt.secret)?;

    Ok(TestUser { user, token })
}
