/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and the caller's own account
/// - `reports`: Daily reports and their comments
/// - `tasks`: Task assignment, search and statistics
/// - `users`: Account administration

pub mod auth;
pub mod health;
pub mod reports;
pub mod tasks;
pub mod users;

use crate::error::ApiError;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

/// Confirmation body for operations without a resource to return
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Json<Self> {
        Json(Self { message })
    }
}

/// Endpoint index
///
/// ```text
/// GET /api
/// ```
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": "Daily Report API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "reports": "/api/reports",
            "tasks": "/api/tasks",
            "users": "/api/users",
            "health": "/health"
        }
    }))
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
