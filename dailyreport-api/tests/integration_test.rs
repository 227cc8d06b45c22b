/// Integration tests for the Daily Report API
///
/// These tests drive the full router over an in-memory store:
/// - Authentication and the JWT layer
/// - Report and task authorization through HTTP
/// - Validation and error bodies
/// - Rate limiting and security headers

mod common;

use axum::http::{Method, StatusCode};
use common::{test_config, TestContext, PASSWORD};
use serde_json::json;

fn future_date() -> String {
    (chrono::Utc::now() + chrono::Duration::days(14))
        .format("%Y-%m-%d")
        .to_string()
}

async fn create_task_for(ctx: &TestContext, assignee: uuid::Uuid) -> String {
    let res = ctx
        .post(
            "/api/tasks",
            &ctx.admin.token,
            json!({
                "title": "Prepare the release notes",
                "description": "Collect merged changes since the last tag",
                "assignedTo": assignee,
                "dueDate": future_date(),
                "priority": "high"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    res.body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_reports_store_state() {
    let ctx = TestContext::new().await.unwrap();

    let res = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "healthy");
    assert_eq!(res.body["database"], "connected");
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let ctx = TestContext::new().await.unwrap();

    let res = ctx.send(Method::GET, "/health", None, None).await;
    assert_eq!(res.headers["x-content-type-options"], "nosniff");
    assert_eq!(res.headers["x-frame-options"], "DENY");
    assert!(res.headers.get("strict-transport-security").is_none());

    let missing = ctx.send(Method::GET, "/nowhere", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "not_found");
    assert_eq!(missing.headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_register_and_login() {
    let ctx = TestContext::new().await.unwrap();

    let res = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Grace Hopper",
                "email": "Grace@Example.com",
                "password": "Cobol1959"
            })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert!(res.body["token"].is_string());
    assert_eq!(res.body["user"]["email"], "grace@example.com");
    assert_eq!(res.body["user"]["role"], "user");
    assert!(res.body["user"].get("password_hash").is_none());

    let token = res.body["token"].as_str().unwrap().to_string();
    let me = ctx.get("/api/auth/current", &token).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["name"], "Grace Hopper");

    let login = ctx
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "grace@example.com", "password": "Cobol1959" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_weak_passwords() {
    let ctx = TestContext::new().await.unwrap();

    let taken = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Alice", "email": "alice@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);
    assert_eq!(taken.body["message"], "Email already exists");

    let weak = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Eve", "email": "eve@example.com", "password": "password" })),
        )
        .await;
    assert_eq!(weak.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(weak.body["error"], "validation_error");
    assert_eq!(weak.body["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let ctx = TestContext::new().await.unwrap();

    for (email, password) in [
        ("alice@example.com", "Wrong1234"),
        ("nobody@example.com", PASSWORD),
    ] {
        let res = ctx
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["message"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_change_password() {
    let ctx = TestContext::new().await.unwrap();

    let wrong = ctx
        .put(
            "/api/auth/password",
            &ctx.alice.token,
            json!({ "current_password": "Nope12345", "new_password": "Fresh4567" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNPROCESSABLE_ENTITY);

    let ok = ctx
        .put(
            "/api/auth/password",
            &ctx.alice.token,
            json!({ "currentPassword": PASSWORD, "newPassword": "Fresh4567" }),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK, "{}", ok.body);
    assert_eq!(ok.body["message"], "Password updated successfully");

    let login = ctx
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "Fresh4567" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let ctx = TestContext::new().await.unwrap();

    let missing = ctx.send(Method::GET, "/api/reports", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let forged = ctx.get("/api/tasks", "not-a-jwt").await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_report_visibility() {
    let ctx = TestContext::new().await.unwrap();

    let private = ctx
        .post(
            "/api/reports",
            &ctx.alice.token,
            json!({ "title": "Private", "content": "Only for me and admins" }),
        )
        .await;
    assert_eq!(private.status, StatusCode::CREATED);
    assert_eq!(private.body["author"]["id"], json!(ctx.alice.user.id));
    assert_eq!(private.body["status"], "draft");

    let public = ctx
        .post(
            "/api/reports",
            &ctx.alice.token,
            json!({ "title": "Public", "content": "Everyone may read", "isPublic": true }),
        )
        .await;
    assert_eq!(public.status, StatusCode::CREATED);

    let listed = ctx.get("/api/reports", &ctx.bob.token).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["total_count"], 1);
    assert_eq!(listed.body["items"][0]["title"], "Public");

    let id = private.body["id"].as_str().unwrap();
    let denied = ctx.get(&format!("/api/reports/{}", id), &ctx.bob.token).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let admin_view = ctx.get(&format!("/api/reports/{}", id), &ctx.admin.token).await;
    assert_eq!(admin_view.status, StatusCode::OK);
    assert_eq!(admin_view.body["comments"], json!([]));

    let other = ctx
        .get(
            &format!("/api/reports/user/{}", ctx.alice.user.id),
            &ctx.bob.token,
        )
        .await;
    assert_eq!(other.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_report_review_fields_are_admin_only() {
    let ctx = TestContext::new().await.unwrap();
    let created = ctx
        .post(
            "/api/reports",
            &ctx.alice.token,
            json!({ "title": "Week 12", "content": "Shipped the exporter" }),
        )
        .await;
    let uri = format!("/api/reports/{}", created.body["id"].as_str().unwrap());

    let own = ctx
        .put(&uri, &ctx.alice.token, json!({ "status": "approved", "title": "x" }))
        .await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["title"], "x");
    assert_eq!(own.body["status"], "draft");

    let reviewed = ctx.put(&uri, &ctx.admin.token, json!({ "status": "approved" })).await;
    assert_eq!(reviewed.body["status"], "approved");
    assert!(reviewed.body["approved_at"].is_string());
    assert_eq!(reviewed.body["approved_by"]["id"], json!(ctx.admin.user.id));

    let deleted = ctx.delete(&uri, &ctx.alice.token).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Report deleted successfully");
    assert_eq!(ctx.get(&uri, &ctx.alice.token).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_authorization() {
    let ctx = TestContext::new().await.unwrap();

    let by_user = ctx
        .post(
            "/api/tasks",
            &ctx.alice.token,
            json!({
                "title": "Self assigned work",
                "description": "Users cannot create tasks",
                "assignedTo": ctx.alice.user.id,
                "dueDate": future_date()
            }),
        )
        .await;
    assert_eq!(by_user.status, StatusCode::FORBIDDEN);

    let id = create_task_for(&ctx, ctx.bob.user.id).await;
    let uri = format!("/api/tasks/{}", id);

    assert_eq!(ctx.get(&uri, &ctx.alice.token).await.status, StatusCode::FORBIDDEN);
    let mine = ctx.get(&uri, &ctx.bob.token).await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.body["assigned_by"]["id"], json!(ctx.admin.user.id));
    assert_eq!(mine.body["is_overdue"], false);

    let updated = ctx
        .put(&uri, &ctx.bob.token, json!({ "status": "completed", "priority": "low" }))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["status"], "completed");
    assert_eq!(updated.body["priority"], "high");
    assert!(updated.body["completed_date"].is_string());

    assert_eq!(ctx.delete(&uri, &ctx.bob.token).await.status, StatusCode::FORBIDDEN);
    assert_eq!(ctx.delete(&uri, &ctx.admin.token).await.status, StatusCode::OK);
    assert_eq!(ctx.delete(&uri, &ctx.admin.token).await.status, StatusCode::OK);
    assert_eq!(ctx.get(&uri, &ctx.bob.token).await.status, StatusCode::NOT_FOUND);
    assert_eq!(ctx.get(&uri, &ctx.admin.token).await.body["is_active"], false);
}

#[tokio::test]
async fn test_linked_report_requires_assignment() {
    let ctx = TestContext::new().await.unwrap();
    let task_id = create_task_for(&ctx, ctx.bob.user.id).await;

    let body = json!({ "title": "Release notes", "content": "Drafted section one", "task": task_id });

    let ok = ctx.post("/api/reports", &ctx.bob.token, body.clone()).await;
    assert_eq!(ok.status, StatusCode::CREATED);
    assert_eq!(ok.body["task"]["id"], json!(task_id));
    assert_eq!(ok.body["task"]["priority"], "high");

    let denied = ctx.post("/api/reports", &ctx.alice.token, body).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.body["message"], "Task is not assigned to you");
}

#[tokio::test]
async fn test_task_search_stats_and_comments() {
    let ctx = TestContext::new().await.unwrap();
    let id = create_task_for(&ctx, ctx.bob.user.id).await;

    let found = ctx.get("/api/tasks/search?q=release", &ctx.bob.token).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body.as_array().map(Vec::len), Some(1));

    let short = ctx.get("/api/tasks/search?q=r", &ctx.bob.token).await;
    assert_eq!(short.status, StatusCode::UNPROCESSABLE_ENTITY);

    let mine = ctx.get("/api/tasks/my-tasks", &ctx.bob.token).await;
    assert_eq!(mine.body[0]["id"], json!(id));

    let stats = ctx.get("/api/tasks/stats", &ctx.bob.token).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["total"], 1);
    assert_eq!(stats.body["by_status"].as_array().map(Vec::len), Some(4));

    let comment = ctx
        .post(
            &format!("/api/tasks/{}/comments", id),
            &ctx.bob.token,
            json!({ "content": "Started on this" }),
        )
        .await;
    assert_eq!(comment.status, StatusCode::CREATED);
    assert_eq!(comment.body["user"]["name"], "Bob");
}

#[tokio::test]
async fn test_validation_errors() {
    let ctx = TestContext::new().await.unwrap();

    let empty = ctx
        .post("/api/reports", &ctx.alice.token, json!({ "title": "", "content": "x" }))
        .await;
    assert_eq!(empty.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(empty.body["details"][0]["field"], "title");

    let bad_sort = ctx.get("/api/reports?sortBy=secret", &ctx.alice.token).await;
    assert_eq!(bad_sort.status, StatusCode::UNPROCESSABLE_ENTITY);

    let bad_id = ctx.get("/api/reports/not-a-uuid", &ctx.alice.token).await;
    assert_eq!(bad_id.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(bad_id.body["details"][0]["field"], "id");

    let bad_limit = ctx.get("/api/tasks?limit=500", &ctx.alice.token).await;
    assert_eq!(bad_limit.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_user_administration() {
    let ctx = TestContext::new().await.unwrap();

    assert_eq!(ctx.get("/api/users", &ctx.alice.token).await.status, StatusCode::FORBIDDEN);

    let all = ctx.get("/api/users?sortBy=name&sortOrder=asc", &ctx.admin.token).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["total_count"], 3);
    assert_eq!(all.body["items"][0]["name"], "Admin");

    let self_delete = ctx
        .delete(&format!("/api/users/{}", ctx.admin.user.id), &ctx.admin.token)
        .await;
    assert_eq!(self_delete.status, StatusCode::UNPROCESSABLE_ENTITY);

    let deactivate = ctx
        .put(
            &format!("/api/users/{}", ctx.bob.user.id),
            &ctx.admin.token,
            json!({ "isActive": false }),
        )
        .await;
    assert_eq!(deactivate.status, StatusCode::OK);
    assert_eq!(deactivate.body["is_active"], false);

    // A token for a deactivated account stops working.
    let res = ctx.get("/api/auth/current", &ctx.bob.token).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited() {
    let mut config = test_config();
    config.rate_limit.auth_max_requests = 2;
    let ctx = TestContext::with_config(config).await.unwrap();

    let login = || {
        ctx.send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": PASSWORD })),
        )
    };

    let first = login().await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.headers["x-ratelimit-limit"], "2");
    assert_eq!(login().await.status, StatusCode::OK);

    let limited = login().await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"], "rate_limit_exceeded");
    assert!(limited.headers.contains_key("retry-after"));

    // Other route groups are not limited.
    assert_eq!(ctx.get("/api/reports", &ctx.alice.token).await.status, StatusCode::OK);
}
