/// Shared fixtures for the engine tests
///
/// Seeds one admin and three regular users into a store and hands out
/// their identity contexts.

use dailyreport_shared::auth::middleware::AuthContext;
use dailyreport_shared::models::report::CreateReportRequest;
use dailyreport_shared::models::task::CreateTaskRequest;
use dailyreport_shared::models::user::{CreateUser, Role};
use dailyreport_shared::services::{ReportService, TaskService};
use dailyreport_shared::store::{memory::MemoryStore, Store};
use std::sync::Arc;
use uuid::Uuid;

#[allow(dead_code)]
pub struct Fixture {
    pub store: Arc<dyn Store>,
    pub reports: ReportService,
    pub tasks: TaskService,
    pub admin: AuthContext,
    pub user_a: AuthContext,
    pub user_b: AuthContext,
    pub user_c: AuthContext,
}

impl Fixture {
    pub async fn in_memory() -> Self {
        Self::seed(Arc::new(MemoryStore::new())).await
    }

    pub async fn seed(store: Arc<dyn Store>) -> Self {
        let admin = seed_user(store.as_ref(), "admin", Role::Admin).await;
        let user_a = seed_user(store.as_ref(), "alice", Role::User).await;
        let user_b = seed_user(store.as_ref(), "bob", Role::User).await;
        let user_c = seed_user(store.as_ref(), "carol", Role::User).await;

        Self {
            reports: ReportService::new(store.clone()),
            tasks: TaskService::new(store.clone()),
            store,
            admin,
            user_a,
            user_b,
            user_c,
        }
    }
}

async fn seed_user(store: &dyn Store, name: &str, role: Role) -> AuthContext {
    let user = store
        .insert_user(CreateUser {
            name: name.to_string(),
            email: format!("{}-{}@example.com", name, Uuid::new_v4()),
            password_hash: "not-a-real-hash".to_string(),
            role,
        })
        .await
        .expect("Failed to seed user");
    AuthContext::new(user.id, role)
}

pub fn task_for(assignee: Uuid, due_date: &str) -> CreateTaskRequest {
    CreateTaskRequest {
        title: "Migrate the billing exports".to_string(),
        description: "Move the nightly exports to the new bucket".to_string(),
        assigned_to: Some(assignee.to_string()),
        due_date: Some(due_date.to_string()),
        ..Default::default()
    }
}

pub fn report(title: &str) -> CreateReportRequest {
    CreateReportRequest {
        title: title.to_string(),
        content: "Worked on the importer".to_string(),
        ..Default::default()
    }
}
