/// Report engine
///
/// Reports are authored by any user and optionally linked to a task. A
/// non-admin may only link tasks assigned to them, may not set review
/// fields, and sees their own reports plus public ones.
///
/// Review outcome fields (`status`, `approved_by`, `approved_at`) are
/// silently stripped from non-admin updates; the rest of the payload still
/// applies.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ensure_valid, user_lookup, ServiceError, ServiceResult};
use crate::auth::authorization::{authorize, may_write_field, Operation, Target};
use crate::auth::middleware::AuthContext;
use crate::models::comment::{AddCommentRequest, CommentParent, CommentView, CreateComment};
use crate::models::report::{
    CreateReportRequest, Report, ReportStatus, ReportView, UpdateReportRequest,
};
use crate::models::task::TaskSummary;
use crate::models::ResourceKind;
use crate::query::builder::{
    build_report_query, build_user_reports_query, ReportListParams, UserReportParams,
};
use crate::query::pagination::Page;
use crate::query::QuerySpec;
use crate::store::Store;

/// Report operations
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn Store>,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Lists the reports visible to the caller
    pub async fn list(
        &self,
        auth: &AuthContext,
        params: &ReportListParams,
    ) -> ServiceResult<Page<ReportView>> {
        let spec = build_report_query(auth, params)?;
        self.page(spec).await
    }

    /// Lists one user's reports; the caller must be that user or an admin
    pub async fn list_by_user(
        &self,
        auth: &AuthContext,
        user_id: Uuid,
        params: &UserReportParams,
    ) -> ServiceResult<Page<ReportView>> {
        authorize(auth, Operation::Read, &Target::User { id: user_id }).map_err(|_| {
            ServiceError::Forbidden("Not authorized to access these reports".to_string())
        })?;

        let spec = build_user_reports_query(user_id, params)?;
        self.page(spec).await
    }

    /// Reads one report with its comments
    pub async fn get(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<ReportView> {
        let report = self.load(id).await?;
        authorize(auth, Operation::Read, &target(&report))?;

        let comments = self.store.list_comments(CommentParent::Report, id).await?;
        let users = user_lookup(
            self.store.as_ref(),
            comments.iter().map(|c| c.user_id),
        )
        .await?;
        let comments = comments
            .into_iter()
            .map(|c| {
                let user = users.get(&c.user_id).cloned();
                CommentView::new(c, user)
            })
            .collect();

        Ok(self.view(report).await?.with_comments(comments))
    }

    /// Files a report as the caller
    pub async fn create(
        &self,
        auth: &AuthContext,
        payload: CreateReportRequest,
    ) -> ServiceResult<ReportView> {
        authorize(
            auth,
            Operation::Create,
            &Target::Collection(ResourceKind::Report),
        )?;

        let mut data = payload.into_create(auth.user_id)?;

        if data.status.is_review_outcome() {
            if auth.is_admin() {
                if data.status == ReportStatus::Approved {
                    data.approved_by = Some(auth.user_id);
                }
            } else {
                debug!(
                    user_id = %auth.user_id,
                    status = ?data.status,
                    "Dropped review status from report creation"
                );
                data.status = ReportStatus::default();
            }
        }

        if let Some(task_id) = data.task_id {
            self.check_task_link(auth, task_id).await?;
        }

        let report = self.store.insert_report(data).await?;
        info!(
            report_id = %report.id,
            author_id = %report.author_id,
            task_id = ?report.task_id,
            "Report created"
        );

        self.view(report).await
    }

    /// Applies a partial update
    pub async fn update(
        &self,
        auth: &AuthContext,
        id: Uuid,
        mut payload: UpdateReportRequest,
    ) -> ServiceResult<ReportView> {
        let report = self.load(id).await?;
        authorize(auth, Operation::Update, &target(&report))?;

        let stripped = payload.strip(|field| may_write_field(auth, ResourceKind::Report, field));
        if !stripped.is_empty() {
            debug!(
                user_id = %auth.user_id,
                report_id = %id,
                fields = ?stripped,
                "Stripped fields the caller may not write"
            );
        }

        let mut data = payload.into_update()?;

        if let Some(Some(task_id)) = data.task_id {
            self.check_task_link(auth, task_id).await?;
        }
        if let Some(approver) = data.approved_by {
            self.require_user(approver, "Approver not found").await?;
        }

        // An admin approving without naming an approver is the approver
        if data.status == Some(ReportStatus::Approved)
            && report.status != ReportStatus::Approved
            && data.approved_by.is_none()
        {
            data.approved_by = Some(auth.user_id);
        }

        let updated = self
            .store
            .update_report(id, data)
            .await?
            .ok_or_else(not_found)?;

        info!(
            report_id = %id,
            user_id = %auth.user_id,
            status = ?updated.status,
            "Report updated"
        );

        self.view(updated).await
    }

    /// Removes a report and its comments
    pub async fn delete(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<()> {
        let report = self.load(id).await?;
        authorize(auth, Operation::Delete, &target(&report))?;

        self.store.delete_report(id).await?;
        info!(report_id = %id, user_id = %auth.user_id, "Report deleted");

        Ok(())
    }

    /// Appends a comment as the caller
    pub async fn add_comment(
        &self,
        auth: &AuthContext,
        id: Uuid,
        mut payload: AddCommentRequest,
    ) -> ServiceResult<CommentView> {
        ensure_valid(payload.check())?;

        let report = self.load(id).await?;
        authorize(auth, Operation::Comment, &target(&report))?;

        let comment = self
            .store
            .append_comment(CreateComment {
                parent_kind: CommentParent::Report,
                parent_id: id,
                user_id: auth.user_id,
                content: payload.content,
            })
            .await?;
        debug!(report_id = %id, user_id = %auth.user_id, "Comment added to report");

        let user = self.store.find_user(auth.user_id).await?;
        Ok(CommentView::new(comment, user.as_ref().map(Into::into)))
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Report> {
        self.store.find_report(id).await?.ok_or_else(not_found)
    }

    async fn require_user(&self, id: Uuid, message: &str) -> ServiceResult<()> {
        match self.store.find_user(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound(message.to_string())),
        }
    }

    /// Linking requires the task to exist and, for non-admins, to be theirs
    async fn check_task_link(&self, auth: &AuthContext, task_id: Uuid) -> ServiceResult<()> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Task not found".to_string()))?;

        if !auth.is_admin() && task.assigned_to != auth.user_id {
            debug!(user_id = %auth.user_id, task_id = %task_id, "Rejected link to foreign task");
            return Err(ServiceError::Forbidden(
                "Task is not assigned to you".to_string(),
            ));
        }

        Ok(())
    }

    async fn page(&self, spec: QuerySpec) -> ServiceResult<Page<ReportView>> {
        let reports = self.store.list_reports(&spec).await?;
        let total = self.store.count_reports(&spec.filter).await?;
        let views = self.views(reports).await?;

        Ok(Page::new(views, total, spec.page, spec.limit))
    }

    async fn view(&self, report: Report) -> ServiceResult<ReportView> {
        let mut views = self.views(vec![report]).await?;
        views.pop().ok_or_else(not_found)
    }

    /// Resolves author, approver and task references for a batch
    async fn views(&self, reports: Vec<Report>) -> ServiceResult<Vec<ReportView>> {
        let users = user_lookup(
            self.store.as_ref(),
            reports
                .iter()
                .flat_map(|r| std::iter::once(r.author_id).chain(r.approved_by)),
        )
        .await?;

        let task_ids: Vec<Uuid> = reports.iter().filter_map(|r| r.task_id).collect();
        let tasks: HashMap<Uuid, TaskSummary> = self
            .store
            .task_summaries(&task_ids)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        Ok(reports
            .into_iter()
            .map(|report| {
                let author = users.get(&report.author_id).cloned();
                let approved_by = report.approved_by.and_then(|id| users.get(&id).cloned());
                let task = report.task_id.and_then(|id| tasks.get(&id).cloned());
                ReportView::new(report, author, task, approved_by)
            })
            .collect())
    }
}

fn target(report: &Report) -> Target {
    Target::Report {
        author_id: report.author_id,
        is_public: report.is_public,
    }
}

fn not_found() -> ServiceError {
    ServiceError::NotFound("Report not found".to_string())
}
