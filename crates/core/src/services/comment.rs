//! Internal comment service.
//!
//! Staff-only notes on a report. Citizens never see these.

use chrono::Utc;
use sea_orm::Set;

use civic_common::{AppError, AppResult};
use civic_db::{
    entities::internal_comment,
    repositories::{InternalCommentRepository, ReportRepository, UserRepository},
};

use crate::roles::RoleKind;

/// Maximum comment length after trimming.
const MAX_CONTENT_LEN: usize = 2000;

/// Internal comment service.
#[derive(Clone)]
pub struct InternalCommentService {
    comment_repo: InternalCommentRepository,
    report_repo: ReportRepository,
    user_repo: UserRepository,
}

impl InternalCommentService {
    /// Create a new internal comment service.
    #[must_use]
    pub const fn new(
        comment_repo: InternalCommentRepository,
        report_repo: ReportRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            comment_repo,
            report_repo,
            user_repo,
        }
    }

    /// List a report's internal comments.
    pub async fn get_comments(
        &self,
        report_id: i64,
        caller_id: i64,
    ) -> AppResult<Vec<internal_comment::Model>> {
        self.require_staff(caller_id).await?;
        self.report_repo.get_by_id(report_id).await?;
        self.comment_repo.find_by_report_id(report_id).await
    }

    /// Add an internal comment to a report.
    pub async fn add_comment(
        &self,
        report_id: i64,
        author_id: i64,
        content: &str,
    ) -> AppResult<internal_comment::Model> {
        self.require_staff(author_id).await?;

        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::BadRequest(
                "Comment content is required".to_string(),
            ));
        }
        if content.chars().count() > MAX_CONTENT_LEN {
            return Err(AppError::BadRequest(format!(
                "Comment content must not exceed {MAX_CONTENT_LEN} characters"
            )));
        }

        self.report_repo.get_by_id(report_id).await?;

        let model = internal_comment::ActiveModel {
            report_id: Set(report_id),
            author_id: Set(author_id),
            content: Set(content.to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.comment_repo.create(model).await
    }

    /// Delete an internal comment.
    ///
    /// The comment must belong to the named report, and only its author may
    /// delete it.
    pub async fn delete_comment(
        &self,
        report_id: i64,
        comment_id: i64,
        caller_id: i64,
    ) -> AppResult<()> {
        let comment = self
            .comment_repo
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {comment_id} not found")))?;

        if comment.report_id != report_id {
            return Err(AppError::BadRequest(
                "Comment does not belong to the specified report".to_string(),
            ));
        }

        if comment.author_id != caller_id {
            return Err(AppError::InsufficientRights(
                "Only the author can delete an internal comment".to_string(),
            ));
        }

        self.comment_repo.delete(comment).await
    }

    async fn require_staff(&self, caller_id: i64) -> AppResult<()> {
        let caller = self
            .user_repo
            .find_with_roles(caller_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let kinds = RoleKind::for_user(&caller);
        if !kinds.iter().any(|k| k.is_municipal_staff()) {
            return Err(AppError::InsufficientRights(
                "Internal comments are restricted to municipal staff".to_string(),
            ));
        }

        Ok(())
    }
}
