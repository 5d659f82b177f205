//! Message service.
//!
//! Inter-party communication on a report. Only the report's reporter and its
//! internal assignee take part; sending notifies the counterpart.

use chrono::Utc;
use sea_orm::Set;
use tracing::warn;

use civic_common::{AppError, AppResult};
use civic_db::{
    entities::{message, report},
    repositories::{MessageRepository, ReportRepository},
};

use crate::services::notification::NotificationService;

/// Maximum message length after trimming.
const MAX_CONTENT_LEN: usize = 2000;

/// Message service.
#[derive(Clone)]
pub struct MessageService {
    message_repo: MessageRepository,
    report_repo: ReportRepository,
    notification_service: NotificationService,
}

impl MessageService {
    /// Create a new message service.
    #[must_use]
    pub const fn new(
        message_repo: MessageRepository,
        report_repo: ReportRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            message_repo,
            report_repo,
            notification_service,
        }
    }

    /// List the messages exchanged on a report.
    pub async fn get_messages(
        &self,
        report_id: i64,
        caller_id: i64,
    ) -> AppResult<Vec<message::Model>> {
        let report = self.report_repo.get_by_id(report_id).await?;
        Self::require_participant(&report, caller_id)?;
        self.message_repo.find_by_report_id(report_id).await
    }

    /// Send a message on a report and notify the counterpart.
    pub async fn send_message(
        &self,
        report_id: i64,
        sender_id: i64,
        content: &str,
    ) -> AppResult<message::Model> {
        let report = self.report_repo.get_by_id(report_id).await?;
        Self::require_participant(&report, sender_id)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::BadRequest(
                "Message content is required".to_string(),
            ));
        }
        if content.chars().count() > MAX_CONTENT_LEN {
            return Err(AppError::BadRequest(format!(
                "Message content must not exceed {MAX_CONTENT_LEN} characters"
            )));
        }

        let model = message::ActiveModel {
            report_id: Set(report_id),
            sender_id: Set(sender_id),
            content: Set(content.to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let created = self.message_repo.create(model).await?;

        // Notify the other party; a notification failure must not undo the
        // message itself.
        let counterpart = if Some(sender_id) == report.reporter_id {
            report.assignee_id
        } else {
            report.reporter_id
        };
        if let Some(user_id) = counterpart {
            let content = format!("New message on report #{report_id}");
            if let Err(err) = self
                .notification_service
                .notify(user_id, Some(report_id), &content)
                .await
            {
                warn!(report_id, user_id, error = %err, "Failed to notify message counterpart");
            }
        }

        Ok(created)
    }

    fn require_participant(report: &report::Model, user_id: i64) -> AppResult<()> {
        let is_reporter = report.reporter_id == Some(user_id);
        let is_assignee = report.assignee_id == Some(user_id);

        if !is_reporter && !is_assignee {
            return Err(AppError::InsufficientRights(
                "Only the report's reporter and assignee can exchange messages".to_string(),
            ));
        }

        Ok(())
    }
}
