//! Notification service.
//!
//! Persists per-user notifications about report activity. Delivery
//! transports (email, instant messaging) hang off this seam and are out of
//! scope here.

use chrono::Utc;
use sea_orm::Set;

use civic_common::AppResult;
use civic_db::{entities::notification, repositories::NotificationRepository};

/// Notification service.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self { notification_repo }
    }

    /// Create a notification for a user about a report.
    pub async fn notify(
        &self,
        user_id: i64,
        report_id: Option<i64>,
        content: &str,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            user_id: Set(user_id),
            report_id: Set(report_id),
            content: Set(content.to_string()),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.notification_repo.create(model).await
    }

    /// List a user's notifications, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<notification::Model>> {
        self.notification_repo.find_by_user_id(user_id).await
    }

    /// Mark one of the user's notifications as read.
    pub async fn mark_read(&self, id: i64, user_id: i64) -> AppResult<notification::Model> {
        self.notification_repo.mark_read(id, user_id).await
    }

    /// Count the user's unread notifications.
    pub async fn unread_count(&self, user_id: i64) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }
}
