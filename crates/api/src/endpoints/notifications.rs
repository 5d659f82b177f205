//! Notification endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use civic_common::AppResult;
use civic_db::entities::notification;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState};

/// Create the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread/count", get(unread_count))
        .route("/{id}/read", post(mark_read))
}

/// Notification response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: i64,
    pub user_id: i64,
    pub report_id: Option<i64>,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(notification: notification::Model) -> Self {
        Self {
            id: notification.id,
            user_id: notification.user_id,
            report_id: notification.report_id,
            content: notification.content,
            is_read: notification.is_read,
            created_at: notification.created_at.into(),
        }
    }
}

/// Unread count response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// List the authenticated user's notifications, newest first.
async fn list_notifications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<NotificationResponse>>> {
    let notifications = state.notification_service.list_for_user(user.id).await?;

    Ok(Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}

/// Count the authenticated user's unread notifications.
async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<UnreadCountResponse>> {
    let count = state.notification_service.unread_count(user.id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// Mark one of the authenticated user's notifications as read.
async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<NotificationResponse>> {
    let notification = state.notification_service.mark_read(id, user.id).await?;
    Ok(Json(NotificationResponse::from(notification)))
}
