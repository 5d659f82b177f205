//! Message endpoints.
//!
//! Reporter-to-assignee communication nested under a report.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use civic_common::AppResult;
use civic_db::entities::message;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{extractors::AuthUser, middleware::AppState};

/// Create the messages router, nested under `/reports`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/messages", get(list_messages))
        .route("/{id}/messages", post(send_message))
}

/// Message response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub report_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<message::Model> for MessageResponse {
    fn from(message: message::Model) -> Self {
        Self {
            id: message.id,
            report_id: message.report_id,
            sender_id: message.sender_id,
            content: message.content,
            created_at: message.created_at.into(),
        }
    }
}

/// Send message request.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// List the messages exchanged on a report.
async fn list_messages(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
) -> AppResult<Json<Vec<MessageResponse>>> {
    let messages = state.message_service.get_messages(report_id, user.id).await?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// Send a message on a report; the counterpart is notified.
async fn send_message(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    info!(report_id, sender = user.id, "Sending message");

    let message = state
        .message_service
        .send_message(report_id, user.id, &req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}
