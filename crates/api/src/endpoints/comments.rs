//! Internal comment endpoints.
//!
//! Staff-only notes nested under a report.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use civic_common::AppResult;
use civic_db::entities::internal_comment;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{extractors::AuthUser, middleware::AppState};

/// Create the internal comments router, nested under `/reports`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/comments", get(list_comments))
        .route("/{id}/comments", post(add_comment))
        .route("/{id}/comments/{comment_id}", delete(delete_comment))
}

/// Internal comment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalCommentResponse {
    pub id: i64,
    pub report_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<internal_comment::Model> for InternalCommentResponse {
    fn from(comment: internal_comment::Model) -> Self {
        Self {
            id: comment.id,
            report_id: comment.report_id,
            author_id: comment.author_id,
            content: comment.content,
            created_at: comment.created_at.into(),
        }
    }
}

/// Add comment request.
#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub content: String,
}

/// List a report's internal comments.
async fn list_comments(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
) -> AppResult<Json<Vec<InternalCommentResponse>>> {
    let comments = state
        .comment_service
        .get_comments(report_id, user.id)
        .await?;

    Ok(Json(
        comments
            .into_iter()
            .map(InternalCommentResponse::from)
            .collect(),
    ))
}

/// Add an internal comment to a report.
async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
    Json(req): Json<AddCommentRequest>,
) -> AppResult<(StatusCode, Json<InternalCommentResponse>)> {
    info!(report_id, author = user.id, "Adding internal comment");

    let comment = state
        .comment_service
        .add_comment(report_id, user.id, &req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(InternalCommentResponse::from(comment))))
}

/// Delete one of the caller's own internal comments.
async fn delete_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((report_id, comment_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    info!(report_id, comment_id, caller = user.id, "Deleting internal comment");

    state
        .comment_service
        .delete_comment(report_id, comment_id, user.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
