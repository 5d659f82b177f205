//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use civic_core::{
    InternalCommentService, MessageService, NotificationService, ReportService,
};
use civic_db::repositories::UserRepository;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub report_service: ReportService,
    pub comment_service: InternalCommentService,
    pub message_service: MessageService,
    pub notification_service: NotificationService,
    pub user_repository: UserRepository,
}

/// Authentication middleware.
///
/// Resolves a bearer token into a user and stashes it in request extensions
/// for the [`crate::extractors::AuthUser`] extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(Some(user)) = state.user_repository.find_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
