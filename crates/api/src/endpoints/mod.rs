//! API endpoints.

mod comments;
mod messages;
mod notifications;
mod reports;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest(
            "/reports",
            reports::router()
                .merge(comments::router())
                .merge(messages::router()),
        )
        .nest("/notifications", notifications::router())
}
