//! Civic-report server entry point.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, middleware};
use civic_api::middleware::AppState;
use civic_common::{Config, LocalPhotoStorage, PhotoStorage, ServiceArea};
use civic_core::{
    CategoryRoleResolver, InternalCommentService, MessageService, NotificationService,
    ReportService, StaffLoadBalancer,
};
use civic_db::repositories::{
    CategoryRoleRepository, CompanyRepository, InternalCommentRepository, MessageRepository,
    NotificationRepository, PhotoRepository, ReportRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "civic_server=debug,civic_api=debug,civic_core=debug,civic_db=debug,tower_http=debug"
                    .into()
            }),
        )
        .init();

    info!("Starting civic-report server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = civic_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    civic_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let report_repo = ReportRepository::new(Arc::clone(&db));
    let photo_repo = PhotoRepository::new(Arc::clone(&db));
    let company_repo = CompanyRepository::new(Arc::clone(&db));
    let category_role_repo = CategoryRoleRepository::new(Arc::clone(&db));
    let comment_repo = InternalCommentRepository::new(Arc::clone(&db));
    let message_repo = MessageRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Assignment pipeline: category -> responsible role -> least-loaded staff
    let resolver = CategoryRoleResolver::new(category_role_repo);
    let balancer = StaffLoadBalancer::new(user_repo.clone(), report_repo.clone());

    let storage: Arc<dyn PhotoStorage> = Arc::new(LocalPhotoStorage::new(
        PathBuf::from(&config.storage.base_path),
        config.storage.base_url.clone(),
    ));
    let service_area = ServiceArea::from_config(&config.geofence);

    // Initialize services
    let notification_service = NotificationService::new(notification_repo);
    let report_service = ReportService::new(
        report_repo.clone(),
        photo_repo,
        user_repo.clone(),
        company_repo,
        resolver,
        balancer,
        storage,
        service_area,
        config.map.cluster_zoom_threshold,
    );
    let comment_service =
        InternalCommentService::new(comment_repo, report_repo.clone(), user_repo.clone());
    let message_service =
        MessageService::new(message_repo, report_repo, notification_service.clone());

    // Create app state
    let state = AppState {
        report_service,
        comment_service,
        message_service,
        notification_service,
        user_repository: user_repo,
    };

    // Build router
    let app = Router::new()
        .nest("/api", civic_api::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            civic_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
