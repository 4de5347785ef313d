//! Ballot server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use ballot_api::{AppState, auth_middleware, router as api_router};
use ballot_common::Config;
use ballot_core::{ActivityLog, AnalyticsService, ExpiryTracker, PollService};
use ballot_db::repositories::{PollOptionRepository, PollRepository, PollVoteRepository};
use tokio::signal;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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

/// Periodically queue polls entering the expiry window.
fn spawn_expiry_sweeper(analytics: AnalyticsService, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match analytics.sweep_expiring(None).await {
                Ok(report) => {
                    tracing::debug!(queue_size = report.queue_size, "Expiry sweep finished");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Expiry sweep failed");
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ballot=debug,tower_http=debug".into()),
        )
        .init();

    if dotenvy::dotenv().is_ok() {
        info!("Loaded .env file");
    }

    info!("Starting ballot server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = ballot_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    ballot_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    // Process-wide engine state
    let activity = Arc::new(Mutex::new(ActivityLog::new(
        config.analytics.activity_capacity,
    )));
    let expiry = Arc::new(Mutex::new(ExpiryTracker::new()));

    // Initialize repositories
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let option_repo = PollOptionRepository::new(Arc::clone(&db));
    let vote_repo = PollVoteRepository::new(Arc::clone(&db));

    // Initialize services
    let poll_service = PollService::new(
        poll_repo.clone(),
        option_repo.clone(),
        vote_repo,
        Arc::clone(&activity),
    );
    let analytics_service = AnalyticsService::new(
        poll_repo,
        option_repo,
        activity,
        expiry,
        config.analytics.clone(),
    );

    if config.analytics.sweep_interval_secs > 0 {
        spawn_expiry_sweeper(
            analytics_service.clone(),
            Duration::from_secs(config.analytics.sweep_interval_secs),
        );
        info!(
            every_secs = config.analytics.sweep_interval_secs,
            window_minutes = config.analytics.expiry_window_minutes,
            "Expiry sweeper started"
        );
    }

    let state = AppState {
        poll_service,
        analytics_service,
    };

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn(auth_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
