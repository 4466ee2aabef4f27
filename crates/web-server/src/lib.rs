use axum::{routing::get, Router};
use database::DbRepository;
use events::StatusReader;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;
pub mod template;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub status: StatusReader,
    pub db_repo: DbRepository,
    /// Shown in the page heading.
    pub symbol: String,
}

/// Builds the dashboard router. Split from `run_server` so tests can drive it directly.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/", get(handlers::index))
        .route("/status", get(handlers::get_status))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/trades", get(handlers::get_trades))
        .route("/api/prices", get(handlers::get_prices))
        .route("/api/errors", get(handlers::get_errors))
        .with_state(Arc::new(state))
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Binds `addr` and serves the dashboard until the task is dropped.
pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Dashboard listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
