use axum::{
    body::Body,
    http::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::Span;

use crate::api::{auth, preferences, todos};
use crate::config::Config;
use crate::crypto::EmailCipher;
use crate::db::Store;
use crate::error::AppError;

pub struct AppState {
    pub store: Store,
    pub emails: EmailCipher,
    pub config: Config,
}

impl AppState {
    /// Opens (and if needed creates) the data files under `config.data_dir`.
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let store = Store::open(&config.data_dir).await?;
        let emails = EmailCipher::new(&config.encryption_key)?;
        Ok(Self {
            store,
            emails,
            config,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.cookie_secure)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            state.config.session_ttl_hours,
        )));

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(PropagateRequestIdLayer::x_request_id());

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route("/todos/stats", get(todos::todo_stats))
        .route("/todos/categories", get(todos::todo_categories))
        .route(
            "/todos/{id}",
            put(todos::update_todo).delete(todos::delete_todo),
        )
        .route(
            "/user/preferences",
            get(preferences::get_preferences).post(preferences::update_preferences),
        )
        .layer(sessions)
        .layer(middleware)
        .with_state(state)
}

fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id
    )
}

pub async fn start_server(config: Config) -> Result<(), AppError> {
    let addr = config.server_address();
    let state = Arc::new(AppState::new(config).await?);
    tracing::info!(data_dir = %state.config.data_dir.display(), "data files ready");

    let app = router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
