use crate::commands::{CommandHandler, SlashRequest};
use crate::metrics::CommandMetrics;
use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use hyper::Server;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<CommandHandler>,
    pub slack_token: Arc<str>,
    pub metrics: Option<PrometheusHandle>,
}

fn plain_text(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

async fn index() -> &'static str {
    "Nothing to see here."
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "stickerbot",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn metrics(State(state): State<AppState>) -> Response {
    let body = state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default();
    plain_text(StatusCode::OK, body)
}

/// Slash-command webhook
async fn sticker(State(state): State<AppState>, Form(request): Form<SlashRequest>) -> Response {
    if request.token != *state.slack_token {
        warn!(user = %request.user_name, "Rejected command with bad token");
        CommandMetrics::record_forbidden();
        return plain_text(StatusCode::FORBIDDEN, "Forbidden".to_string());
    }
    let reply = state.handler.handle(&request).await;
    plain_text(StatusCode::OK, reply)
}

/// Create the HTTP router with all routes
pub fn create_server(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/sticker", post(sticker))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_server(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Started on port {port}");

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
