use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stickerbot::apis::foursquare::FoursquareCatalog;
use stickerbot::catalog::CatalogStore;
use stickerbot::error::StickerError;
use stickerbot::refresh::{RefreshOutcome, RefreshScheduler};
use stickerbot::slack::{Attachment, SlackPayload, SlackWebhook};
use stickerbot::types::{CatalogSource, ChatSink};

/// Serves `app` on an ephemeral local port.
fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service())
            .await
            .unwrap();
    });
    addr
}

fn payload() -> SlackPayload {
    SlackPayload {
        username: "ana".into(),
        icon_emoji: ":thief:".into(),
        channel: "C024BE91L".into(),
        text: None,
        attachments: vec![Attachment {
            fallback: "Explorer".into(),
            color: "#ffa633".into(),
            image_url: "https://img.example.com/sticker/94/explorer.png".into(),
        }],
    }
}

#[tokio::test]
async fn slack_error_status_becomes_delivery_error() {
    let app = Router::new().route(
        "/hook",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = serve(app);

    let err = SlackWebhook::new(format!("http://{addr}/hook"))
        .post(&payload())
        .await
        .unwrap_err();

    assert!(matches!(err, StickerError::Delivery { .. }));
    assert_eq!(err.to_string(), "Error posting to Slack: Got code 500\n\nboom");
}

#[tokio::test]
async fn slack_receives_form_encoded_payload() {
    let received: Arc<Mutex<Option<String>>> = Arc::default();
    let app = Router::new()
        .route(
            "/hook",
            post(
                |State(received): State<Arc<Mutex<Option<String>>>>,
                 Form(form): Form<HashMap<String, String>>| async move {
                    *received.lock() = form.get("payload").cloned();
                    "ok"
                },
            ),
        )
        .with_state(received.clone());
    let addr = serve(app);

    SlackWebhook::new(format!("http://{addr}/hook"))
        .post(&payload())
        .await
        .unwrap();

    let body = received.lock().clone().unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["channel"], "C024BE91L");
    assert_eq!(value["attachments"][0]["fallback"], "Explorer");
    assert!(value.get("text").is_none());
}

#[tokio::test]
async fn slack_transport_error_has_the_same_shape() {
    let addr = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();

    let err = SlackWebhook::new(format!("http://{addr}/hook"))
        .post(&payload())
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("Error posting to Slack: "));
    assert!(message.ends_with("\n\n"));
}

#[derive(Clone, Default)]
struct CatalogServer {
    calls: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

/// First call answers with one sticker, every later call with a 500.
async fn catalog_handler(
    State(server): State<CatalogServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    server.queries.lock().push(query);
    if server.calls.fetch_add(1, Ordering::SeqCst) > 0 {
        return (StatusCode::INTERNAL_SERVER_ERROR, "down").into_response();
    }
    Json(json!({
        "meta": {"code": 200},
        "response": {"stickers": [
            {"id": "4f4a7c3ce4b0f1a2b3c4d5e6", "name": "Explorer",
             "image": {"prefix": "https://img/", "name": "/e.png", "sizes": [60, 94]}}
        ]}
    }))
    .into_response()
}

fn catalog_server() -> (CatalogServer, String) {
    let server = CatalogServer::default();
    let app = Router::new()
        .route("/v2/stickers/all", get(catalog_handler))
        .with_state(server.clone());
    let addr = serve(app);
    (server, format!("http://{addr}/v2/stickers/all"))
}

#[tokio::test]
async fn catalog_fetch_sends_token_version_and_mode() {
    let (server, url) = catalog_server();

    let records = FoursquareCatalog::new(url, "fsq-token").fetch().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name.as_deref(), Some("Explorer"));

    let queries = server.queries.lock();
    let query = &queries[0];
    assert_eq!(query["oauth_token"], "fsq-token");
    assert_eq!(query["m"], "swarm");
    assert_eq!(query["v"].len(), 8);
    assert!(query["v"].chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn catalog_error_status_keeps_the_prior_snapshot() {
    let (server, url) = catalog_server();
    let source: Arc<dyn CatalogSource> = Arc::new(FoursquareCatalog::new(url, "fsq-token"));
    let catalog = Arc::new(CatalogStore::new());
    let scheduler = RefreshScheduler::new(catalog.clone(), source.clone(), Duration::from_secs(3600));

    assert_eq!(
        scheduler.refresh().await,
        RefreshOutcome::Replaced { entries: 1, dropped: 0 }
    );

    let err = source.fetch().await.unwrap_err();
    assert!(matches!(&err, StickerError::Api { message } if message == "Got code 500"));

    assert!(matches!(scheduler.refresh().await, RefreshOutcome::Failed(_)));
    assert_eq!(catalog.len(), 1);
    assert!(catalog.find_by_id("4f4a7c3ce4b0f1a2b3c4d5e6").is_some());
    assert_eq!(server.calls.load(Ordering::SeqCst), 3);
}
