//! Purpose: Serve the dashboard page and its JSON endpoints over HTTP.
//! Exports: `ServeConfig`, `serve`, `init_tracing`.
//! Role: Axum server; every control change on the page is one POST handled here.
//! Invariants: Handlers only read the shared table; nothing is written after startup.
//! Invariants: Error bodies use the `{"error":{"kind","message"}}` envelope.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tokio::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use exportboard::api::{ChartRequest, Dashboard, Error, ErrorKind, LookupRequest};

const INDEX_HTML: &str = include_str!("../ui/index.html");

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
}

struct AppState {
    dashboard: Dashboard,
}

pub async fn serve(config: ServeConfig, dashboard: Dashboard) -> Result<(), Error> {
    let state = Arc::new(AppState { dashboard });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to bind {}", config.bind))
                .with_hint("Pick another --port or set PORT.")
                .with_source(err)
        })?;
    info!(bind = %config.bind, "dashboard listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            info!("shutting down");
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/options", get(options))
        .route("/api/chart", post(chart))
        .route("/api/lookup", post(lookup))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Logs go to stderr so CLI commands keep stdout for JSON.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Response {
    json_response(json!({ "ok": true, "rows": state.dashboard.table().len() }))
}

async fn options(State(state): State<Arc<AppState>>) -> Response {
    json_response(json!({ "options": state.dashboard.options() }))
}

async fn chart(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChartRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(rejection_error(rejection)),
    };
    json_response(json!({ "figure": state.dashboard.chart(&request) }))
}

async fn lookup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LookupRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(rejection_error(rejection)),
    };
    json_response(json!({ "lookup": state.dashboard.lookup(&request) }))
}

async fn not_found() -> Response {
    error_response(Error::new(ErrorKind::NotFound).with_message("no such route"))
}

fn rejection_error(rejection: JsonRejection) -> Error {
    Error::new(ErrorKind::Usage)
        .with_message(format!("invalid request body: {}", rejection.body_text()))
        .with_source(rejection)
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

fn json_response(payload: serde_json::Value) -> Response {
    Json(payload).into_response()
}

fn error_response(err: Error) -> Response {
    let status = match err.kind() {
        ErrorKind::Usage => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Format | ErrorKind::Io | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let body = ErrorEnvelope {
        error: ErrorBody {
            kind: format!("{:?}", err.kind()),
            message: err.message().unwrap_or("error").to_string(),
            hint: err.hint().map(str::to_string),
        },
    };
    (status, Json(body)).into_response()
}
