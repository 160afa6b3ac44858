//! HTTP routes over a loaded [`Dataset`].
//!
//! - `GET /user/{id}`
//! - `GET /user/{id}/actions/count`
//! - `GET /action/{type}/next`
//! - `GET /users/referral-index`
//! - `GET /health`

use crate::dataset::Dataset;
use crate::error::ServeError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Where to read the inputs from and where to listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub users_path: PathBuf,
    pub actions_path: PathBuf,
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            users_path: PathBuf::from("users.json"),
            actions_path: PathBuf::from("actions.json"),
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load the dataset this config points at.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::Load`] if either input fails to load.
    pub fn load_dataset(&self) -> Result<Dataset, ServeError> {
        Ok(Dataset::builder()
            .users_path(&self.users_path)
            .actions_path(&self.actions_path)
            .open()?)
    }

    fn socket_addr(&self) -> Result<SocketAddr, ServeError> {
        self.addr.parse().map_err(|source| ServeError::Addr {
            addr: self.addr.clone(),
            source,
        })
    }
}

type AppState = Arc<Dataset>;

#[derive(Debug, Serialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Serialize)]
struct HealthResponse<'a> {
    status: &'static str,
    version: &'static str,
    fingerprint: &'a str,
    users: usize,
    actions: usize,
}

/// Build the router. The dataset is shared read-only by every handler.
pub fn router(dataset: Arc<Dataset>) -> Router {
    Router::new()
        .route("/user/{id}", get(get_user))
        .route("/user/{id}/actions/count", get(get_user_action_count))
        .route("/action/{type}/next", get(get_next_action_probabilities))
        .route("/users/referral-index", get(get_referral_index))
        .route("/health", get(health))
        .with_state(dataset)
}

/// Bind `config.addr` and serve `dataset` until Ctrl-C.
///
/// # Errors
///
/// Returns [`ServeError`] if the address is invalid, binding fails, or the
/// server stops with an I/O error.
pub async fn serve(config: &ServerConfig, dataset: Dataset) -> Result<(), ServeError> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    log::info!("actionfold: listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(Arc::new(dataset)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("actionfold: server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("actionfold: failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

// Ids that don't parse as integers can't match any record, so they are
// treated as unknown ids rather than rejected.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

async fn get_user(State(dataset): State<AppState>, Path(id): Path<String>) -> Response {
    match parse_id(&id).and_then(|id| dataset.user_by_id(id)) {
        Some(user) => Json(user.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "User not found").into_response(),
    }
}

async fn get_user_action_count(
    State(dataset): State<AppState>,
    Path(id): Path<String>,
) -> Json<CountResponse> {
    let count = parse_id(&id).map_or(0, |id| dataset.user_action_count(id));
    Json(CountResponse { count })
}

async fn get_next_action_probabilities(
    State(dataset): State<AppState>,
    Path(action_type): Path<String>,
) -> Json<BTreeMap<String, f64>> {
    Json(dataset.next_action_probabilities(&action_type))
}

async fn get_referral_index(State(dataset): State<AppState>) -> Json<BTreeMap<i64, u64>> {
    Json(dataset.referral_index())
}

async fn health(State(dataset): State<AppState>) -> Response {
    let stats = dataset.stats();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        fingerprint: dataset.fingerprint(),
        users: stats.users,
        actions: stats.actions,
    })
    .into_response()
}
