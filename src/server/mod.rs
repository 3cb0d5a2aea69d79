//! HTTP control panel
//!
//! The boundary layer: translates panel requests into worker commands via
//! the supervisor, renders responses, and pushes drained monitor results
//! over a WebSocket. The supervisor lives in explicit shared state that is
//! handed to every handler; there is no process-wide singleton.

mod routes;
mod ws;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tokio::sync::RwLock;

use crate::config::ApiCredentials;
use crate::error::Result;
use crate::protocol::{Command, Response};
use crate::supervisor::Supervisor;

/// Shared state behind every panel handler
pub struct AppState {
    supervisor: RwLock<Option<Arc<Supervisor>>>,
    config_path: PathBuf,
}

/// Handle to the shared panel state
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create panel state persisting credentials at `config_path`
    #[must_use]
    pub fn new(config_path: PathBuf) -> SharedState {
        Arc::new(Self {
            supervisor: RwLock::new(None),
            config_path,
        })
    }

    /// The current supervisor, if one has been configured and started
    pub async fn supervisor(&self) -> Option<Arc<Supervisor>> {
        self.supervisor.read().await.clone()
    }

    /// Install a new supervisor, stopping any previous one
    pub async fn replace_supervisor(&self, supervisor: Arc<Supervisor>) {
        let previous = self.supervisor.write().await.replace(supervisor);
        if let Some(previous) = previous {
            previous.stop().await;
        }
    }

    /// Start a supervisor from the persisted credential record
    ///
    /// Returns false when no record exists yet.
    ///
    /// # Errors
    /// Returns error if the record is unreadable or the worker cannot be
    /// spawned
    pub async fn init_from_config(&self) -> Result<bool> {
        let Some(credentials) = ApiCredentials::load(&self.config_path)? else {
            return Ok(false);
        };
        let supervisor = Arc::new(Supervisor::new(credentials)?);
        supervisor.start().await?;
        self.replace_supervisor(supervisor).await;
        Ok(true)
    }

    /// Stop the supervisor, if any
    pub async fn shutdown(&self) {
        if let Some(supervisor) = self.supervisor.write().await.take() {
            supervisor.stop().await;
        }
    }
}

/// Build the panel router
#[must_use]
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/config", get(routes::get_config).post(routes::set_config))
        .route("/api/connect", post(routes::connect))
        .route("/api/send_code", post(routes::send_code))
        .route("/api/verify", post(routes::verify))
        .route("/api/dialogs", get(routes::dialogs))
        .route("/api/start_monitor", post(routes::start_monitor))
        .route("/api/stop_monitor", post(routes::stop_monitor))
        .route("/api/results", get(routes::results))
        .route("/ws", get(ws::results_stream))
        .with_state(state)
}

/// Serve the control panel until interrupted, then stop the worker
///
/// On startup the persisted credential record, when present, brings the
/// supervisor up and a `connect` probe reports whether a previous login is
/// still valid.
///
/// # Errors
/// Returns error if the listener cannot be bound or the server fails
pub async fn serve(state: SharedState, addr: SocketAddr) -> anyhow::Result<()> {
    match state.init_from_config().await {
        Ok(true) => {
            if let Some(supervisor) = state.supervisor().await {
                let _ = supervisor.send_command(&Command::Connect).await;
                if let Some(Response::ConnectResponse {
                    is_authorized: Some(true),
                    ..
                }) = supervisor.get_response(Duration::from_secs(3), None).await
                {
                    log::info!("existing login detected");
                }
            }
            log::info!("system ready");
        }
        Ok(false) => log::info!("waiting for API credentials"),
        Err(error) => log::error!("failed to start worker supervisor: {error}"),
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown_state = state.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutting down");
        })
        .await?;

    shutdown_state.shutdown().await;
    Ok(())
}
