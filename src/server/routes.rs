//! Panel request handlers
//!
//! Each handler maps one panel action onto the command/response protocol:
//! send the command, wait for the matching response with that action's
//! timeout, render the response as-is. Timeouts and a stopped worker come
//! back as structured failures, never as HTTP errors.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::response::Html;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::ApiCredentials;
use crate::protocol::{Command, ResponseKind};
use crate::supervisor::Supervisor;

use super::{AppState, SharedState};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const LOGIN_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const SEND_CODE_TIMEOUT: Duration = Duration::from_secs(30);
const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);
const DIALOGS_TIMEOUT: Duration = Duration::from_secs(10);
const MONITOR_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
pub(super) struct ApiConfigRequest {
    api_id: String,
    api_hash: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    phone: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct VerifyRequest {
    code: String,
    #[serde(default)]
    second_password: Option<String>,
}

fn default_interval() -> u64 {
    1
}

#[derive(Debug, Deserialize)]
pub(super) struct StartMonitorRequest {
    target_group_id: i64,
    keywords: Vec<String>,
    messages: Vec<String>,
    #[serde(default = "default_interval")]
    interval: u64,
}

fn not_ready() -> Json<Value> {
    Json(json!({ "success": false, "error": "进程管理器未初始化" }))
}

fn timed_out() -> Json<Value> {
    Json(json!({ "success": false, "error": "超时" }))
}

fn failure(error: impl std::fmt::Display) -> Json<Value> {
    Json(json!({ "success": false, "error": error.to_string() }))
}

/// Send a command and render the (optionally type-filtered) response
async fn dispatch(
    state: &AppState,
    command: Command,
    timeout: Duration,
    filter: Option<ResponseKind>,
) -> Json<Value> {
    let Some(supervisor) = state.supervisor().await else {
        return not_ready();
    };
    if let Err(error) = supervisor.send_command(&command).await {
        return failure(error);
    }
    match supervisor.get_response(timeout, filter).await {
        Some(response) => {
            Json(serde_json::to_value(response).unwrap_or_else(|_| json!({ "success": false })))
        }
        None => timed_out(),
    }
}

pub(super) async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

pub(super) async fn get_config(State(state): State<SharedState>) -> Json<Value> {
    let configured = matches!(ApiCredentials::load(&state.config_path), Ok(Some(_)));

    let mut is_logged_in = false;
    if configured {
        if let Some(supervisor) = state.supervisor().await {
            if supervisor.send_command(&Command::Connect).await.is_ok() {
                if let Some(crate::protocol::Response::ConnectResponse {
                    is_authorized: Some(true),
                    ..
                }) = supervisor.get_response(LOGIN_PROBE_TIMEOUT, None).await
                {
                    is_logged_in = true;
                }
            }
        }
    }

    let message = if configured {
        if is_logged_in {
            "API 已配置，已登录"
        } else {
            "API 已配置，未登录"
        }
    } else {
        "请先配置 API 凭证"
    };
    Json(json!({
        "configured": configured,
        "is_logged_in": is_logged_in,
        "message": message,
    }))
}

pub(super) async fn set_config(
    State(state): State<SharedState>,
    Json(request): Json<ApiConfigRequest>,
) -> Json<Value> {
    let credentials = match ApiCredentials::parse(&request.api_id, &request.api_hash) {
        Ok(credentials) => credentials,
        Err(error) => return failure(error),
    };

    // Spin the worker up before persisting anything: a credential record
    // that cannot even spawn a worker is rejected here.
    let supervisor = match Supervisor::new(credentials.clone()) {
        Ok(supervisor) => Arc::new(supervisor),
        Err(error) => return failure(error),
    };
    if let Err(error) = supervisor.start().await {
        log::error!("credential check failed: {error}");
        return failure(error);
    }

    if let Err(error) = credentials.save(&state.config_path) {
        supervisor.stop().await;
        log::error!("failed to persist credentials: {error}");
        return failure(error);
    }

    state.replace_supervisor(supervisor).await;
    log::info!("API credentials saved");
    Json(json!({ "success": true, "message": "配置成功" }))
}

pub(super) async fn connect(State(state): State<SharedState>) -> Json<Value> {
    dispatch(&state, Command::Connect, CONNECT_TIMEOUT, None).await
}

pub(super) async fn send_code(
    State(state): State<SharedState>,
    Json(request): Json<LoginRequest>,
) -> Json<Value> {
    dispatch(
        &state,
        Command::SendCode {
            phone: request.phone,
        },
        SEND_CODE_TIMEOUT,
        Some(ResponseKind::CodeSent),
    )
    .await
}

pub(super) async fn verify(
    State(state): State<SharedState>,
    Json(request): Json<VerifyRequest>,
) -> Json<Value> {
    let password = request
        .second_password
        .filter(|password| !password.trim().is_empty());
    dispatch(
        &state,
        Command::VerifyCode {
            code: request.code,
            password,
        },
        VERIFY_TIMEOUT,
        Some(ResponseKind::VerifyResponse),
    )
    .await
}

pub(super) async fn dialogs(State(state): State<SharedState>) -> Json<Value> {
    dispatch(
        &state,
        Command::GetDialogs,
        DIALOGS_TIMEOUT,
        Some(ResponseKind::DialogsResponse),
    )
    .await
}

pub(super) async fn start_monitor(
    State(state): State<SharedState>,
    Json(request): Json<StartMonitorRequest>,
) -> Json<Value> {
    dispatch(
        &state,
        Command::StartMonitor {
            target_group_id: request.target_group_id,
            keywords: request.keywords,
            messages: request.messages,
            interval: request.interval,
        },
        MONITOR_TIMEOUT,
        None,
    )
    .await
}

pub(super) async fn stop_monitor(State(state): State<SharedState>) -> Json<Value> {
    dispatch(&state, Command::StopMonitor, MONITOR_TIMEOUT, None).await
}

pub(super) async fn results(State(state): State<SharedState>) -> Json<Value> {
    let results = match state.supervisor().await {
        Some(supervisor) => supervisor.check_results().await,
        None => Vec::new(),
    };
    Json(json!({ "results": results }))
}
