//! Session control endpoints.
//!
//! Start, stop, and reset flow as commands over a channel into the service
//! loop (the machine owns non-Send audio resources and must stay on its own
//! task); status, minutes, and mic controls are served directly from the
//! shared handles.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::info;

use crate::audio::gate::{MAX_SENSITIVITY, MIN_SENSITIVITY};
use crate::audio::MicControlHandle;
use crate::minutes::MinutesResult;
use crate::session::SessionStatusHandle;

use super::super::error::{ApiError, ApiResult};

#[derive(Clone, Copy, Debug)]
pub enum ApiCommand {
    Start,
    Stop,
    Reset,
}

#[derive(Clone)]
pub struct SessionApiState {
    pub tx: mpsc::Sender<ApiCommand>,
    pub status: SessionStatusHandle,
    pub controls: MicControlHandle,
}

pub fn router(state: SessionApiState) -> Router {
    Router::new()
        .route("/start", post(start_session))
        .route("/stop", post(stop_session))
        .route("/reset", post(reset_session))
        .route("/status", get(session_status))
        .route("/minutes", get(session_minutes))
        .route("/mic", post(set_mic))
        .route("/sensitivity", post(set_sensitivity))
        .with_state(state)
}

async fn send_command(state: &SessionApiState, command: ApiCommand) -> ApiResult<Json<Value>> {
    info!("{:?} command received via API", command);

    state
        .tx
        .send(command)
        .await
        .map_err(|e| ApiError::internal(format!("Service loop unavailable: {}", e)))?;

    // Give the loop a beat to apply the transition before reporting back
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    let status = state.status.get().await;
    Ok(Json(json!({
        "success": true,
        "phase": status.phase.as_str(),
    })))
}

async fn start_session(State(state): State<SessionApiState>) -> ApiResult<Json<Value>> {
    send_command(&state, ApiCommand::Start).await
}

async fn stop_session(State(state): State<SessionApiState>) -> ApiResult<Json<Value>> {
    send_command(&state, ApiCommand::Stop).await
}

async fn reset_session(State(state): State<SessionApiState>) -> ApiResult<Json<Value>> {
    send_command(&state, ApiCommand::Reset).await
}

async fn session_status(State(state): State<SessionApiState>) -> Json<Value> {
    let status = state.status.get().await;

    // The elapsed counter only runs while recording
    let elapsed_seconds = match status.phase {
        crate::session::SessionPhase::Recording => status.duration_seconds(),
        _ => None,
    };

    Json(json!({
        "phase": status.phase.as_str(),
        "elapsed_seconds": elapsed_seconds,
        "mic": {
            "enabled": state.controls.is_enabled(),
            "audible": state.controls.is_audible(),
            "sensitivity": state.controls.sensitivity(),
        },
        "error": status.last_error,
    }))
}

async fn session_minutes(
    State(state): State<SessionApiState>,
) -> ApiResult<Json<MinutesResult>> {
    let status = state.status.get().await;
    match status.minutes {
        Some(minutes) => Ok(Json(minutes)),
        None => Err(ApiError::not_found("No minutes available yet")),
    }
}

#[derive(Debug, Deserialize)]
pub struct MicRequest {
    pub enabled: bool,
}

/// Manual mic toggle. Takes precedence over voice detection: disabling
/// forces the mic out of the mix entirely.
async fn set_mic(
    State(state): State<SessionApiState>,
    Json(req): Json<MicRequest>,
) -> Json<Value> {
    state.controls.set_enabled(req.enabled);
    info!(
        "Microphone capture {}",
        if req.enabled { "enabled" } else { "disabled" }
    );

    Json(json!({
        "success": true,
        "enabled": state.controls.is_enabled(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SensitivityRequest {
    pub value: u8,
}

async fn set_sensitivity(
    State(state): State<SessionApiState>,
    Json(req): Json<SensitivityRequest>,
) -> ApiResult<Json<Value>> {
    if !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&req.value) {
        return Err(ApiError::bad_request(format!(
            "Sensitivity must be between {} and {}",
            MIN_SENSITIVITY, MAX_SENSITIVITY
        )));
    }

    state.controls.set_sensitivity(req.value);
    Ok(Json(json!({
        "success": true,
        "sensitivity": state.controls.sensitivity(),
    })))
}
