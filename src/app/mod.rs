//! Service wiring: configuration, credential check, session machine, API
//! server, and the command loop.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::api::{ApiCommand, ApiServer, SessionApiState};
use crate::audio::{LiveCapture, MicControlHandle};
use crate::config::{self, Config};
use crate::global;
use crate::minutes::GeminiGenerator;
use crate::session::{
    ResetOutcome, SessionMachine, SessionOptions, StartOutcome, StopOutcome,
};
use crate::session::SessionStatusHandle;

pub async fn run_service() -> Result<()> {
    info!("Starting momsync service");

    let config = Config::load()?;

    // The credential is required up front: a session that records fine but
    // cannot generate minutes would only fail after the meeting is over
    let api_key = config::api_key_from_env()?;

    let controls = MicControlHandle::new(config.capture.mic_enabled, config.capture.sensitivity);
    let status = SessionStatusHandle::default();

    let capture = LiveCapture::new(
        config.capture.clone(),
        controls.clone(),
        config.ui.visualizer,
    );
    let generator = GeminiGenerator::new(
        api_key,
        config.minutes.endpoint.clone(),
        config.minutes.model.clone(),
    );

    let recordings_dir = global::recordings_dir().context("Cannot resolve recordings dir")?;
    let mut machine = SessionMachine::new(
        Box::new(capture),
        Box::new(generator),
        status.clone(),
        SessionOptions {
            copy_to_clipboard: config.behavior.copy_to_clipboard,
            keep_recordings: config.behavior.keep_recordings,
            recordings_dir,
        },
    );

    let (tx, mut rx) = mpsc::channel::<ApiCommand>(10);
    let api_server = ApiServer::new(
        config.api.port,
        SessionApiState {
            tx,
            status: status.clone(),
            controls: controls.clone(),
        },
    );
    tokio::spawn(async move {
        if let Err(e) = api_server.start().await {
            error!("API server failed: {}", e);
        }
    });

    info!("momsync is ready!");
    info!(
        "Start a session: curl -X POST http://127.0.0.1:{}/start",
        config.api.port
    );

    while let Some(command) = rx.recv().await {
        match command {
            ApiCommand::Start => match machine.start().await {
                Ok(StartOutcome::Started) => info!("Recording started"),
                Ok(StartOutcome::Ignored(phase)) => {
                    info!("Start ignored, session is {}", phase.as_str())
                }
                Err(e) => error!("Failed to start capture: {}", e),
            },
            ApiCommand::Stop => match machine.stop().await {
                StopOutcome::Completed => info!("Session complete, minutes ready"),
                StopOutcome::Failed => warn!("Session ended in error"),
                StopOutcome::Ignored(phase) => {
                    info!("Stop ignored, session is {}", phase.as_str())
                }
            },
            ApiCommand::Reset => match machine.reset().await {
                ResetOutcome::Reset => info!("Session reset"),
                ResetOutcome::Ignored(phase) => {
                    info!("Reset ignored, session is {}", phase.as_str())
                }
            },
        }
    }

    Ok(())
}
