//! Session lifecycle orchestrator.
//!
//! Drives the pipeline start → stop → generate → result/error → reset.
//! All collaborators are injected via the constructor, so the machine can be
//! exercised with fake capture and a fake generator.

use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::{error, info, warn};

use crate::audio::{CaptureError, CapturePort, RecordingBlob};
use crate::minutes::{export, MinutesGenerator};

use super::status::{SessionPhase, SessionStatusHandle};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub copy_to_clipboard: bool,
    pub keep_recordings: bool,
    pub recordings_dir: PathBuf,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// The phase does not accept a start; nothing changed.
    Ignored(SessionPhase),
}

#[derive(Debug, PartialEq, Eq)]
pub enum StopOutcome {
    /// Minutes generated; session is in Result.
    Completed,
    /// Generation failed; session is in Error.
    Failed,
    /// The phase does not accept a stop; nothing changed.
    Ignored(SessionPhase),
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResetOutcome {
    Reset,
    Ignored(SessionPhase),
}

pub struct SessionMachine {
    capture: Box<dyn CapturePort>,
    generator: Box<dyn MinutesGenerator>,
    status: SessionStatusHandle,
    options: SessionOptions,
}

impl SessionMachine {
    pub fn new(
        capture: Box<dyn CapturePort>,
        generator: Box<dyn MinutesGenerator>,
        status: SessionStatusHandle,
        options: SessionOptions,
    ) -> Self {
        Self {
            capture,
            generator,
            status,
            options,
        }
    }

    /// Begin a capture session. Accepted only from Idle.
    ///
    /// Acquisition failures stay local: the session remains Idle and the
    /// error is returned for inline display, recoverable by calling `start`
    /// again.
    pub async fn start(&mut self) -> Result<StartOutcome, CaptureError> {
        let phase = self.status.phase().await;
        if phase != SessionPhase::Idle {
            warn!("Start ignored while {}", phase.as_str());
            return Ok(StartOutcome::Ignored(phase));
        }

        self.capture.open().await?;
        self.status.recording().await;
        info!("Session recording");
        Ok(StartOutcome::Started)
    }

    /// Stop the capture and run the minutes round trip. Accepted only from
    /// Recording; a no-op otherwise.
    pub async fn stop(&mut self) -> StopOutcome {
        let phase = self.status.phase().await;
        if phase != SessionPhase::Recording {
            warn!("Stop ignored while {}", phase.as_str());
            return StopOutcome::Ignored(phase);
        }

        let blob = self.capture.close().await;
        self.status.processing().await;

        let blob = match blob {
            Some(blob) if !blob.bytes.is_empty() => blob,
            _ => {
                error!("Session produced no audio");
                self.status
                    .error("No audio was captured during the session".to_string())
                    .await;
                return StopOutcome::Failed;
            }
        };

        if self.options.keep_recordings {
            self.persist_recording(&blob);
        }

        info!(
            "Recording complete ({} bytes, {}), generating minutes",
            blob.bytes.len(),
            blob.mime_type
        );

        let payload = BASE64.encode(&blob.bytes);
        match self.generator.generate(&payload, &blob.mime_type).await {
            Ok(minutes) => {
                let text = export::render_plain_text(&minutes);
                self.status.result(minutes).await;
                info!("Minutes ready");

                if self.options.copy_to_clipboard {
                    match export::copy_to_clipboard(&text) {
                        Ok(()) => info!("Minutes copied to clipboard"),
                        Err(e) => warn!("Clipboard copy failed: {}", e),
                    }
                }

                StopOutcome::Completed
            }
            Err(e) => {
                error!("Minutes generation failed: {}", e);
                self.status.error(e.to_string()).await;
                StopOutcome::Failed
            }
        }
    }

    /// Return to Idle, clearing any stored result or error. Accepted only
    /// from Result and Error.
    pub async fn reset(&mut self) -> ResetOutcome {
        let phase = self.status.phase().await;
        match phase {
            SessionPhase::Result | SessionPhase::Error => {
                self.status.reset().await;
                info!("Session reset");
                ResetOutcome::Reset
            }
            other => {
                warn!("Reset ignored while {}", other.as_str());
                ResetOutcome::Ignored(other)
            }
        }
    }

    fn persist_recording(&self, blob: &RecordingBlob) {
        let dir = &self.options.recordings_dir;
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("Could not create recordings directory {:?}: {}", dir, e);
            return;
        }

        let path = self.recording_path(&blob.mime_type);
        match std::fs::write(&path, &blob.bytes) {
            Ok(()) => info!("Recording saved: {:?}", path),
            Err(e) => warn!("Failed to save recording {:?}: {}", path, e),
        }
    }

    fn recording_path(&self, mime_type: &str) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let ext = extension_for_mime(mime_type);
        let path = self
            .options
            .recordings_dir
            .join(format!("meeting-{}.{}", timestamp, ext));

        if path.exists() {
            for i in 1..100 {
                let alt = self
                    .options
                    .recordings_dir
                    .join(format!("meeting-{}-{}.{}", timestamp, i, ext));
                if !alt.exists() {
                    return alt;
                }
            }
        }

        path
    }
}

fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/wav" => "wav",
        "audio/webm" => "webm",
        "audio/mpeg" => "mp3",
        "audio/ogg" => "ogg",
        _ => "bin",
    }
}
