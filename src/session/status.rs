//! Session phase types and the shared state handle.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::minutes::MinutesResult;

/// Phase of the capture-to-minutes lifecycle. Exactly one is active;
/// transitions are strictly linear (idle → recording → processing →
/// result | error → idle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Recording,
    Processing,
    Result,
    Error,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Processing => "processing",
            Self::Result => "result",
            Self::Error => "error",
        }
    }
}

/// Current session state, readable by API handlers.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub minutes: Option<MinutesResult>,
    pub last_error: Option<String>,
}

impl Default for SessionPhase {
    fn default() -> Self {
        Self::Idle
    }
}

impl SessionState {
    /// Seconds since recording started, for the elapsed-time display.
    pub fn duration_seconds(&self) -> Option<u64> {
        self.started_at.map(|started| {
            let elapsed = chrono::Utc::now() - started;
            elapsed.num_seconds().max(0) as u64
        })
    }
}

/// Thread-safe handle for sharing session state between the machine and the
/// API handlers.
#[derive(Clone, Default)]
pub struct SessionStatusHandle {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionStatusHandle {
    pub async fn get(&self) -> SessionState {
        self.inner.lock().await.clone()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.phase
    }

    pub async fn recording(&self) {
        let mut state = self.inner.lock().await;
        state.phase = SessionPhase::Recording;
        state.started_at = Some(chrono::Utc::now());
        state.minutes = None;
        state.last_error = None;
    }

    pub async fn processing(&self) {
        let mut state = self.inner.lock().await;
        state.phase = SessionPhase::Processing;
    }

    pub async fn result(&self, minutes: MinutesResult) {
        let mut state = self.inner.lock().await;
        state.phase = SessionPhase::Result;
        state.minutes = Some(minutes);
    }

    pub async fn error(&self, message: String) {
        let mut state = self.inner.lock().await;
        state.phase = SessionPhase::Error;
        state.last_error = Some(message);
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        *state = SessionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes_fixture() -> MinutesResult {
        MinutesResult {
            summary: "Summary".to_string(),
            key_points: vec![],
            decisions: vec![],
            action_items: vec![],
            next_steps: vec![],
            raw_transcript: None,
        }
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(SessionPhase::Idle.as_str(), "idle");
        assert_eq!(SessionPhase::Recording.as_str(), "recording");
        assert_eq!(SessionPhase::Processing.as_str(), "processing");
        assert_eq!(SessionPhase::Result.as_str(), "result");
        assert_eq!(SessionPhase::Error.as_str(), "error");
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&SessionPhase::Processing).unwrap();
        assert_eq!(json, "\"processing\"");

        let parsed: SessionPhase = serde_json::from_str("\"result\"").unwrap();
        assert_eq!(parsed, SessionPhase::Result);
    }

    #[tokio::test]
    async fn test_recording_stamps_start_time() {
        let handle = SessionStatusHandle::default();
        handle.recording().await;

        let state = handle.get().await;
        assert_eq!(state.phase, SessionPhase::Recording);
        assert!(state.started_at.is_some());
        assert_eq!(state.duration_seconds(), Some(0));
    }

    #[tokio::test]
    async fn test_result_stores_minutes() {
        let handle = SessionStatusHandle::default();
        handle.recording().await;
        handle.processing().await;
        handle.result(minutes_fixture()).await;

        let state = handle.get().await;
        assert_eq!(state.phase, SessionPhase::Result);
        assert!(state.minutes.is_some());
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_error_stores_message() {
        let handle = SessionStatusHandle::default();
        handle.error("boom".to_string()).await;

        let state = handle.get().await;
        assert_eq!(state.phase, SessionPhase::Error);
        assert_eq!(state.last_error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let handle = SessionStatusHandle::default();
        handle.recording().await;
        handle.result(minutes_fixture()).await;
        handle.reset().await;

        let state = handle.get().await;
        assert_eq!(state.phase, SessionPhase::Idle);
        assert!(state.started_at.is_none());
        assert!(state.minutes.is_none());
        assert!(state.last_error.is_none());
    }
}
