//! Structured meeting minutes: the data model, the generator boundary, and
//! plain-text export.

pub mod export;
pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gemini::GeminiGenerator;

/// One assigned follow-up from the meeting. Task and owner are always
/// present; the deadline only when one was mentioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub task: String,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

/// The structured minutes record. Field names match the wire schema the
/// generator declares, so this type deserializes the model output directly.
/// Every list is required; an empty meeting yields empty lists, never
/// missing ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinutesResult {
    pub summary: String,
    pub key_points: Vec<String>,
    pub decisions: Vec<String>,
    pub action_items: Vec<ActionItem>,
    pub next_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_transcript: Option<String>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("the model returned an empty response; retry with clearer audio")]
    EmptyResponse,
    #[error("malformed response from the model: {0}")]
    MalformedResponse(#[from] serde_json::Error),
    #[error("minutes API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("minutes request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Boundary to the AI collaborator: one audio payload in, one structured
/// minutes record out. No retries: a failure surfaces directly.
#[async_trait]
pub trait MinutesGenerator: Send + Sync {
    async fn generate(
        &self,
        audio_base64: &str,
        mime_type: &str,
    ) -> Result<MinutesResult, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_parse_camel_case() {
        let json = r#"{
            "summary": "Quarterly sync.",
            "keyPoints": ["Budget reviewed"],
            "decisions": ["Ship in May"],
            "actionItems": [{"task": "Draft plan", "owner": "Asha", "deadline": "2026-05-01"}],
            "nextSteps": ["Schedule follow-up"]
        }"#;

        let minutes: MinutesResult = serde_json::from_str(json).unwrap();
        assert_eq!(minutes.key_points, vec!["Budget reviewed"]);
        assert_eq!(minutes.action_items[0].owner, "Asha");
        assert_eq!(minutes.action_items[0].deadline.as_deref(), Some("2026-05-01"));
        assert!(minutes.raw_transcript.is_none());
    }

    #[test]
    fn test_missing_list_field_is_malformed() {
        // keyPoints absent: the schema requires it, so parsing must fail
        let json = r#"{
            "summary": "s",
            "decisions": [],
            "actionItems": [],
            "nextSteps": []
        }"#;
        assert!(serde_json::from_str::<MinutesResult>(json).is_err());
    }

    #[test]
    fn test_action_item_without_deadline() {
        let json = r#"{"task": "t", "owner": "o"}"#;
        let item: ActionItem = serde_json::from_str(json).unwrap();
        assert!(item.deadline.is_none());

        let back = serde_json::to_string(&item).unwrap();
        assert!(!back.contains("deadline"));
    }

    #[test]
    fn test_empty_lists_are_valid() {
        let json = r#"{
            "summary": "Insufficient audio data captured.",
            "keyPoints": [],
            "decisions": [],
            "actionItems": [],
            "nextSteps": []
        }"#;
        let minutes: MinutesResult = serde_json::from_str(json).unwrap();
        assert!(minutes.key_points.is_empty());
    }
}
