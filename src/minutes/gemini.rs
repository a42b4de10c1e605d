//! Gemini-backed minutes generation.
//!
//! One `generateContent` call per session: a fixed instruction, the audio as
//! inline base64 data, and a declared JSON response schema. The model is
//! explicitly told to report insufficient audio rather than invent content
//! for silent recordings.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use super::{GenerationError, MinutesGenerator, MinutesResult};

const SYSTEM_INSTRUCTION: &str = "\
You are an expert executive assistant specializing in multilingual meeting \
transcription and summarization.

TASK:
- Process the provided audio recording from a corporate meeting.
- Handle mixed-language input and translate all non-English parts into \
professional, fluent English.
- Identify key speakers if possible from context.
- Generate structured minutes of the meeting.

CRITICAL RULES:
1. If the audio is silent or unintelligible noise, do not hallucinate. Set \
the summary to \"Insufficient audio data captured.\" and leave the lists empty.
2. Maintain a professional corporate tone.
3. Ensure action items are specific and include owners if mentioned.
4. Format the output strictly as valid JSON according to the provided schema.";

pub struct GeminiGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(api_key: String, endpoint: String, model: String) -> Self {
        info!("Initialized Gemini generator with model: {}", model);
        Self {
            client: reqwest::Client::new(),
            endpoint,
            model,
            api_key,
        }
    }

    fn request_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

/// The response schema Gemini is asked to conform to. `deadline` is the only
/// optional field.
fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "Professional summary of the meeting."
            },
            "keyPoints": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Primary discussion topics."
            },
            "decisions": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Decisions finalized in the session."
            },
            "actionItems": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "task": { "type": "STRING" },
                        "owner": { "type": "STRING" },
                        "deadline": { "type": "STRING" }
                    },
                    "required": ["task", "owner"]
                }
            },
            "nextSteps": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Upcoming milestones."
            }
        },
        "required": ["summary", "keyPoints", "decisions", "actionItems", "nextSteps"]
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Pull the first non-empty text part out of a generate response.
fn extract_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .find(|t| !t.trim().is_empty())
}

/// Parse candidate text into the minutes record.
fn parse_minutes(text: &str) -> Result<MinutesResult, GenerationError> {
    Ok(serde_json::from_str(text.trim())?)
}

#[async_trait]
impl MinutesGenerator for GeminiGenerator {
    async fn generate(
        &self,
        audio_base64: &str,
        mime_type: &str,
    ) -> Result<MinutesResult, GenerationError> {
        info!(
            "Submitting {} audio ({} base64 chars) for minutes generation",
            mime_type,
            audio_base64.len()
        );

        let body = json!({
            "systemInstruction": {
                "parts": [{ "text": SYSTEM_INSTRUCTION }]
            },
            "contents": [{
                "parts": [
                    { "text": "Generate the minutes of meeting based on this recording." },
                    {
                        "inlineData": {
                            "mimeType": mime_type,
                            "data": audio_base64
                        }
                    }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema()
            }
        });

        let response = self
            .client
            .post(self.request_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!(
                "Minutes request failed with status {}: {}",
                status, response_text
            );

            let message = serde_json::from_str::<ErrorResponse>(&response_text)
                .map(|e| e.error.message)
                .unwrap_or(response_text);

            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: GenerateResponse = serde_json::from_str(&response_text)?;
        let text = extract_text(envelope).ok_or(GenerationError::EmptyResponse)?;
        debug!("Raw minutes payload: {}", text);

        let minutes = parse_minutes(&text)?;
        info!(
            "Minutes generated: {} key points, {} decisions, {} action items",
            minutes.key_points.len(),
            minutes.decisions.len(),
            minutes.action_items.len()
        );
        Ok(minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_requires_all_but_deadline() {
        let schema = response_schema();
        let required = schema["required"].as_array().unwrap();
        for field in ["summary", "keyPoints", "decisions", "actionItems", "nextSteps"] {
            assert!(required.iter().any(|v| v == field), "{} missing", field);
        }
        let item_required = schema["properties"]["actionItems"]["items"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(item_required.len(), 2);
    }

    #[test]
    fn test_extract_text_finds_first_nonempty_part() {
        let envelope: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": ""}, {"text": "{\"a\":1}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(envelope).as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let envelope: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(extract_text(envelope).is_none());

        let envelope: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(extract_text(envelope).is_none());
    }

    #[test]
    fn test_parse_minutes_valid() {
        let text = r#"{
            "summary": "s",
            "keyPoints": ["k"],
            "decisions": [],
            "actionItems": [{"task": "t", "owner": "o"}],
            "nextSteps": ["n"]
        }"#;
        let minutes = parse_minutes(text).unwrap();
        assert_eq!(minutes.summary, "s");
    }

    #[test]
    fn test_parse_minutes_malformed() {
        let err = parse_minutes("the model rambled instead of emitting JSON").unwrap_err();
        assert!(err.to_string().contains("malformed response"));
    }

    #[test]
    fn test_request_url_shape() {
        let generator = GeminiGenerator::new(
            "key".to_string(),
            "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            "gemini-3-flash-preview".to_string(),
        );
        assert_eq!(
            generator.request_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }
}
