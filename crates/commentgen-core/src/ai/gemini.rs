use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::CommentBackend;
use crate::draft::PostDraft;
use crate::model::ModelChoice;
use crate::prompt::{gemini_prompt, PromptPolicy};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const TEMPERATURE: f32 = 0.9;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiPart<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: GeminiInlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

impl GeminiResponse {
    /// Text of the first candidate, skipping thought parts
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    policy: PromptPolicy,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            policy: PromptPolicy::default(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_policy(mut self, policy: PromptPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CommentBackend for GeminiClient {
    fn model(&self) -> ModelChoice {
        ModelChoice::Gemini
    }

    async fn complete(&self, draft: &PostDraft) -> Result<String> {
        let prompt = gemini_prompt(draft, &self.policy);

        let mut parts = vec![GeminiPart::Text { text: &prompt }];
        if let Some(image) = draft.image.as_ref().filter(|image| !image.data.is_empty()) {
            parts.push(GeminiPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: &image.mime_type,
                    data: &image.data,
                },
            });
        }

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts,
            }],
            generation_config: GeminiGenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!(model = %self.model, prompt_chars = prompt.len(), has_image = draft.image.is_some(), "sending Gemini request");

        // The key travels in a header and reqwest errors are stripped of the
        // URL, so neither can reach the log.
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(%status, body = %text, "Gemini API request failed");
            return Err(anyhow!("Gemini API error {}: {}", status, text));
        }

        let gemini_response: GeminiResponse =
            response.json().await.map_err(reqwest::Error::without_url)?;
        Ok(gemini_response.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_inline_image() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![
                    GeminiPart::Text { text: "prompt" },
                    GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: "image/png",
                            data: "aGk=",
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig { temperature: 0.5 },
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "prompt" },
                        { "inlineData": { "mimeType": "image/png", "data": "aGk=" } }
                    ]
                }],
                "generationConfig": { "temperature": 0.5 }
            })
        );
    }

    #[test]
    fn test_response_text_joins_parts_and_skips_thoughts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "thinking...", "thought": true },
                        { "text": "ngl " },
                        { "text": "that's fair" }
                    ]
                }
            }]
        }))
        .unwrap();
        assert_eq!(response.text(), "ngl that's fair");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.text(), "");

        let response: GeminiResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "SAFETY" }] })).unwrap();
        assert_eq!(response.text(), "");
    }
}
