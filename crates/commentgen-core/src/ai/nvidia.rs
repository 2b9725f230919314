use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::CommentBackend;
use crate::draft::PostDraft;
use crate::model::ModelChoice;
use crate::prompt::{chat_prompt, PromptPolicy};

pub const DEFAULT_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";
pub const DEFAULT_MODEL: &str = "google/gemma-3-27b-it";
pub const TEMPERATURE: f32 = 0.9;
pub const MAX_TOKENS: u32 = 512;

#[derive(Serialize)]
struct NvidiaRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<NvidiaMessage<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum NvidiaMessage<'a> {
    System { content: &'a str },
    User { content: Vec<NvidiaContentPart<'a>> },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum NvidiaContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: NvidiaImageUrl<'a> },
}

#[derive(Serialize)]
struct NvidiaImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct NvidiaChoice {
    message: NvidiaResponseMessage,
}

#[derive(Deserialize)]
struct NvidiaResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct NvidiaResponse {
    #[serde(default)]
    choices: Vec<NvidiaChoice>,
}

/// Client for Gemma served from NVIDIA's OpenAI-compatible chat endpoint.
#[derive(Clone)]
pub struct NvidiaClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    policy: PromptPolicy,
}

impl NvidiaClient {
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
impl CommentBackend for NvidiaClient {
    fn model(&self) -> ModelChoice {
        ModelChoice::Gemma
    }

    async fn complete(&self, draft: &PostDraft) -> Result<String> {
        let prompt = chat_prompt(draft, &self.policy);

        let mut user_content = vec![NvidiaContentPart::Text {
            text: &prompt.user_text,
        }];
        if let Some(url) = &prompt.image_url {
            user_content.push(NvidiaContentPart::ImageUrl {
                image_url: NvidiaImageUrl { url },
            });
        }

        let request = NvidiaRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            messages: vec![
                NvidiaMessage::System {
                    content: &prompt.system,
                },
                NvidiaMessage::User {
                    content: user_content,
                },
            ],
        };

        debug!(model = %self.model, system_chars = prompt.system.len(), has_image = prompt.image_url.is_some(), "sending NVIDIA chat request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(%status, body = %text, "NVIDIA API request failed");
            return Err(anyhow!("NVIDIA API error {}: {}", status, text));
        }

        let nvidia_response: NvidiaResponse =
            response.json().await.map_err(reqwest::Error::without_url)?;
        Ok(nvidia_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_matches_chat_completion_shape() {
        let request = NvidiaRequest {
            model: "google/gemma-3-27b-it",
            temperature: 0.5,
            max_tokens: 512,
            messages: vec![
                NvidiaMessage::System { content: "rules" },
                NvidiaMessage::User {
                    content: vec![
                        NvidiaContentPart::Text { text: "Post Title: t\nPost Body: b" },
                        NvidiaContentPart::ImageUrl {
                            image_url: NvidiaImageUrl {
                                url: "data:image/png;base64,aGk=",
                            },
                        },
                    ],
                },
            ],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "google/gemma-3-27b-it",
                "temperature": 0.5,
                "max_tokens": 512,
                "messages": [
                    { "role": "system", "content": "rules" },
                    {
                        "role": "user",
                        "content": [
                            { "type": "text", "text": "Post Title: t\nPost Body: b" },
                            { "type": "image_url", "image_url": { "url": "data:image/png;base64,aGk=" } }
                        ]
                    }
                ]
            })
        );
    }

    #[test]
    fn test_response_tolerates_null_content() {
        let response: NvidiaResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        }))
        .unwrap();
        assert!(response.choices[0].message.content.is_none());
    }
}
