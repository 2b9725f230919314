//! The dispatcher: validation, credential checks, backend selection and
//! error shaping shared by both backends.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::ai::{CommentBackend, GeminiClient, NvidiaClient};
use crate::config::Config;
use crate::draft::PostDraft;
use crate::model::ModelChoice;

/// Outcome of one generation attempt. Exactly one of comment or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationResult {
    Comment(String),
    Error(String),
}

impl GenerationResult {
    pub fn comment(&self) -> Option<&str> {
        match self {
            GenerationResult::Comment(text) => Some(text),
            GenerationResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            GenerationResult::Comment(_) => None,
            GenerationResult::Error(message) => Some(message),
        }
    }
}

impl From<Result<String, GenerationError>> for GenerationResult {
    fn from(result: Result<String, GenerationError>) -> Self {
        match result {
            Ok(comment) => GenerationResult::Comment(comment),
            Err(e) => GenerationResult::Error(e.to_string()),
        }
    }
}

/// Everything that can go wrong between a submitted draft and a comment.
///
/// The `Display` text is what the user sees; backend details only reach the log.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Please provide at least a title, body, or image.")]
    EmptyDraft,
    #[error("{} API key is not configured.", .0.credential_name())]
    MissingCredential(ModelChoice),
    #[error("Failed to generate comment. Please try again.")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("No comment was generated. Please try again.")]
    EmptyCompletion,
}

/// Generates comments with whichever backend the caller selects.
///
/// Backends are built once from an explicit [`Config`]; a backend whose
/// credential is missing is simply absent.
#[derive(Clone, Default)]
pub struct CommentGenerator {
    gemini: Option<Arc<dyn CommentBackend>>,
    gemma: Option<Arc<dyn CommentBackend>>,
}

impl CommentGenerator {
    pub fn from_config(config: &Config) -> Self {
        let gemini = config.api_key(ModelChoice::Gemini).map(|key| {
            let mut client = GeminiClient::new(key).with_policy(config.policy.clone());
            if let Some(model) = &config.gemini_model {
                client = client.with_model(model);
            }
            if let Some(url) = &config.gemini_base_url {
                client = client.with_base_url(url);
            }
            debug!(model = client.model_name(), "Gemini backend configured");
            Arc::new(client) as Arc<dyn CommentBackend>
        });

        let gemma = config.api_key(ModelChoice::Gemma).map(|key| {
            let mut client = NvidiaClient::new(key).with_policy(config.policy.clone());
            if let Some(model) = &config.nvidia_model {
                client = client.with_model(model);
            }
            if let Some(url) = &config.nvidia_base_url {
                client = client.with_base_url(url);
            }
            debug!(model = client.model_name(), "NVIDIA backend configured");
            Arc::new(client) as Arc<dyn CommentBackend>
        });

        for model in ModelChoice::all() {
            if config.api_key(model).is_none() {
                warn!(%model, "no {} API key configured", model.credential_name());
            }
        }

        Self { gemini, gemma }
    }

    /// Register a backend under the model it reports, replacing any previous one.
    pub fn with_backend(mut self, backend: Arc<dyn CommentBackend>) -> Self {
        match backend.model() {
            ModelChoice::Gemini => self.gemini = Some(backend),
            ModelChoice::Gemma => self.gemma = Some(backend),
        }
        self
    }

    pub fn is_configured(&self, model: ModelChoice) -> bool {
        self.backend(model).is_some()
    }

    fn backend(&self, model: ModelChoice) -> Option<&Arc<dyn CommentBackend>> {
        match model {
            ModelChoice::Gemini => self.gemini.as_ref(),
            ModelChoice::Gemma => self.gemma.as_ref(),
        }
    }

    /// Generate a comment, never failing: every error becomes a message.
    pub async fn generate(&self, model: ModelChoice, draft: &PostDraft) -> GenerationResult {
        self.try_generate(model, draft).await.into()
    }

    pub async fn try_generate(
        &self,
        model: ModelChoice,
        draft: &PostDraft,
    ) -> Result<String, GenerationError> {
        if !draft.has_content() {
            return Err(GenerationError::EmptyDraft);
        }

        let backend = self
            .backend(model)
            .ok_or(GenerationError::MissingCredential(model))?;

        info!(%model, has_image = draft.image.is_some(), "generating comment");

        let text = backend.complete(draft).await.map_err(|e| {
            error!(%model, error = %format!("{:#}", e), "error generating comment");
            GenerationError::Backend(e.into())
        })?;

        let comment = text.trim();
        if comment.is_empty() {
            warn!(%model, "backend returned an empty completion");
            return Err(GenerationError::EmptyCompletion);
        }

        info!(%model, chars = comment.chars().count(), "comment generated");
        Ok(comment.to_string())
    }
}
