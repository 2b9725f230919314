pub mod gemini;
pub mod nvidia;

pub use gemini::GeminiClient;
pub use nvidia::NvidiaClient;

use anyhow::Result;
use async_trait::async_trait;

use crate::draft::PostDraft;
use crate::model::ModelChoice;

/// A generative backend that turns a validated draft into raw comment text.
///
/// Implementations send exactly one request and do not retry. The returned
/// text is untrimmed; empty-text handling belongs to the caller.
#[async_trait]
pub trait CommentBackend: Send + Sync {
    fn model(&self) -> ModelChoice;

    async fn complete(&self, draft: &PostDraft) -> Result<String>;
}
