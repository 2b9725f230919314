pub mod ai;
pub mod config;
pub mod draft;
pub mod generator;
pub mod image;
pub mod model;
pub mod prompt;
pub mod state;

// Re-export main types for convenience
pub use ai::{CommentBackend, GeminiClient, NvidiaClient};
pub use config::Config;
pub use draft::PostDraft;
pub use generator::{CommentGenerator, GenerationError, GenerationResult};
pub use image::{ImageAttachment, ImageError, MAX_IMAGE_BYTES};
pub use model::ModelChoice;
pub use prompt::PromptPolicy;
pub use state::{GenerationTicket, Phase, Session, SubmitRejected};
