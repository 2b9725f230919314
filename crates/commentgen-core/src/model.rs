use serde::{Deserialize, Serialize};

/// Which backend writes the comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    /// Gemini through the Google generative-language API
    Gemini,
    /// Gemma through NVIDIA's OpenAI-compatible endpoint
    #[default]
    Gemma,
}

impl ModelChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Gemini => "gemini",
            ModelChoice::Gemma => "gemma",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Some(ModelChoice::Gemini),
            "gemma" => Some(ModelChoice::Gemma),
            _ => None,
        }
    }

    pub fn all() -> Vec<ModelChoice> {
        vec![ModelChoice::Gemini, ModelChoice::Gemma]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelChoice::Gemini => "Gemini 3 Flash",
            ModelChoice::Gemma => "Gemma 3 27B (NVIDIA)",
        }
    }

    /// Name of the service whose key this model needs
    pub fn credential_name(&self) -> &'static str {
        match self {
            ModelChoice::Gemini => "Gemini",
            ModelChoice::Gemma => "NVIDIA",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ModelChoice::Gemini => ModelChoice::Gemma,
            ModelChoice::Gemma => ModelChoice::Gemini,
        }
    }
}

impl std::fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
