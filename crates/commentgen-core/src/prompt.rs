//! Prompt construction for both backends.
//!
//! The style guidelines and any topic directives are policy text, kept in
//! [`PromptPolicy`] so they can be reviewed and overridden from the config
//! file instead of living inside the prompt templates.

use serde::{Deserialize, Serialize};

use crate::draft::PostDraft;

const DEFAULT_GUIDELINES: &[&str] = &[
    "Keep it informal, practical, and easy to understand.",
    "Avoid legal jargon, don't over-explain.",
    "Sound like a real person giving advice or sharing an opinion.",
    "Use Gen-Z slang occasionally if it fits, but don't overdo it.",
    "Intentionally include very minor human errors (like a missing comma, lowercase start, or common abbreviation like \"tho\" or \"rn\") to make it look authentic.",
    "Do NOT be overly helpful or robotic.",
    "If the post is a question, answer it directly.",
    "If it's a rant, empathize or offer a different perspective.",
    "Keep it under 280 characters if possible, but can be longer if needed for a good answer.",
];

/// Style rules embedded in every prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptPolicy {
    /// General tone and length rules
    pub guidelines: Vec<String>,
    /// Topic-conditioned steering rules; empty unless an operator adds them
    pub topic_directives: Vec<String>,
}

impl Default for PromptPolicy {
    fn default() -> Self {
        Self {
            guidelines: DEFAULT_GUIDELINES.iter().map(|g| g.to_string()).collect(),
            topic_directives: Vec::new(),
        }
    }
}

impl PromptPolicy {
    fn rules(&self) -> impl Iterator<Item = &str> {
        self.guidelines
            .iter()
            .chain(self.topic_directives.iter())
            .map(String::as_str)
    }

    fn push_bullets(&self, prompt: &mut String) {
        for rule in self.rules() {
            prompt.push_str("- ");
            prompt.push_str(rule);
            prompt.push('\n');
        }
    }
}

/// Single instruction block for the Gemini backend.
pub fn gemini_prompt(draft: &PostDraft, policy: &PromptPolicy) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are a Reddit user. Read the following post content and image (if provided).\n\n");
    prompt.push_str(&format!("Post Title: {}\n", draft.title));
    prompt.push_str(&format!("Post Body: {}\n\n", draft.body));
    prompt.push_str("Task: Write a short, clear, human-sounding Reddit comment in response.\n\n");
    prompt.push_str("Guidelines:\n");
    policy.push_bullets(&mut prompt);

    prompt
}

/// System and user messages for the chat-completion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system: String,
    pub user_text: String,
    /// `data:` URI for the attached image, if any
    pub image_url: Option<String>,
}

pub fn chat_prompt(draft: &PostDraft, policy: &PromptPolicy) -> ChatPrompt {
    let mut system = String::new();
    system.push_str("You are a Reddit user replying to a post. ");
    system.push_str("Write a short, clear, human-sounding Reddit comment in response to the post the user shares, ");
    system.push_str("taking the attached image into account when there is one.\n\n");
    system.push_str("Guidelines:\n");
    policy.push_bullets(&mut system);
    system.push_str("- Reply in the same language the post is written in.\n");
    system.push_str("- Output only the comment text. No preamble, no quotes, no explanations.\n");

    ChatPrompt {
        system,
        user_text: format!("Post Title: {}\nPost Body: {}", draft.title, draft.body),
        image_url: draft.image.as_ref().map(|image| image.to_data_uri()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageAttachment;

    fn draft() -> PostDraft {
        PostDraft {
            title: "AITA for eating my roommate's yogurt?".to_string(),
            body: "It was expiring tomorrow.".to_string(),
            image: None,
        }
    }

    #[test]
    fn test_gemini_prompt_embeds_post_verbatim() {
        let prompt = gemini_prompt(&draft(), &PromptPolicy::default());
        assert!(prompt.contains("Post Title: AITA for eating my roommate's yogurt?\n"));
        assert!(prompt.contains("Post Body: It was expiring tomorrow.\n"));
        assert!(prompt.starts_with("You are a Reddit user."));
    }

    #[test]
    fn test_default_guidelines_are_included_in_order() {
        let prompt = gemini_prompt(&draft(), &PromptPolicy::default());
        let mut last = 0;
        for guideline in DEFAULT_GUIDELINES {
            let at = prompt
                .find(&format!("- {}\n", guideline))
                .unwrap_or_else(|| panic!("missing guideline: {}", guideline));
            assert!(at >= last);
            last = at;
        }
    }

    #[test]
    fn test_topic_directives_follow_guidelines() {
        let policy = PromptPolicy {
            guidelines: vec!["Be brief.".to_string()],
            topic_directives: vec!["On cooking posts, mention salt.".to_string()],
        };
        let prompt = gemini_prompt(&draft(), &policy);
        assert!(prompt.ends_with("- Be brief.\n- On cooking posts, mention salt.\n"));

        let chat = chat_prompt(&draft(), &policy);
        assert!(chat.system.contains("- On cooking posts, mention salt.\n"));
    }

    #[test]
    fn test_chat_prompt_shape() {
        let chat = chat_prompt(&draft(), &PromptPolicy::default());
        assert_eq!(
            chat.user_text,
            "Post Title: AITA for eating my roommate's yogurt?\nPost Body: It was expiring tomorrow."
        );
        assert!(chat.system.contains("Output only the comment text."));
        assert!(chat.system.contains("same language"));
        assert_eq!(chat.image_url, None);
    }

    #[test]
    fn test_chat_prompt_carries_image_as_data_uri() {
        let mut draft = draft();
        draft.image = Some(ImageAttachment::new("image/jpeg", "/9j/4AAQ"));
        let chat = chat_prompt(&draft, &PromptPolicy::default());
        assert_eq!(chat.image_url.as_deref(), Some("data:image/jpeg;base64,/9j/4AAQ"));
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: PromptPolicy =
            serde_json::from_str(r#"{"topic_directives": ["x"]}"#).unwrap();
        assert_eq!(policy.guidelines.len(), DEFAULT_GUIDELINES.len());
        assert_eq!(policy.topic_directives, vec!["x".to_string()]);
    }
}
