//! Post drafts and the title/body normalization applied before every request.

use serde::{Deserialize, Serialize};

use crate::image::ImageAttachment;

/// The post a comment is generated for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAttachment>,
}

impl PostDraft {
    /// Build a draft from raw form input, inferring the title when needed.
    pub fn normalized(title: &str, body: &str, image: Option<ImageAttachment>) -> Self {
        let (title, body) = normalize(title, body);
        Self { title, body, image }
    }

    /// A draft needs at least a title, a non-blank body, or an image.
    pub fn has_content(&self) -> bool {
        !self.title.trim().is_empty() || !self.body.trim().is_empty() || self.image.is_some()
    }
}

/// Normalize raw title/body input.
///
/// The title is trimmed. When it ends up empty and the body has text, the
/// first non-blank body line becomes the title and is removed from the body,
/// along with one blank line left behind at the top. Otherwise the body is
/// returned as typed.
pub fn normalize(title: &str, body: &str) -> (String, String) {
    let title = title.trim();
    if !title.is_empty() || body.trim().is_empty() {
        return (title.to_string(), body.to_string());
    }

    let lines: Vec<&str> = body
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let Some(first) = lines.iter().position(|line| !line.trim().is_empty()) else {
        return (String::new(), body.to_string());
    };

    let inferred = lines[first].trim().to_string();
    let rest = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != first)
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n");

    (inferred, strip_leading_blank_line(&rest).to_string())
}

fn strip_leading_blank_line(text: &str) -> &str {
    match text.split_once('\n') {
        Some((first, rest)) if first.trim().is_empty() => rest,
        _ => text,
    }
}
