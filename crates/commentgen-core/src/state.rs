//! UI-agnostic session state
//!
//! A [`Session`] is the state machine behind the form: the draft fields, the
//! selected model and the phase of the current generation. Any front end
//! (the TUI, a future desktop app) drives it with discrete events and
//! dispatches the tickets it hands out.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::draft::PostDraft;
use crate::generator::{GenerationError, GenerationResult};
use crate::image::{self, ImageAttachment, ImageError};
use crate::model::ModelChoice;

/// How long the "copied" indicator stays visible.
pub const COPIED_INDICATOR: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    InFlight,
    Succeeded { comment: String },
    Failed { message: String },
}

/// Why a submit did not produce a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    /// A generation is already in flight
    Busy,
    /// Nothing to generate from; the session is now `Failed`
    EmptyDraft,
}

/// Everything needed to dispatch one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub model: ModelChoice,
    pub draft: PostDraft,
}

/// An attached image and the name it is shown under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedImage {
    pub name: String,
    pub attachment: ImageAttachment,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub title: String,
    pub body: String,
    image: Option<AttachedImage>,
    model: ModelChoice,
    phase: Phase,
    /// Error raised outside a request while a comment is on screen
    notice: Option<String>,
    copied_until: Option<Instant>,
}

impl Session {
    pub fn new(model: ModelChoice) -> Self {
        Self {
            model,
            ..Default::default()
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn model(&self) -> ModelChoice {
        self.model
    }

    pub fn image(&self) -> Option<&AttachedImage> {
        self.image.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::InFlight
    }

    pub fn comment(&self) -> Option<&str> {
        match &self.phase {
            Phase::Succeeded { comment } => Some(comment),
            _ => None,
        }
    }

    /// The error to show: a rejected input or a failed generation.
    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed { message } => Some(message),
            _ => self.notice.as_deref(),
        }
    }

    /// Record an error that happened before any request was made. A comment
    /// already on screen stays there, with the error shown beside it.
    fn reject(&mut self, previous: Phase, message: String) {
        match previous {
            Phase::Succeeded { .. } => {
                self.phase = previous;
                self.notice = Some(message);
            }
            _ => {
                self.phase = Phase::Failed { message };
                self.notice = None;
            }
        }
    }

    /// Switch backends. Ignored while a generation is in flight.
    pub fn select_model(&mut self, model: ModelChoice) -> bool {
        if self.is_loading() {
            return false;
        }
        self.model = model;
        true
    }

    pub fn toggle_model(&mut self) -> bool {
        self.select_model(self.model.toggled())
    }

    /// Start a generation from the current fields.
    ///
    /// The normalized title and body are written back into the session, so
    /// what the user sees is what was sent.
    pub fn submit(&mut self) -> Result<GenerationTicket, SubmitRejected> {
        if self.is_loading() {
            return Err(SubmitRejected::Busy);
        }

        let previous = std::mem::replace(&mut self.phase, Phase::Validating);
        let draft = PostDraft::normalized(
            &self.title,
            &self.body,
            self.image.as_ref().map(|i| i.attachment.clone()),
        );
        self.title = draft.title.clone();
        self.body = draft.body.clone();

        if !draft.has_content() {
            self.reject(previous, GenerationError::EmptyDraft.to_string());
            return Err(SubmitRejected::EmptyDraft);
        }

        self.phase = Phase::InFlight;
        self.notice = None;
        self.copied_until = None;
        Ok(GenerationTicket {
            model: self.model,
            draft,
        })
    }

    /// Try again with the same inputs.
    pub fn regenerate(&mut self) -> Result<GenerationTicket, SubmitRejected> {
        self.submit()
    }

    /// Record the outcome of the in-flight generation.
    ///
    /// Returns false (and changes nothing) when no generation was in flight.
    pub fn finish(&mut self, result: GenerationResult) -> bool {
        if !self.is_loading() {
            return false;
        }
        self.phase = match result {
            GenerationResult::Comment(comment) => Phase::Succeeded { comment },
            GenerationResult::Error(message) => Phase::Failed { message },
        };
        self.notice = None;
        true
    }

    /// Text to put on the clipboard; starts the "copied" indicator.
    pub fn copy_comment(&mut self, now: Instant) -> Option<String> {
        let comment = self.comment()?.to_string();
        self.copied_until = Some(now + COPIED_INDICATOR);
        Some(comment)
    }

    pub fn copied(&self, now: Instant) -> bool {
        self.copied_until.is_some_and(|until| now < until)
    }

    /// Attach an image file. Oversized or unsupported files are rejected
    /// before they are read, and the previous image (if any) is kept.
    pub fn attach_image(&mut self, path: &Path) -> bool {
        if self.is_loading() {
            return false;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let loaded = image::load_image(path);
        if let Err(e) = &loaded {
            tracing::warn!(path = %path.display(), error = %e, "image rejected");
        }
        self.set_image(name, loaded)
    }

    /// Attach an image given as a `data:` URI, e.g. pasted from a browser.
    pub fn attach_data_uri(&mut self, uri: &str) -> bool {
        if self.is_loading() {
            return false;
        }

        let parsed = ImageAttachment::from_data_uri(uri);
        if let Err(e) = &parsed {
            tracing::warn!(error = %e, "pasted image rejected");
        }
        let name = match &parsed {
            Ok(attachment) => format!("pasted {}", attachment.mime_type),
            Err(_) => String::new(),
        };
        self.set_image(name, parsed)
    }

    fn set_image(&mut self, name: String, image: Result<ImageAttachment, ImageError>) -> bool {
        match image {
            Ok(attachment) => {
                self.image = Some(AttachedImage { name, attachment });
                self.notice = None;
                if matches!(self.phase, Phase::Failed { .. }) {
                    self.phase = Phase::Idle;
                }
                true
            }
            Err(e) => {
                let previous = std::mem::take(&mut self.phase);
                self.reject(previous, e.to_string());
                false
            }
        }
    }

    pub fn remove_image(&mut self) {
        if !self.is_loading() {
            self.image = None;
        }
    }
}
