use std::path::PathBuf;
use std::time::Instant;

use commentgen_core::config::api_key_var;
use commentgen_core::{
    CommentGenerator, Config, GenerationError, GenerationResult, GenerationTicket, Session,
    SubmitRejected,
};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Form fields, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusField {
    Model,
    Title,
    Body,
    Image,
}

impl FocusField {
    pub fn next(self) -> Self {
        match self {
            FocusField::Model => FocusField::Title,
            FocusField::Title => FocusField::Body,
            FocusField::Body => FocusField::Image,
            FocusField::Image => FocusField::Model,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusField::Model => FocusField::Image,
            FocusField::Title => FocusField::Model,
            FocusField::Body => FocusField::Title,
            FocusField::Image => FocusField::Body,
        }
    }

    pub fn is_text(self) -> bool {
        !matches!(self, FocusField::Model)
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusField,
    pub session: Session,

    // Cursor positions (in chars) for the text fields
    pub title_cursor: usize,
    pub body_cursor: usize,
    pub image_path_input: String,
    pub image_path_cursor: usize,

    // Scroll state
    pub body_scroll: u16,
    pub result_scroll: u16,

    // Transient message shown in the footer (clipboard problems etc.)
    pub status_message: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Generation
    pub generator: CommentGenerator,
    pub generation_task: Option<JoinHandle<GenerationResult>>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self::with_generator(CommentGenerator::from_config(config), config)
    }

    pub fn with_generator(generator: CommentGenerator, config: &Config) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusField::Title,
            session: Session::new(config.model()),

            title_cursor: 0,
            body_cursor: 0,
            image_path_input: String::new(),
            image_path_cursor: 0,

            body_scroll: 0,
            result_scroll: 0,

            status_message: None,
            animation_frame: 0,

            generator,
            generation_task: None,
        }
    }

    /// Generate from the current form contents.
    pub fn generate(&mut self) {
        let ticket = self.session.submit();
        self.start(ticket);
    }

    /// Generate again with the same inputs.
    pub fn regenerate(&mut self) {
        if self.session.comment().is_none() {
            return;
        }
        let ticket = self.session.regenerate();
        self.start(ticket);
    }

    fn start(&mut self, ticket: Result<GenerationTicket, SubmitRejected>) {
        // Normalization may have rewritten the fields
        self.clamp_cursors();

        let ticket = match ticket {
            Ok(ticket) => ticket,
            Err(SubmitRejected::Busy) => return,
            Err(SubmitRejected::EmptyDraft) => {
                info!("generation rejected: empty draft");
                return;
            }
        };

        self.input_mode = InputMode::Normal;
        self.result_scroll = 0;
        self.status_message = None;

        let generator = self.generator.clone();
        self.generation_task = Some(tokio::spawn(async move {
            generator.generate(ticket.model, &ticket.draft).await
        }));
    }

    /// Collect the result of a finished generation task, if any.
    pub async fn poll_generation(&mut self) {
        let finished = self
            .generation_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        let Some(task) = self.generation_task.take() else {
            return;
        };
        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "generation task failed");
                GenerationResult::Error(GenerationError::Backend(e.into()).to_string())
            }
        };
        self.session.finish(result);
    }

    pub fn toggle_model(&mut self) {
        if !self.session.toggle_model() {
            return;
        }
        let model = self.session.model();
        if !self.generator.is_configured(model) {
            self.status_message = Some(format!(
                "Set {} to use {}",
                api_key_var(model),
                model.display_name()
            ));
        } else {
            self.status_message = None;
        }
        if let Err(e) = Config::save_default_model(model) {
            warn!(error = %e, "could not save selected model");
        }
    }

    pub fn attach_image_from_input(&mut self) {
        // Paths dropped into a terminal often arrive quoted
        let input = self
            .image_path_input
            .trim()
            .trim_matches(|c| c == '\'' || c == '"');
        if input.is_empty() {
            return;
        }

        let attached = if input.starts_with("data:") {
            self.session.attach_data_uri(input)
        } else {
            let path = expand_home(input);
            self.session.attach_image(&path)
        };
        if attached {
            if let Some(image) = self.session.image() {
                info!(name = %image.name, "image attached");
            }
            self.image_path_input.clear();
            self.image_path_cursor = 0;
        }
    }

    pub fn remove_image(&mut self) {
        self.session.remove_image();
    }

    /// Copy the generated comment with the given clipboard writer.
    pub fn copy_comment(&mut self, write: impl FnOnce(&str) -> anyhow::Result<()>) {
        let Some(comment) = self.session.comment().map(str::to_string) else {
            return;
        };
        match write(&comment) {
            Ok(()) => {
                self.session.copy_comment(Instant::now());
                self.status_message = None;
            }
            Err(e) => {
                warn!(error = %e, "copy to clipboard failed");
                self.status_message = Some(e.to_string());
            }
        }
    }

    pub fn copied(&self) -> bool {
        self.session.copied(Instant::now())
    }

    pub fn tick_animation(&mut self) {
        if self.session.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn clamp_cursors(&mut self) {
        self.title_cursor = self.title_cursor.min(self.session.title.chars().count());
        self.body_cursor = self.body_cursor.min(self.session.body.chars().count());
        self.image_path_cursor = self
            .image_path_cursor
            .min(self.image_path_input.chars().count());
    }
}

/// Expand a leading `~` to the home directory
fn expand_home(input: &str) -> PathBuf {
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if input == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn app() -> App {
        App::with_generator(CommentGenerator::default(), &Config::new())
    }

    #[test]
    fn test_focus_cycles_through_all_fields() {
        let mut focus = FocusField::Model;
        for _ in 0..4 {
            focus = focus.next();
        }
        assert_eq!(focus, FocusField::Model);
        assert_eq!(FocusField::Title.prev().next(), FocusField::Title);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/tmp/a.png"), PathBuf::from("/tmp/a.png"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/pics/a.png"), home.join("pics/a.png"));
        }
    }

    #[tokio::test]
    async fn test_missing_key_settles_as_error() {
        let mut app = app();
        app.session.title = "hello".to_string();
        app.title_cursor = 5;

        app.generate();
        assert!(app.session.is_loading());

        if let Some(task) = app.generation_task.as_ref() {
            while !task.is_finished() {
                tokio::task::yield_now().await;
            }
        }
        app.poll_generation().await;

        assert!(app.generation_task.is_none());
        assert_eq!(app.session.error(), Some("NVIDIA API key is not configured."));
    }

    #[tokio::test]
    async fn test_generate_clamps_cursors_after_normalization() {
        let mut app = app();
        app.session.body = "  Title here\nbody".to_string();
        app.body_cursor = app.session.body.chars().count();

        app.generate();
        assert_eq!(app.session.body, "body");
        assert_eq!(app.body_cursor, 4);
    }

    #[test]
    fn test_image_field_accepts_data_uri() {
        let mut app = app();
        app.image_path_input = "'data:image/gif;base64,R0lGODlh'".to_string();
        app.image_path_cursor = app.image_path_input.chars().count();

        app.attach_image_from_input();
        assert_eq!(app.session.image().unwrap().attachment.mime_type, "image/gif");
        assert!(app.image_path_input.is_empty());
        assert_eq!(app.image_path_cursor, 0);
    }

    #[test]
    fn test_copy_failure_is_reported() {
        let mut app = app();
        app.copy_comment(|_| Ok(()));
        assert!(!app.copied());

        app.session.title = "t".to_string();
        app.session.submit().unwrap();
        app.session.finish(GenerationResult::Comment("text".into()));

        app.copy_comment(|_| Err(anyhow!("no clipboard")));
        assert!(!app.copied());
        assert_eq!(app.status_message.as_deref(), Some("no clipboard"));

        let mut copied = String::new();
        app.copy_comment(|text| {
            copied = text.to_string();
            Ok(())
        });
        assert_eq!(copied, "text");
        assert!(app.copied());
    }
}
