use anyhow::{anyhow, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, FocusField, InputMode};
use crate::input;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('g') => {
                app.generate();
                return;
            }
            _ => {}
        }
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Form navigation
        KeyCode::Tab | KeyCode::Char('j') | KeyCode::Down => app.focus = app.focus.next(),
        KeyCode::BackTab | KeyCode::Char('k') | KeyCode::Up => app.focus = app.focus.prev(),
        KeyCode::Enter | KeyCode::Char('i') => {
            let field = app.focus;
            if field.is_text() {
                start_editing(app, field);
            } else {
                app.toggle_model();
            }
        }
        KeyCode::Char('m') => app.toggle_model(),
        KeyCode::Char('o') => start_editing(app, FocusField::Image),
        KeyCode::Char('x') => app.remove_image(),

        // Generation
        KeyCode::Char('g') => app.generate(),
        KeyCode::Char('r') => app.regenerate(),
        KeyCode::Char('c') => app.copy_comment(copy_to_clipboard),

        // Result scrolling
        KeyCode::Char('J') | KeyCode::PageDown => {
            app.result_scroll = app.result_scroll.saturating_add(3);
        }
        KeyCode::Char('K') | KeyCode::PageUp => {
            app.result_scroll = app.result_scroll.saturating_sub(3);
        }

        KeyCode::Esc => app.status_message = None,
        _ => {}
    }
}

fn start_editing(app: &mut App, field: FocusField) {
    app.focus = field;
    app.input_mode = InputMode::Editing;
    match field {
        FocusField::Title => app.title_cursor = app.session.title.chars().count(),
        FocusField::Body => app.body_cursor = app.session.body.chars().count(),
        FocusField::Image => app.image_path_cursor = app.image_path_input.chars().count(),
        FocusField::Model => app.input_mode = InputMode::Normal,
    }
}

/// The focused text field and its cursor.
fn focused_text(app: &mut App) -> Option<(&mut String, &mut usize)> {
    match app.focus {
        FocusField::Title => Some((&mut app.session.title, &mut app.title_cursor)),
        FocusField::Body => Some((&mut app.session.body, &mut app.body_cursor)),
        FocusField::Image => Some((&mut app.image_path_input, &mut app.image_path_cursor)),
        FocusField::Model => None,
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            return;
        }
        KeyCode::Tab => {
            let next = app.focus.next();
            if next.is_text() {
                start_editing(app, next);
            } else {
                app.focus = next;
                app.input_mode = InputMode::Normal;
            }
            return;
        }
        KeyCode::Enter => match app.focus {
            FocusField::Title => {
                start_editing(app, FocusField::Body);
                return;
            }
            FocusField::Image => {
                app.attach_image_from_input();
                app.input_mode = InputMode::Normal;
                return;
            }
            _ => {}
        },
        _ => {}
    }

    let multiline = app.focus == FocusField::Body;
    let Some((text, cursor)) = focused_text(app) else {
        return;
    };

    match key.code {
        KeyCode::Enter if multiline => input::insert_str(text, cursor, "\n"),
        KeyCode::Backspace => input::backspace(text, cursor),
        KeyCode::Delete => input::delete(text, cursor),
        KeyCode::Left => input::move_left(cursor),
        KeyCode::Right => input::move_right(text, cursor),
        KeyCode::Up if multiline => input::move_vertical(text, cursor, true),
        KeyCode::Down if multiline => input::move_vertical(text, cursor, false),
        KeyCode::Home => *cursor = input::line_bounds(text, *cursor).0,
        KeyCode::End => *cursor = input::line_bounds(text, *cursor).1,
        KeyCode::Char(c) => {
            let mut buf = [0u8; 4];
            input::insert_str(text, cursor, c.encode_utf8(&mut buf));
        }
        _ => {}
    }
}

fn handle_paste(app: &mut App, pasted: &str) {
    if !app.focus.is_text() {
        return;
    }
    if app.input_mode == InputMode::Normal {
        let field = app.focus;
        start_editing(app, field);
    }

    let multiline = app.focus == FocusField::Body;
    let Some((text, cursor)) = focused_text(app) else {
        return;
    };
    if multiline {
        input::insert_str(text, cursor, &pasted.replace("\r\n", "\n").replace('\r', "\n"));
    } else {
        input::insert_str(text, cursor, &input::single_line(pasted));
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.result_scroll = app.result_scroll.saturating_add(1),
        MouseEventKind::ScrollUp => app.result_scroll = app.result_scroll.saturating_sub(1),
        _ => {}
    }
}

/// Clipboard programs tried in order: macOS, Wayland, then X11.
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

fn copy_to_clipboard(text: &str) -> Result<()> {
    use std::io::Write;
    use std::process::{Command, Stdio};

    for (program, args) in CLIPBOARD_COMMANDS {
        let Ok(mut child) = Command::new(program)
            .args(*args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        else {
            continue;
        };

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        let status = child.wait()?;
        if status.success() {
            return Ok(());
        }
        tracing::debug!(program, %status, "clipboard command failed");
    }

    Err(anyhow!("No clipboard tool found (install wl-clipboard, xclip or xsel)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use commentgen_core::{CommentGenerator, Config};

    fn app() -> App {
        App::with_generator(CommentGenerator::default(), &Config::new())
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            handle_event(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    #[test]
    fn test_typing_into_title_then_body() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Char('i'))).unwrap();
        assert_eq!(app.input_mode, InputMode::Editing);

        type_str(&mut app, "Hi there");
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.focus, FocusField::Body);

        type_str(&mut app, "line one");
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();
        type_str(&mut app, "two");

        assert_eq!(app.session.title, "Hi there");
        assert_eq!(app.session.body, "line one\ntwo");

        handle_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_letters_are_text_while_editing() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();
        type_str(&mut app, "q");
        assert!(!app.should_quit);
        assert_eq!(app.session.title, "q");

        handle_event(&mut app, key(KeyCode::Esc)).unwrap();
        handle_event(&mut app, key(KeyCode::Char('q'))).unwrap();
        assert!(app.should_quit);
    }

    #[test]
    fn test_paste_flattens_title_but_not_body() {
        let mut app = app();
        handle_event(&mut app, AppEvent::Paste("a\r\nb".into())).unwrap();
        assert_eq!(app.input_mode, InputMode::Editing);
        assert_eq!(app.session.title, "a b");

        app.focus = FocusField::Body;
        handle_event(&mut app, AppEvent::Paste("a\r\nb".into())).unwrap();
        assert_eq!(app.session.body, "a\nb");
    }

    #[test]
    fn test_enter_on_model_toggles_nothing_while_loading() {
        let mut app = app();
        app.focus = FocusField::Model;
        app.session.title = "t".into();
        app.session.submit().unwrap();

        handle_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.session.model(), commentgen_core::ModelChoice::Gemma);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_scroll_keys_saturate() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::PageUp)).unwrap();
        assert_eq!(app.result_scroll, 0);
        handle_event(&mut app, key(KeyCode::PageDown)).unwrap();
        assert_eq!(app.result_scroll, 3);
    }
}
