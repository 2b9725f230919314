use commentgen_core::Phase;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FocusField, InputMode};
use crate::input;

const COMMENTER: &str = "u/ai_commenter";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    let [form_area, result_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(body_area);
    render_form(app, frame, form_area);
    render_result(app, frame, result_area);

    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Reddit Comment Generator ", Style::default().fg(Color::Cyan).bold()),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn field_block(app: &App, field: FocusField, title: &str) -> Block<'static> {
    let color = if app.focus != field {
        Color::DarkGray
    } else if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::Cyan
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title.to_string())
}

fn placeholder(text: &str) -> Text<'static> {
    Text::from(Span::styled(text.to_string(), Style::default().fg(Color::DarkGray)))
}

/// Terminal coordinates are u16; longer text pins to the last cell.
fn cell(pos: usize) -> u16 {
    pos.min(u16::MAX as usize) as u16
}

/// Offset that keeps `pos` inside a window of `size` cells.
fn scroll_to(pos: usize, offset: u16, size: u16) -> u16 {
    let pos = cell(pos);
    if size == 0 || pos < offset {
        pos
    } else if pos >= offset + size {
        pos - size + 1
    } else {
        offset
    }
}

fn editing(app: &App, field: FocusField) -> bool {
    app.focus == field && app.input_mode == InputMode::Editing
}

fn render_form(app: &mut App, frame: &mut Frame, area: Rect) {
    let error_height = match app.session.error() {
        Some(_) => 3,
        None => 0,
    };

    let [model_area, title_area, body_area, image_area, error_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(3),
        Constraint::Length(error_height),
    ])
    .areas(area);

    render_model_field(app, frame, model_area);
    render_single_line(app, frame, title_area, FocusField::Title);
    render_body_field(app, frame, body_area);
    render_image_field(app, frame, image_area);

    if let Some(message) = app.session.error() {
        let error = Paragraph::new(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::TOP).border_style(Style::default().fg(Color::Red)));
        frame.render_widget(error, error_area);
    }
}

fn render_model_field(app: &App, frame: &mut Frame, area: Rect) {
    let model = app.session.model();
    let mut spans = vec![Span::styled(
        format!("◀ {} ▶", model.display_name()),
        Style::default().fg(Color::White).bold(),
    )];
    if !app.generator.is_configured(model) {
        spans.push(Span::styled(
            format!("  no {} API key", model.credential_name()),
            Style::default().fg(Color::Red),
        ));
    }

    let paragraph =
        Paragraph::new(Line::from(spans)).block(field_block(app, FocusField::Model, " Model "));
    frame.render_widget(paragraph, area);
}

fn render_single_line(app: &App, frame: &mut Frame, area: Rect, field: FocusField) {
    let (title, text, cursor, hint) = match field {
        FocusField::Title => (
            " Post Title ",
            app.session.title.as_str(),
            app.title_cursor,
            "What's the post about? (optional)",
        ),
        _ => (
            " Image path or data: URI ",
            app.image_path_input.as_str(),
            app.image_path_cursor,
            "",
        ),
    };

    let width = area.width.saturating_sub(2);
    let scroll = scroll_to(cursor, 0, width);
    let content = if text.is_empty() && !editing(app, field) {
        placeholder(hint)
    } else {
        Text::from(text.to_string())
    };

    let paragraph = Paragraph::new(content)
        .block(field_block(app, field, title))
        .scroll((0, scroll));
    frame.render_widget(paragraph, area);

    if editing(app, field) {
        let x = area.x + 1 + cell(cursor).saturating_sub(scroll);
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn render_body_field(app: &mut App, frame: &mut Frame, area: Rect) {
    let inner_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2);
    let (line, col) = input::line_col(&app.session.body, app.body_cursor);

    app.body_scroll = scroll_to(line, app.body_scroll, inner_height);
    let h_scroll = scroll_to(col, 0, inner_width);

    let content = if app.session.body.is_empty() && !editing(app, FocusField::Body) {
        placeholder("Paste the post text here. If there is no title, the first line is used.")
    } else {
        Text::from(app.session.body.clone())
    };

    let paragraph = Paragraph::new(content)
        .block(field_block(app, FocusField::Body, " Post Body "))
        .scroll((app.body_scroll, h_scroll));
    frame.render_widget(paragraph, area);

    if editing(app, FocusField::Body) {
        let x = area.x + 1 + cell(col).saturating_sub(h_scroll);
        let y = area.y + 1 + cell(line).saturating_sub(app.body_scroll);
        frame.set_cursor_position((x, y));
    }
}

fn render_image_field(app: &App, frame: &mut Frame, area: Rect) {
    if editing(app, FocusField::Image) {
        render_single_line(app, frame, area, FocusField::Image);
        return;
    }

    let content = match app.session.image() {
        Some(image) => Text::from(Line::from(vec![
            Span::styled(image.name.clone(), Style::default().fg(Color::Green)),
            Span::styled(
                format!("  {}", format_size(image.attachment.decoded_len())),
                Style::default().fg(Color::DarkGray),
            ),
        ])),
        None => placeholder("press o to attach a PNG, JPEG, WEBP or GIF"),
    };

    let paragraph =
        Paragraph::new(content).block(field_block(app, FocusField::Image, " Image (max 5MB) "));
    frame.render_widget(paragraph, area);
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{} KB", bytes.div_ceil(1024))
    }
}

fn render_result(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Generated Comment ");

    let text = match app.session.phase() {
        Phase::InFlight => {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            Text::from(Span::styled(
                format!("Generating{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))
        }
        Phase::Succeeded { comment } => {
            let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);

            let mut lines = vec![
                Line::from(vec![
                    Span::styled(COMMENTER, Style::default().fg(Color::Cyan).bold()),
                    Span::styled(" • just now", Style::default().fg(Color::DarkGray)),
                ]),
                Line::default(),
            ];
            lines.extend(comment.lines().map(|l| Line::from(l.to_string())));
            lines.push(Line::default());

            let copy = if app.copied() {
                Span::styled("✓ Copied!", Style::default().fg(Color::Green).bold())
            } else {
                Span::raw("Copy Text")
            };
            lines.push(Line::from(vec![
                Span::styled(" c ", key_style),
                Span::raw(" "),
                copy,
                Span::raw("   "),
                Span::styled(" r ", key_style),
                Span::raw(" Try Again"),
            ]));
            Text::from(lines)
        }
        _ => placeholder("Enter post details and press g to see the AI's response here."),
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.result_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    if let Some(message) = &app.status_message {
        spans.push(Span::styled(
            format!(" {} ", message),
            Style::default().fg(Color::Yellow),
        ));
    } else {
        let hints: &[(&str, &str)] = match app.input_mode {
            InputMode::Normal => &[
                ("Tab", "field"),
                ("i", "edit"),
                ("g", "generate"),
                ("m", "model"),
                ("o/x", "image"),
                ("q", "quit"),
            ],
            InputMode::Editing => &[("Esc", "done"), ("Tab", "next"), ("^G", "generate")],
        };
        for (key, label) in hints {
            spans.push(Span::styled(format!(" {} ", key), key_style));
            spans.push(Span::styled(format!(" {} ", label), label_style));
        }
    }

    let powered_by = format!("Powered by {} ", app.session.model().display_name());
    let [hints_area, powered_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(powered_by.chars().count() as u16),
    ])
    .areas(area);

    frame.render_widget(Paragraph::new(Line::from(spans)), hints_area);
    frame.render_widget(
        Paragraph::new(Span::styled(powered_by, Style::default().fg(Color::DarkGray))),
        powered_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use commentgen_core::{CommentGenerator, Config, GenerationResult};
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        let mut out = String::new();
        for (i, buf_cell) in buffer.content.iter().enumerate() {
            out.push_str(buf_cell.symbol());
            if (i + 1) % width == 0 {
                out.push('\n');
            }
        }
        out
    }

    fn app() -> App {
        App::with_generator(CommentGenerator::default(), &Config::new())
    }

    #[test]
    fn test_scroll_to() {
        assert_eq!(scroll_to(3, 0, 10), 0);
        assert_eq!(scroll_to(12, 0, 10), 3);
        assert_eq!(scroll_to(2, 5, 10), 2);
        assert_eq!(scroll_to(7, 5, 10), 5);
    }

    #[test]
    fn test_idle_screen_shows_placeholder_and_model() {
        let screen = draw(&mut app());
        assert!(screen.contains("press g to see"));
        assert!(screen.contains("Powered by Gemma 3 27B (NVIDIA)"));
        assert!(screen.contains("no NVIDIA API key"));
    }

    #[test]
    fn test_result_and_error_are_rendered() {
        let mut app = app();
        app.session.title = "t".into();
        app.session.submit().unwrap();
        assert!(draw(&mut app).contains("Generating."));

        app.session.finish(GenerationResult::Comment("great post".into()));
        let screen = draw(&mut app);
        assert!(screen.contains(COMMENTER));
        assert!(screen.contains("great post"));
        assert!(screen.contains("Copy Text"));
        assert!(screen.contains("Try Again"));

        // A rejected submit shows the error and keeps the comment
        app.session.title.clear();
        let _ = app.session.submit();
        let screen = draw(&mut app);
        assert!(screen.contains("Please provide at least a title"));
        assert!(screen.contains("great post"));
        assert!(screen.contains("Try Again"));
    }

    #[test]
    fn test_error_without_comment_shows_placeholder() {
        let mut app = app();
        let _ = app.session.submit();
        let screen = draw(&mut app);
        assert!(screen.contains("Please provide at least a title"));
        assert!(screen.contains("press g to see"));
    }

    #[test]
    fn test_cursor_past_terminal_range_does_not_overflow() {
        let mut app = app();
        app.session.title = "a".repeat(70_000);
        app.title_cursor = 70_000;
        app.focus = FocusField::Title;
        app.input_mode = InputMode::Editing;
        draw(&mut app);

        app.session.body = "b".repeat(70_000);
        app.body_cursor = 70_000;
        app.focus = FocusField::Body;
        draw(&mut app);

        assert_eq!(cell(70_000), u16::MAX);
    }
}
