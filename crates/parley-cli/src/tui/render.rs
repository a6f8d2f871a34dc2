//! Frame rendering

use crate::tui::app::{App, Overlay, StatusKind};
use crate::tui::theme::{Palette, StyleKey};
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

const MAX_INPUT_LINES: u16 = 5;
const KEY_HINTS: &str = "F2 model  F3 new  F4 clear  F5 history  F6 theme  ^Y copy  ^D quit";

pub fn draw(frame: &mut Frame<'_>, app: &App) {
    let palette = app.palette();
    let area = frame.area();
    frame.render_widget(Block::default().style(palette.style(StyleKey::Base)), area);

    let input_lines = (app.input().split('\n').count() as u16).clamp(1, MAX_INPUT_LINES);
    let [header, body, input, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(input_lines + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    draw_header(frame, app, &palette, header);
    draw_transcript(frame, app, &palette, body);
    draw_input(frame, app, &palette, input);
    draw_status(frame, app, &palette, status);

    if let Some(overlay) = app.overlay() {
        draw_overlay(frame, app, &palette, overlay, area);
    }
}

fn draw_header(frame: &mut Frame<'_>, app: &App, palette: &Palette, area: Rect) {
    let style = palette.style(StyleKey::Header);
    let title = format!(" Parley | Model: {} ", app.conversation().model());
    let gap = usize::from(area.width).saturating_sub(title.width() + KEY_HINTS.width() + 1);
    let line = Line::from(vec![
        Span::styled(title, style),
        Span::styled(" ".repeat(gap), style),
        Span::styled(format!("{} ", KEY_HINTS), style),
    ]);
    frame.render_widget(Paragraph::new(line).style(style), area);
}

fn draw_transcript(frame: &mut Frame<'_>, app: &App, palette: &Palette, area: Rect) {
    let block = Block::bordered().border_style(palette.style(StyleKey::Base).fg(palette.chat_border));
    let inner = block.inner(area);
    let lines = app.transcript().lines(palette, inner.width);
    let offset = scroll_offset(lines.len(), inner.height, app.scroll());

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .style(palette.style(StyleKey::Base))
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

fn draw_input(frame: &mut Frame<'_>, app: &App, palette: &Palette, area: Rect) {
    let (style, title) = if app.is_streaming() {
        (
            palette.style(StyleKey::InputDisabled),
            " Streaming... press Esc to stop ",
        )
    } else {
        (
            palette.style(StyleKey::Input),
            " Message (Enter to send, Shift+Enter for newline) ",
        )
    };

    let block = Block::bordered().title(title).border_style(style);
    let inner = block.inner(area);

    let before_cursor = &app.input()[..app.cursor()];
    let cursor_row = before_cursor.matches('\n').count() as u16;
    let cursor_col = before_cursor.rsplit('\n').next().unwrap_or_default().width() as u16;
    let scroll = cursor_row.saturating_sub(inner.height.saturating_sub(1));

    frame.render_widget(
        Paragraph::new(app.input()).block(block).style(style).scroll((scroll, 0)),
        area,
    );

    if !app.is_streaming() && app.overlay().is_none() {
        frame.set_cursor_position(Position::new(
            inner.x + cursor_col.min(inner.width.saturating_sub(1)),
            inner.y + cursor_row - scroll,
        ));
    }
}

fn draw_status(frame: &mut Frame<'_>, app: &App, palette: &Palette, area: Rect) {
    let status = app.status();
    let style = match status.kind {
        StatusKind::Info => palette.style(StyleKey::Status),
        StatusKind::Error => palette.style(StyleKey::StatusError),
    };
    let mut spans = vec![Span::styled(format!(" {}", status.text), style)];
    if app.is_streaming() {
        let hint = " STOP: Esc ";
        let used = status.text.width() + 1;
        let gap = usize::from(area.width).saturating_sub(used + hint.width());
        spans.push(Span::styled(" ".repeat(gap), style));
        spans.push(Span::styled(hint, palette.style(StyleKey::StopHint)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(palette.style(StyleKey::Status)),
        area,
    );
}

fn draw_overlay(frame: &mut Frame<'_>, app: &App, palette: &Palette, overlay: &Overlay, area: Rect) {
    let body = palette.style(StyleKey::Overlay);
    let title_style = palette.style(StyleKey::OverlayTitle);

    let (title, lines): (&str, Vec<Line<'static>>) = match overlay {
        Overlay::ConfirmClear => (
            " Confirm Clear History ",
            vec![
                Line::from("Are you sure you want to clear ALL conversation history? This cannot be undone."),
                Line::default(),
                Line::from("[y] Yes    [n] No"),
            ],
        ),
        Overlay::History(summary) => {
            let mut lines: Vec<Line<'static>> =
                summary.lines().map(|line| Line::from(line.to_string())).collect();
            lines.push(Line::default());
            lines.push(Line::from("Esc to close"));
            (" Past Chat History ", lines)
        }
        Overlay::ModelPicker { selected } => {
            let current = app.conversation().model();
            let lines = app
                .models()
                .names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let marker = if name == current { "*" } else { " " };
                    let text = format!("{} {}", marker, name);
                    if i == *selected {
                        Line::from(Span::styled(text, palette.style(StyleKey::OverlaySelected)))
                    } else {
                        Line::from(text)
                    }
                })
                .collect();
            (" Select Model (Enter to switch, Esc to cancel) ", lines)
        }
    };

    let height = (lines.len() as u16 + 4).min(area.height);
    let width = (area.width * 3 / 4).max(30).min(area.width);
    let rect = centered(area, width, height);

    let block = Block::bordered()
        .title(Span::styled(title, title_style))
        .border_style(title_style)
        .style(body);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .style(body)
            .wrap(Wrap { trim: false }),
        rect,
    );
}

/// Top line to show so the view is pinned to the bottom, minus however far
/// the user scrolled back
fn scroll_offset(total: usize, height: u16, scrolled_back: u16) -> u16 {
    let total = u16::try_from(total).unwrap_or(u16::MAX);
    let max_offset = total.saturating_sub(height);
    max_offset - scrolled_back.min(max_offset)
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::AppSettings;
    use crate::tui::input::InputAction;
    use parley_config::AppConfig;
    use parley_core::{create_stream_channel, Conversation, HistoryStore};
    use parley_llm::{MockBackend, ModelList};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn app(dir: &TempDir) -> App {
        let store = HistoryStore::new(dir.path().join("history.json"));
        let conversation = Conversation::new(store, "llama3", "dark", "sys");
        let (tx, _rx) = create_stream_channel();
        let models = ModelList {
            names: vec!["llama3".into(), "mistral".into()],
            from_fallback: false,
        };
        App::new(
            conversation,
            Arc::new(MockBackend::new()),
            tx,
            models,
            AppSettings::from_config(&AppConfig::default()),
        )
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 24)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let width = usize::from(buffer.area.width);
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_renders_header_and_ready_status() {
        let dir = TempDir::new().unwrap();
        let text = screen(&app(&dir));
        assert!(text.contains("Parley | Model: llama3"));
        assert!(text.contains("Ready"));
        assert!(text.contains("Message (Enter to send"));
    }

    #[test]
    fn test_renders_typed_input() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        for c in "hello world".chars() {
            app.handle_action(InputAction::InsertChar(c));
        }
        assert!(screen(&app).contains("hello world"));
    }

    #[test]
    fn test_confirm_overlay_drawn() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.handle_action(InputAction::RequestClear);
        let text = screen(&app);
        assert!(text.contains("Confirm Clear History"));
        assert!(text.contains("[y] Yes"));
    }

    #[test]
    fn test_model_picker_marks_current() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.handle_action(InputAction::OpenModelPicker);
        let text = screen(&app);
        assert!(text.contains("* llama3"));
        assert!(text.contains("  mistral"));
    }

    #[test]
    fn test_palette_applied_to_status_bar() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let mut terminal = Terminal::new(TestBackend::new(90, 24)).unwrap();
        terminal.draw(|frame| draw(frame, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let cell = &buffer[(1, 23)];
        assert_eq!(cell.bg, Palette::DARK.bg_control);
    }

    #[test]
    fn test_scroll_offset_pins_to_bottom() {
        assert_eq!(scroll_offset(5, 10, 0), 0);
        assert_eq!(scroll_offset(40, 10, 0), 30);
        assert_eq!(scroll_offset(40, 10, 12), 18);
        // Cannot scroll past the top
        assert_eq!(scroll_offset(40, 10, 100), 0);
    }

    #[tokio::test]
    async fn test_streaming_shows_stop_hint() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.handle_action(InputAction::SendMessage("hi".into()));
        let text = screen(&app);
        assert!(text.contains("STOP: Esc"));
        assert!(text.contains("Streaming... press Esc to stop"));
    }
}
