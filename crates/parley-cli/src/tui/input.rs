//! Key mapping
//!
//! Translates crossterm key events into [`InputAction`]s. Whether an action is
//! allowed right now (for example while a response streams) is decided by the
//! app, not here.

use crate::tui::app::OverlayKind;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    SendMessage(String),
    InsertNewline,
    InsertChar(char),
    DeleteChar,
    MoveCursorLeft,
    MoveCursorRight,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    /// Stop streaming, close an overlay or clear the input
    Cancel,
    Exit,
    OpenModelPicker,
    /// Clear the display but keep the context
    NewDisplay,
    /// Ask to clear the full history
    RequestClear,
    ShowHistory,
    ToggleTheme,
    /// Copy the n-th code block (1-based)
    CopyCode(usize),
    CopyLastCode,
    MoveSelection(isize),
    Confirm,
    Decline,
    None,
}

/// Time window for double Ctrl+C to trigger exit
const DOUBLE_CTRL_C_WINDOW: Duration = Duration::from_millis(500);

/// State the key mapping depends on
#[derive(Debug, Clone, Copy, Default)]
pub struct InputContext<'a> {
    pub input: &'a str,
    pub overlay: Option<OverlayKind>,
    pub last_ctrl_c: Option<Instant>,
}

/// Map a crossterm key event to a TUI action
pub fn map_key_event(event: &KeyEvent, ctx: &InputContext<'_>) -> InputAction {
    // Ctrl+C handling - single cancels, double exits
    if (event.code, event.modifiers) == (KeyCode::Char('c'), KeyModifiers::CONTROL) {
        if let Some(last) = ctx.last_ctrl_c {
            if last.elapsed() < DOUBLE_CTRL_C_WINDOW {
                return InputAction::Exit;
            }
        }
        return InputAction::Cancel;
    }

    match ctx.overlay {
        Some(overlay) => map_overlay_key(event, overlay),
        None => map_chat_key(event, ctx),
    }
}

fn map_overlay_key(event: &KeyEvent, overlay: OverlayKind) -> InputAction {
    match (overlay, event.code) {
        (_, KeyCode::Esc) => InputAction::Decline,
        (OverlayKind::ConfirmClear, KeyCode::Char('y' | 'Y')) => InputAction::Confirm,
        (OverlayKind::ConfirmClear, KeyCode::Char('n' | 'N')) => InputAction::Decline,
        (OverlayKind::History, KeyCode::Enter | KeyCode::Char('q')) => InputAction::Decline,
        (OverlayKind::ModelPicker, KeyCode::Up | KeyCode::Char('k')) => InputAction::MoveSelection(-1),
        (OverlayKind::ModelPicker, KeyCode::Down | KeyCode::Char('j')) => InputAction::MoveSelection(1),
        (OverlayKind::ModelPicker, KeyCode::Enter) => InputAction::Confirm,
        _ => InputAction::None,
    }
}

fn map_chat_key(event: &KeyEvent, ctx: &InputContext<'_>) -> InputAction {
    match (event.code, event.modifiers) {
        (KeyCode::Esc, _) => InputAction::Cancel,
        (KeyCode::Char('d' | 'q'), KeyModifiers::CONTROL) => InputAction::Exit,

        // Shift+Enter where the terminal reports it, Ctrl+J or Alt+Enter elsewhere
        (KeyCode::Enter, m) if m.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
            InputAction::InsertNewline
        }
        (KeyCode::Char('j'), KeyModifiers::CONTROL) => InputAction::InsertNewline,

        // Enter sends message if buffer non-empty
        (KeyCode::Enter, _) => {
            if ctx.input.trim().is_empty() {
                InputAction::None
            } else {
                InputAction::SendMessage(ctx.input.to_string())
            }
        }

        // Controls
        (KeyCode::F(2), _) | (KeyCode::Char('o'), KeyModifiers::CONTROL) => {
            InputAction::OpenModelPicker
        }
        (KeyCode::F(3), _) | (KeyCode::Char('n'), KeyModifiers::CONTROL) => InputAction::NewDisplay,
        (KeyCode::F(4), _) | (KeyCode::Char('k'), KeyModifiers::CONTROL) => {
            InputAction::RequestClear
        }
        (KeyCode::F(5), _) | (KeyCode::Char('r'), KeyModifiers::CONTROL) => InputAction::ShowHistory,
        (KeyCode::F(6), _) | (KeyCode::Char('t'), KeyModifiers::CONTROL) => InputAction::ToggleTheme,
        (KeyCode::Char('y'), KeyModifiers::CONTROL) => InputAction::CopyLastCode,
        (KeyCode::Char(c @ '1'..='9'), KeyModifiers::ALT) => {
            InputAction::CopyCode(c as usize - '0' as usize)
        }

        // Navigation
        (KeyCode::Up, KeyModifiers::NONE) => InputAction::ScrollUp,
        (KeyCode::Down, KeyModifiers::NONE) => InputAction::ScrollDown,
        (KeyCode::PageUp, _) => InputAction::PageUp,
        (KeyCode::PageDown, _) => InputAction::PageDown,
        (KeyCode::Left, KeyModifiers::NONE) => InputAction::MoveCursorLeft,
        (KeyCode::Right, KeyModifiers::NONE) => InputAction::MoveCursorRight,

        // Editing
        (KeyCode::Backspace, _) => InputAction::DeleteChar,
        (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => InputAction::InsertChar(c),

        _ => InputAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_map_key_enter_sends_message() {
        let ctx = InputContext {
            input: "Hello",
            ..Default::default()
        };
        let action = map_key_event(&key(KeyCode::Enter, KeyModifiers::NONE), &ctx);

        assert_eq!(action, InputAction::SendMessage("Hello".to_string()));
    }

    #[test]
    fn test_map_key_enter_empty_does_nothing() {
        let ctx = InputContext {
            input: "  \n",
            ..Default::default()
        };
        let action = map_key_event(&key(KeyCode::Enter, KeyModifiers::NONE), &ctx);

        assert_eq!(action, InputAction::None);
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let ctx = InputContext {
            input: "line one",
            ..Default::default()
        };
        assert_eq!(
            map_key_event(&key(KeyCode::Enter, KeyModifiers::SHIFT), &ctx),
            InputAction::InsertNewline
        );
        assert_eq!(
            map_key_event(&key(KeyCode::Char('j'), KeyModifiers::CONTROL), &ctx),
            InputAction::InsertNewline
        );
    }

    #[test]
    fn test_esc_and_ctrl_c_cancel() {
        let ctx = InputContext::default();
        assert_eq!(
            map_key_event(&key(KeyCode::Esc, KeyModifiers::NONE), &ctx),
            InputAction::Cancel
        );
        assert_eq!(
            map_key_event(&key(KeyCode::Char('c'), KeyModifiers::CONTROL), &ctx),
            InputAction::Cancel
        );
    }

    #[test]
    fn test_double_ctrl_c_exits() {
        let ctx = InputContext {
            last_ctrl_c: Some(Instant::now()),
            ..Default::default()
        };
        assert_eq!(
            map_key_event(&key(KeyCode::Char('c'), KeyModifiers::CONTROL), &ctx),
            InputAction::Exit
        );
    }

    #[test]
    fn test_alt_digit_copies_block() {
        let ctx = InputContext::default();
        assert_eq!(
            map_key_event(&key(KeyCode::Char('3'), KeyModifiers::ALT), &ctx),
            InputAction::CopyCode(3)
        );
    }

    #[test]
    fn test_confirm_overlay_keys() {
        let ctx = InputContext {
            overlay: Some(OverlayKind::ConfirmClear),
            ..Default::default()
        };
        assert_eq!(
            map_key_event(&key(KeyCode::Char('y'), KeyModifiers::NONE), &ctx),
            InputAction::Confirm
        );
        assert_eq!(
            map_key_event(&key(KeyCode::Char('n'), KeyModifiers::NONE), &ctx),
            InputAction::Decline
        );
        // Typing is swallowed while the overlay is open
        assert_eq!(
            map_key_event(&key(KeyCode::Char('x'), KeyModifiers::NONE), &ctx),
            InputAction::None
        );
    }

    #[test]
    fn test_model_picker_navigation() {
        let ctx = InputContext {
            overlay: Some(OverlayKind::ModelPicker),
            ..Default::default()
        };
        assert_eq!(
            map_key_event(&key(KeyCode::Down, KeyModifiers::NONE), &ctx),
            InputAction::MoveSelection(1)
        );
        assert_eq!(
            map_key_event(&key(KeyCode::Enter, KeyModifiers::NONE), &ctx),
            InputAction::Confirm
        );
    }
}
