//! Color palettes for the dark and light themes
//!
//! Themes are plain data: a [`Palette`] maps each [`StyleKey`] to a ratatui
//! [`Style`] and is consulted at render time, so switching themes is a
//! redraw rather than a restyle of existing widgets.

use parley_config::ThemeName;
use ratatui::style::{Color, Modifier, Style};

/// Every styled element of the chat screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKey {
    /// Screen background and default text
    Base,
    /// Title bar
    Header,
    UserLabel,
    UserBubble,
    ModelLabel,
    ModelBubble,
    /// Streamed text that has not been finalized
    Live,
    /// System notices in the transcript
    Notice,
    CodeHeader,
    CodeBody,
    CopyTag,
    Input,
    InputDisabled,
    Status,
    StatusError,
    /// Stop hint shown while streaming
    StopHint,
    Overlay,
    OverlayTitle,
    OverlaySelected,
}

/// Resolved colors for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name: ThemeName,
    pub bg_main: Color,
    pub bg_control: Color,
    pub fg_text: Color,
    pub chat_bg: Color,
    pub chat_border: Color,
    pub user_bubble_bg: Color,
    pub user_bubble_fg: Color,
    pub model_bubble_bg: Color,
    pub model_bubble_fg: Color,
    pub system_fg: Color,
    pub code_bg: Color,
    pub code_fg: Color,
    pub code_btn_bg: Color,
    pub code_btn_fg: Color,
    pub entry_bg: Color,
    pub entry_fg: Color,
    pub accent: Color,
    pub danger: Color,
    pub stop: Color,
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

impl Palette {
    pub const DARK: Palette = Palette {
        name: ThemeName::Dark,
        bg_main: rgb(0x282C34),
        bg_control: rgb(0x33373E),
        fg_text: rgb(0xE0E0E0),
        chat_bg: rgb(0x21252B),
        chat_border: rgb(0x444444),
        user_bubble_bg: rgb(0x6A5ACD),
        user_bubble_fg: rgb(0xFFFFFF),
        model_bubble_bg: rgb(0x3A3F47),
        model_bubble_fg: rgb(0xE0E0E0),
        system_fg: rgb(0xFFD700),
        code_bg: rgb(0x1E1E1E),
        code_fg: rgb(0xD4D4D4),
        code_btn_bg: rgb(0x4A4D52),
        code_btn_fg: rgb(0xFFFFFF),
        entry_bg: rgb(0x3A3F47),
        entry_fg: rgb(0xE0E0E0),
        accent: rgb(0x007BFF),
        danger: rgb(0xDC3545),
        stop: rgb(0xFF8C00),
    };

    pub const LIGHT: Palette = Palette {
        name: ThemeName::Light,
        bg_main: rgb(0xFFFFFF),
        bg_control: rgb(0xF0F0F0),
        fg_text: rgb(0x333333),
        chat_bg: rgb(0xFFFFFF),
        chat_border: rgb(0xEAEAEA),
        user_bubble_bg: rgb(0x007AFF),
        user_bubble_fg: rgb(0xFFFFFF),
        model_bubble_bg: rgb(0xEAEAEA),
        model_bubble_fg: rgb(0x000000),
        system_fg: rgb(0x8B0000),
        code_bg: rgb(0x282C34),
        code_fg: rgb(0xD7D7D7),
        code_btn_bg: rgb(0x3E4451),
        code_btn_fg: rgb(0xFFFFFF),
        entry_bg: rgb(0xFFFFFF),
        entry_fg: rgb(0x000000),
        accent: rgb(0x2196F3),
        danger: rgb(0xE53935),
        stop: rgb(0xFFC107),
    };

    pub fn for_theme(theme: ThemeName) -> Self {
        match theme {
            ThemeName::Dark => Self::DARK,
            ThemeName::Light => Self::LIGHT,
        }
    }

    pub fn style(&self, key: StyleKey) -> Style {
        let base = Style::default();
        match key {
            StyleKey::Base => base.fg(self.fg_text).bg(self.chat_bg),
            StyleKey::Header => base
                .fg(self.fg_text)
                .bg(self.bg_control)
                .add_modifier(Modifier::BOLD),
            StyleKey::UserLabel | StyleKey::ModelLabel => base
                .fg(self.fg_text)
                .bg(self.chat_bg)
                .add_modifier(Modifier::BOLD),
            StyleKey::UserBubble => base.fg(self.user_bubble_fg).bg(self.user_bubble_bg),
            StyleKey::ModelBubble => base.fg(self.model_bubble_fg).bg(self.model_bubble_bg),
            StyleKey::Live => base
                .fg(self.model_bubble_fg)
                .bg(self.model_bubble_bg)
                .add_modifier(Modifier::DIM),
            StyleKey::Notice => base
                .fg(self.system_fg)
                .bg(self.chat_bg)
                .add_modifier(Modifier::ITALIC),
            StyleKey::CodeHeader => base
                .fg(self.code_fg)
                .bg(self.code_bg)
                .add_modifier(Modifier::ITALIC),
            StyleKey::CodeBody => base.fg(self.code_fg).bg(self.code_bg),
            StyleKey::CopyTag => base.fg(self.code_btn_fg).bg(self.code_btn_bg),
            StyleKey::Input => base.fg(self.entry_fg).bg(self.entry_bg),
            StyleKey::InputDisabled => base
                .fg(self.chat_border)
                .bg(self.entry_bg)
                .add_modifier(Modifier::DIM),
            StyleKey::Status => base.fg(self.fg_text).bg(self.bg_control),
            StyleKey::StatusError => base.fg(self.danger).bg(self.bg_control),
            StyleKey::StopHint => base
                .fg(self.stop)
                .bg(self.bg_control)
                .add_modifier(Modifier::BOLD),
            StyleKey::Overlay => base.fg(self.fg_text).bg(self.bg_main),
            StyleKey::OverlayTitle => base
                .fg(self.accent)
                .bg(self.bg_main)
                .add_modifier(Modifier::BOLD),
            StyleKey::OverlaySelected => base.fg(self.user_bubble_fg).bg(self.user_bubble_bg),
        }
    }
}
