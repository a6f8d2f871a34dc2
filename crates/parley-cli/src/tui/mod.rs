//! Terminal chat interface

pub mod app;
pub mod clipboard;
pub mod input;
pub mod markup;
pub mod render;
pub mod runner;
pub mod theme;
pub mod transcript;

pub use app::{App, AppSettings, Overlay, OverlayKind, StatusKind, StatusLine};
pub use clipboard::{Clipboard, Osc52Clipboard};
pub use input::{map_key_event, InputAction, InputContext};
pub use render::draw;
pub use runner::run;
pub use theme::{Palette, StyleKey};
pub use transcript::{Entry, TranscriptView};
