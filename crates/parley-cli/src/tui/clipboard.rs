//! Clipboard access

use crossterm::{clipboard::CopyToClipboard, execute};
use std::io::{self, Write};

pub trait Clipboard {
    fn copy(&mut self, text: &str) -> io::Result<()>;
}

/// Sets the system clipboard through the OSC 52 terminal escape.
///
/// Written to stderr so it does not interleave with frames drawn on stdout.
#[derive(Debug, Default)]
pub struct Osc52Clipboard;

impl Clipboard for Osc52Clipboard {
    fn copy(&mut self, text: &str) -> io::Result<()> {
        let mut stderr = io::stderr();
        execute!(stderr, CopyToClipboard::to_clipboard_from(text.as_bytes()))?;
        stderr.flush()
    }
}
