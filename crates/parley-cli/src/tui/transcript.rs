//! Transcript view
//!
//! Holds what the chat pane shows: finalized entries plus at most one live
//! region for the turn that is streaming. [`TranscriptSink`] callbacks from
//! the conversation keep it in step with the turn log; the app calls the
//! direct operations for user input, notices and redraws.
//!
//! Finalizing removes the live region and pushes the parsed segments in the
//! same call, so no frame ever shows both.

use crate::tui::markup::{display_prose, strip_emphasis};
use crate::tui::theme::{Palette, StyleKey};
use parley_core::{blocks, Role, Segment, TranscriptSink, TurnId, TurnLog};
use ratatui::layout::Alignment;
use ratatui::text::{Line, Span};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

const USER_LABEL: &str = "[You]:";
const MODEL_LABEL: &str = "[Model]:";
const NOTICE_HEADER: &str = "--- [System] ---";
const LIVE_CURSOR: &str = "▌";

/// Finalized transcript content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    User(String),
    Assistant(Vec<Segment>),
    Notice(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LiveRegion {
    turn: TurnId,
    text: String,
}

#[derive(Debug, Default)]
pub struct TranscriptView {
    entries: Vec<Entry>,
    live: Option<LiveRegion>,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Streamed text of the live region, if one is open
    pub fn live_text(&self) -> Option<&str> {
        self.live.as_ref().map(|live| live.text.as_str())
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.entries.push(Entry::User(text.into()));
    }

    pub fn push_notice(&mut self, text: impl Into<String>) {
        self.entries.push(Entry::Notice(text.into()));
    }

    /// Remove everything from the display
    pub fn clear(&mut self) {
        self.entries.clear();
        self.live = None;
    }

    /// Rebuild the display from the turn log
    pub fn redraw(&mut self, log: &TurnLog) {
        self.clear();
        for message in log.turns() {
            match message.role {
                Role::User => self.push_user(message.content.clone()),
                Role::Assistant => self
                    .entries
                    .push(Entry::Assistant(blocks::parse(&message.content))),
                Role::System => {}
            }
        }
    }

    /// Code bodies on screen, numbered from 1 in display order
    pub fn code_blocks(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Assistant(segments) => Some(blocks::code_blocks(segments)),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// The `n`-th code block (1-based)
    pub fn code_block(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|index| self.code_blocks().get(index).copied())
    }

    /// Lay the transcript out as styled lines for a pane `width` columns wide
    pub fn lines(&self, palette: &Palette, width: u16) -> Vec<Line<'static>> {
        let width = usize::from(width.max(20));
        let mut out = Vec::new();
        let mut copy_index = 0usize;

        for entry in &self.entries {
            match entry {
                Entry::User(text) => user_lines(&mut out, palette, text, width),
                Entry::Assistant(segments) => {
                    out.push(label(MODEL_LABEL, palette, StyleKey::ModelLabel, Alignment::Left));
                    for segment in segments {
                        match segment {
                            Segment::Prose { text } => {
                                if let Some(prose) = display_prose(text) {
                                    bubble_lines(&mut out, palette, StyleKey::ModelBubble, &prose, width);
                                }
                            }
                            Segment::Code { code, .. } => {
                                copy_index += 1;
                                let language = segment.language_label().unwrap_or_default();
                                code_lines(&mut out, palette, language, code, copy_index, width);
                            }
                        }
                    }
                    out.push(Line::default());
                }
                Entry::Notice(text) => notice_lines(&mut out, palette, text, width),
            }
        }

        if let Some(live) = &self.live {
            out.push(label(MODEL_LABEL, palette, StyleKey::ModelLabel, Alignment::Left));
            let mut text = live.text.clone();
            text.push_str(LIVE_CURSOR);
            bubble_lines(&mut out, palette, StyleKey::Live, &text, width);
        }

        out
    }
}

impl TranscriptSink for TranscriptView {
    fn on_live_delta(&mut self, turn: TurnId, delta: &str) {
        if let Some(live) = self.live.as_mut().filter(|live| live.turn == turn) {
            live.text.push_str(delta);
            return;
        }
        self.live = Some(LiveRegion {
            turn,
            text: delta.to_string(),
        });
    }

    fn on_finalize(&mut self, turn: TurnId, segments: &[Segment]) {
        if let Some(live) = self.live.take() {
            if live.turn != turn {
                debug!(live = %live.turn, finalized = %turn, "Live region belonged to another turn");
            }
        }
        self.entries.push(Entry::Assistant(segments.to_vec()));
    }

    fn on_abandon(&mut self, _turn: TurnId, notice: &str) {
        self.live = None;
        self.push_notice(notice);
    }
}

fn label(text: &str, palette: &Palette, key: StyleKey, alignment: Alignment) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), palette.style(key))).alignment(alignment)
}

/// Wrap `text` to `width` columns, keeping its own line breaks
fn wrap(text: &str, width: usize) -> Vec<String> {
    text.split('\n')
        .flat_map(|line| {
            textwrap::wrap(line, width.max(1))
                .into_iter()
                .map(|part| part.into_owned())
                .collect::<Vec<_>>()
        })
        .collect()
}

fn user_lines(out: &mut Vec<Line<'static>>, palette: &Palette, text: &str, width: usize) {
    out.push(label(USER_LABEL, palette, StyleKey::UserLabel, Alignment::Right));
    let bubble_width = (width * 3 / 5).max(16);
    let style = palette.style(StyleKey::UserBubble);
    for line in wrap(text.trim(), bubble_width.saturating_sub(2)) {
        out.push(Line::from(Span::styled(format!(" {} ", line), style)).alignment(Alignment::Right));
    }
    out.push(Line::default());
}

fn bubble_lines(out: &mut Vec<Line<'static>>, palette: &Palette, key: StyleKey, text: &str, width: usize) {
    let bubble_width = (width * 3 / 4).max(16);
    let style = palette.style(key);
    for line in wrap(text, bubble_width.saturating_sub(2)) {
        out.push(Line::from(Span::styled(format!(" {} ", line), style)));
    }
}

fn code_lines(
    out: &mut Vec<Line<'static>>,
    palette: &Palette,
    language: &str,
    code: &str,
    copy_index: usize,
    width: usize,
) {
    let header = palette.style(StyleKey::CodeHeader);
    let body = palette.style(StyleKey::CodeBody);
    let block_width = width.saturating_sub(2);

    let tag = format!("[copy #{}]", copy_index);
    let title = format!(" {}", language);
    let gap = block_width
        .saturating_sub(title.width() + tag.width() + 1)
        .max(1);
    out.push(Line::from(vec![
        Span::raw(" "),
        Span::styled(format!("{}{}", title, " ".repeat(gap)), header),
        Span::styled(tag, palette.style(StyleKey::CopyTag)),
    ]));

    // Code is clipped, not wrapped, so indentation stays readable
    for line in code.split('\n') {
        let padding = block_width.saturating_sub(line.width() + 2);
        out.push(Line::from(vec![
            Span::raw(" "),
            Span::styled(format!("  {}{}", line, " ".repeat(padding)), body),
        ]));
    }
}

fn notice_lines(out: &mut Vec<Line<'static>>, palette: &Palette, text: &str, width: usize) {
    let style = palette.style(StyleKey::Notice);
    out.push(Line::default());
    out.push(Line::from(Span::styled(NOTICE_HEADER, style)).alignment(Alignment::Center));
    for line in wrap(&strip_emphasis(text), width.saturating_sub(4)) {
        out.push(Line::from(Span::styled(line, style)).alignment(Alignment::Center));
    }
    out.push(Line::default());
}
