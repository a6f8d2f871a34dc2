//! Chat application state
//!
//! [`App`] is driven entirely from the UI task: key actions, worker events and
//! clock ticks come in, and the renderer reads the state back out. It owns the
//! [`Conversation`], which enforces the one-turn-at-a-time rule, and spawns a
//! [`TurnWorker`] for each accepted prompt.

use crate::commands::history::format_summary;
use crate::tui::clipboard::{Clipboard, Osc52Clipboard};
use crate::tui::input::{map_key_event, InputAction, InputContext};
use crate::tui::theme::Palette;
use crate::tui::transcript::TranscriptView;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use parley_config::{defaults, AppConfig, PromptConfig, ThemeName};
use parley_core::{
    ChatBackend, Conversation, HistorySummary, RestoreOutcome, StreamEvent, StreamEventSender,
    TurnOutcome, TurnWorker,
};
use parley_llm::ModelList;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub const READY: &str = "Ready";

const COPY_STATUS_TIMEOUT: Duration = Duration::from_millis(2_000);
const ERROR_STATUS_TIMEOUT: Duration = Duration::from_millis(8_000);
const PAGE_LINES: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    ConfirmClear,
    History,
    ModelPicker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    ConfirmClear,
    /// Summary text of the saved document
    History(String),
    ModelPicker { selected: usize },
}

impl Overlay {
    pub fn kind(&self) -> OverlayKind {
        match self {
            Overlay::ConfirmClear => OverlayKind::ConfirmClear,
            Overlay::History(_) => OverlayKind::History,
            Overlay::ModelPicker { .. } => OverlayKind::ModelPicker,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// Status bar text that reverts to [`READY`] once it expires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub kind: StatusKind,
    expires_at: Option<Instant>,
}

impl StatusLine {
    fn ready() -> Self {
        Self {
            text: READY.to_string(),
            kind: StatusKind::Info,
            expires_at: None,
        }
    }
}

/// Settings the app takes from the loaded configuration
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub prompts: PromptConfig,
    pub default_model: String,
    pub status_timeout: Duration,
}

impl AppSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            prompts: config.prompts.clone(),
            default_model: config.chat.chat_model(),
            status_timeout: Duration::from_millis(config.ui.status_timeout_ms()),
        }
    }
}

pub struct App {
    conversation: Conversation,
    transcript: TranscriptView,
    backend: Arc<dyn ChatBackend>,
    events_tx: StreamEventSender,
    settings: AppSettings,
    models: ModelList,
    theme: ThemeName,
    input: String,
    cursor: usize,
    status: StatusLine,
    overlay: Option<Overlay>,
    /// Lines scrolled up from the bottom of the transcript
    scroll: u16,
    last_ctrl_c: Option<Instant>,
    should_quit: bool,
    clipboard: Box<dyn Clipboard>,
    worker: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(
        conversation: Conversation,
        backend: Arc<dyn ChatBackend>,
        events_tx: StreamEventSender,
        models: ModelList,
        settings: AppSettings,
    ) -> Self {
        let theme = ThemeName::from_persisted(conversation.theme());
        Self {
            conversation,
            transcript: TranscriptView::new(),
            backend,
            events_tx,
            settings,
            models,
            theme,
            input: String::new(),
            cursor: 0,
            status: StatusLine::ready(),
            overlay: None,
            scroll: 0,
            last_ctrl_c: None,
            should_quit: false,
            clipboard: Box::new(Osc52Clipboard),
            worker: None,
        }
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Present the restored conversation and any startup notices
    pub fn startup(&mut self, restore: RestoreOutcome, backend_notice: Option<String>) {
        if let Some(notice) = backend_notice {
            self.transcript.push_notice(notice);
        }
        if self.models.from_fallback {
            self.transcript.push_notice(format!(
                "Could not connect to Ollama server to list models. Using fallback models: {}.",
                self.models.names.join(", ")
            ));
        }

        match restore {
            RestoreOutcome::Restored => {
                if let Some(model) = self.unlisted_model_replacement() {
                    warn!(
                        model = %self.conversation.model(),
                        fallback = %model,
                        "Restored model is not available"
                    );
                    self.conversation.set_model(model);
                }
                self.transcript.redraw(self.conversation.log());
                let message = format!(
                    "Chat history loaded using model: {}. Ready to continue.",
                    self.conversation.model()
                );
                self.set_status(message);
            }
            RestoreOutcome::Missing => {
                let saved = match self.unlisted_model_replacement() {
                    Some(model) => {
                        warn!(
                            model = %self.conversation.model(),
                            fallback = %model,
                            "Configured model is not available"
                        );
                        let prompt = self.settings.prompts.system_prompt_for(&model);
                        self.conversation.switch_model(model, prompt)
                    }
                    None => self.conversation.save(),
                };
                self.transcript.push_notice(format!(
                    "New conversation context started with model: {}.",
                    self.conversation.model()
                ));
                if let Err(e) = saved {
                    self.set_error(format!("Could not save chat history: {}", e));
                }
            }
            RestoreOutcome::Corrupt(reason) => {
                debug!(%reason, "Started fresh after unreadable history");
                self.set_error("Error loading chat history. Starting a new chat.");
            }
        }
    }

    /// Listed model to use instead of the active one, if the active one is
    /// not offered: the configured default, then the built-in default, then
    /// the first listed model
    fn unlisted_model_replacement(&self) -> Option<String> {
        if self.models.contains(self.conversation.model()) {
            return None;
        }
        [self.settings.default_model.as_str(), defaults::DEFAULT_MODEL]
            .into_iter()
            .find(|model| self.models.contains(model))
            .or_else(|| self.models.names.first().map(String::as_str))
            .map(str::to_string)
    }

    // --- accessors used by the renderer ---

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn transcript(&self) -> &TranscriptView {
        &self.transcript
    }

    pub fn models(&self) -> &ModelList {
        &self.models
    }

    pub fn theme(&self) -> ThemeName {
        self.theme
    }

    pub fn palette(&self) -> Palette {
        Palette::for_theme(self.theme)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Byte offset of the cursor in [`App::input`]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn is_streaming(&self) -> bool {
        self.conversation.is_streaming()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    // --- input ---

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctx = InputContext {
            input: &self.input,
            overlay: self.overlay.as_ref().map(Overlay::kind),
            last_ctrl_c: self.last_ctrl_c,
        };
        let action = map_key_event(&key, &ctx);

        let is_ctrl_c = (key.code, key.modifiers) == (KeyCode::Char('c'), KeyModifiers::CONTROL);
        self.last_ctrl_c = is_ctrl_c.then(Instant::now);

        self.handle_action(action);
    }

    pub fn handle_action(&mut self, action: InputAction) {
        match action {
            InputAction::SendMessage(text) => self.send(&text),
            InputAction::Cancel => self.cancel(),
            InputAction::Exit => self.should_quit = true,

            InputAction::InsertChar(c) => self.edit(|input, cursor| {
                input.insert(*cursor, c);
                *cursor += c.len_utf8();
            }),
            InputAction::InsertNewline => self.edit(|input, cursor| {
                input.insert(*cursor, '\n');
                *cursor += 1;
            }),
            InputAction::DeleteChar => self.edit(|input, cursor| {
                if let Some((prev, _)) = input[..*cursor].char_indices().next_back() {
                    input.replace_range(prev..*cursor, "");
                    *cursor = prev;
                }
            }),
            InputAction::MoveCursorLeft => {
                if let Some((prev, _)) = self.input[..self.cursor].char_indices().next_back() {
                    self.cursor = prev;
                }
            }
            InputAction::MoveCursorRight => {
                if let Some(c) = self.input[self.cursor..].chars().next() {
                    self.cursor += c.len_utf8();
                }
            }

            InputAction::ScrollUp => self.scroll = self.scroll.saturating_add(1),
            InputAction::ScrollDown => self.scroll = self.scroll.saturating_sub(1),
            InputAction::PageUp => self.scroll = self.scroll.saturating_add(PAGE_LINES),
            InputAction::PageDown => self.scroll = self.scroll.saturating_sub(PAGE_LINES),

            InputAction::OpenModelPicker => {
                if self.controls_enabled() {
                    let selected = self
                        .models
                        .names
                        .iter()
                        .position(|name| name == self.conversation.model())
                        .unwrap_or(0);
                    self.overlay = Some(Overlay::ModelPicker { selected });
                }
            }
            InputAction::NewDisplay => {
                if self.controls_enabled() {
                    self.new_display();
                }
            }
            InputAction::RequestClear => {
                if self.controls_enabled() {
                    self.overlay = Some(Overlay::ConfirmClear);
                }
            }
            InputAction::ShowHistory => {
                if self.controls_enabled() {
                    self.show_history();
                }
            }
            InputAction::ToggleTheme => {
                if self.controls_enabled() {
                    self.toggle_theme();
                }
            }
            InputAction::CopyCode(n) => self.copy_code(Some(n)),
            InputAction::CopyLastCode => self.copy_code(None),

            InputAction::MoveSelection(delta) => {
                let count = self.models.names.len();
                if let Some(Overlay::ModelPicker { selected }) = self.overlay.as_mut() {
                    if count > 0 {
                        *selected = (*selected as isize + delta).rem_euclid(count as isize) as usize;
                    }
                }
            }
            InputAction::Confirm => self.confirm_overlay(),
            InputAction::Decline => self.overlay = None,
            InputAction::None => {}
        }
    }

    /// Apply a worker event to the conversation and the transcript
    pub fn on_stream_event(&mut self, event: StreamEvent) {
        let streaming_delta = matches!(event, StreamEvent::Delta { .. });

        match self.conversation.apply(event, &mut self.transcript) {
            Ok(None) => {
                if streaming_delta && self.conversation.is_streaming() {
                    let message =
                        format!("Streaming response from {}...", self.conversation.model());
                    if self.status.text != message {
                        self.set_status(message);
                    }
                }
            }
            Ok(Some(TurnOutcome::Completed {
                cancelled, saved, ..
            })) => {
                self.worker = None;
                if !saved {
                    self.set_error("Response complete, but the chat history could not be saved.");
                } else if cancelled {
                    self.set_status("Generation stopped and response finalized.");
                } else {
                    self.set_status("Response complete.");
                }
            }
            Ok(Some(TurnOutcome::Abandoned { .. })) => {
                self.worker = None;
                self.set_error("Error communicating with Ollama server.");
            }
            Err(e) => {
                error!(error = %e, "Failed to apply stream event");
                self.set_error(e.to_string());
            }
        }
    }

    /// Expire the status message
    pub fn tick(&mut self, now: Instant) {
        if self.status.expires_at.is_some_and(|at| now >= at) {
            self.status = StatusLine::ready();
        }
    }

    /// Stop any running turn and write the last complete turn boundary
    pub fn shutdown(&mut self) {
        if self.conversation.cancel() {
            info!("Cancelling in-flight turn on exit");
        }
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
        match self.conversation.save() {
            Ok(()) => info!(path = %self.conversation.store().path().display(), "History saved on exit"),
            Err(e) => error!(error = %e, "Failed to save history on exit"),
        }
    }

    // --- operations ---

    fn send(&mut self, text: &str) {
        if self.is_streaming() {
            self.set_status("A response is still streaming. Stop it first.");
            return;
        }
        let prompt = text.trim();
        if prompt.is_empty() {
            return;
        }

        match self.conversation.submit(prompt) {
            Ok(request) => {
                self.transcript.push_user(prompt);
                self.input.clear();
                self.cursor = 0;
                self.scroll = 0;
                let message = format!("Sending prompt to {}...", request.model);
                self.set_status(message);
                info!(turn = %request.turn, model = %request.model, "Prompt sent");
                self.worker = Some(TurnWorker::spawn(
                    Arc::clone(&self.backend),
                    request,
                    self.events_tx.clone(),
                ));
            }
            Err(e) => {
                warn!(error = %e, "Prompt rejected");
                self.set_error(e.to_string());
            }
        }
    }

    fn cancel(&mut self) {
        if self.overlay.take().is_some() {
            return;
        }
        if self.conversation.cancel() {
            self.set_status("Stopping model generation...");
            return;
        }
        self.input.clear();
        self.cursor = 0;
    }

    fn edit(&mut self, change: impl FnOnce(&mut String, &mut usize)) {
        if self.is_streaming() {
            return;
        }
        change(&mut self.input, &mut self.cursor);
    }

    fn controls_enabled(&mut self) -> bool {
        if self.is_streaming() {
            self.set_status("Controls are disabled while a response is streaming.");
            return false;
        }
        true
    }

    fn confirm_overlay(&mut self) {
        match self.overlay.take() {
            Some(Overlay::ConfirmClear) => self.clear_history(),
            Some(Overlay::ModelPicker { selected }) => {
                if let Some(model) = self.models.names.get(selected).cloned() {
                    self.switch_model(model);
                }
            }
            Some(Overlay::History(_)) | None => {}
        }
    }

    fn switch_model(&mut self, model: String) {
        if model == self.conversation.model() {
            return;
        }
        let prompt = self.settings.prompts.system_prompt_for(&model);
        if let Err(e) = self.conversation.switch_model(model.clone(), prompt) {
            self.set_error(format!("Could not switch model: {}", e));
            return;
        }
        info!(%model, "Model switched");
        self.transcript.clear();
        self.transcript.push_notice(format!(
            "Model switched to **{}**. Starting a new conversation context.",
            model
        ));
        self.set_status(format!("Model switched to {}. New context started.", model));
    }

    fn clear_history(&mut self) {
        let prompt = self
            .settings
            .prompts
            .system_prompt_for(self.conversation.model());
        if let Err(e) = self.conversation.reset(prompt) {
            self.set_error(format!("Could not clear history: {}", e));
            return;
        }
        self.transcript.clear();
        self.transcript.push_notice(format!(
            "Full history cleared. New conversation context started with model: {}.",
            self.conversation.model()
        ));
        self.set_status("History cleared.");
    }

    fn new_display(&mut self) {
        self.transcript.clear();
        self.transcript.push_notice(format!(
            "Display cleared. Conversation context ({} messages) is still active in the background. Ask your next question now.",
            self.conversation.log().context_len()
        ));
        self.scroll = 0;
        self.set_status("Display cleared. Context preserved.");
    }

    fn show_history(&mut self) {
        match self.conversation.store().load() {
            Ok(Some(document)) => {
                let summary = HistorySummary::from_document(&document);
                self.overlay = Some(Overlay::History(format_summary(&summary)));
                self.set_status("Chat history window displayed.");
            }
            Ok(None) => self.set_error("Could not load chat history file."),
            Err(e) => {
                warn!(error = %e, "History window could not read the document");
                self.set_error("Could not load chat history file.");
            }
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        if let Err(e) = self.conversation.set_theme(self.theme.as_str()) {
            warn!(error = %e, "Theme change not persisted");
            self.set_error(format!("Could not save theme: {}", e));
        } else {
            self.set_status(format!("Theme switched to {}.", self.theme));
        }
        self.transcript.redraw(self.conversation.log());
    }

    fn copy_code(&mut self, n: Option<usize>) {
        let blocks = self.transcript.code_blocks().len();
        let index = n.unwrap_or(blocks);
        let Some(code) = self.transcript.code_block(index).map(str::to_string) else {
            self.set_status(match n {
                Some(n) => format!("No code block #{} on screen.", n),
                None => "No code block on screen.".to_string(),
            });
            return;
        };

        match self.clipboard.copy(&code) {
            Ok(()) => self.set_status_for("Code copied to clipboard!", COPY_STATUS_TIMEOUT),
            Err(e) => {
                warn!(error = %e, "Clipboard write failed");
                self.set_error(format!("Could not copy code: {}", e));
            }
        }
    }

    fn set_status(&mut self, text: impl Into<String>) {
        let timeout = self.settings.status_timeout;
        self.set_status_for(text, timeout);
    }

    fn set_status_for(&mut self, text: impl Into<String>, timeout: Duration) {
        self.status = StatusLine {
            text: text.into(),
            kind: StatusKind::Info,
            expires_at: Some(Instant::now() + timeout),
        };
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.status = StatusLine {
            text: text.into(),
            kind: StatusKind::Error,
            expires_at: Some(Instant::now() + ERROR_STATUS_TIMEOUT),
        };
    }
}
