//! TUI runner - main event loop for terminal UI
//!
//! Owns the terminal for the lifetime of the chat. Worker events, terminal
//! input and a clock tick are multiplexed on the UI task, so every change to
//! [`App`] happens here and in arrival order.

use crate::tui::app::App;
use crate::tui::render::draw;
use anyhow::Result;
use crossterm::{
    cursor,
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use parley_core::StreamEventReceiver;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, error};

const TICK: Duration = Duration::from_millis(250);

/// Run the chat screen until the user quits.
pub async fn run(app: &mut App, events: &mut StreamEventReceiver) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = main_loop(&mut terminal, app, events).await;
    app.shutdown();

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    result
}

async fn main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut StreamEventReceiver,
) -> Result<()> {
    let mut reader = EventStream::new();
    let mut tick = tokio::time::interval(TICK);

    while !app.should_quit() {
        terminal.draw(|frame| draw(frame, app))?;

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                app.on_stream_event(event);
                // Apply whatever else is already queued before the next frame
                while let Ok(event) = events.try_recv() {
                    app.on_stream_event(event);
                }
            }
            maybe_event = reader.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key);
                }
                Some(Ok(Event::Resize(width, height))) => {
                    debug!(width, height, "Terminal resized");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!(error = %e, "Terminal event stream error");
                    return Err(e.into());
                }
                None => break,
            },
            _ = tick.tick() => {
                app.tick(Instant::now());
            }
        }
    }

    Ok(())
}
