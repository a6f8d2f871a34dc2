//! Terminal chat client for a local Ollama server

pub mod cli;
pub mod commands;
pub mod logging;
pub mod tui;
