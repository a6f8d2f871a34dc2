use clap::{Parser, Subcommand, ValueEnum};
use parley_config::{BackendKind, ConfigOverrides, ThemeName};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl LogLevel {
    /// Parse a level from the config file, ignoring case
    pub fn from_config(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Dark,
    Light,
}

impl From<ThemeArg> for ThemeName {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Dark => ThemeName::Dark,
            ThemeArg::Light => ThemeName::Light,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "parley - terminal chat client for local Ollama models")]
#[command(version)]
#[command(arg_required_else_help = false)]
pub struct Cli {
    /// Subcommand to execute (defaults to chat if not provided)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses config file value or defaults to 'off'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log file path (defaults to the data directory)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Config file path (defaults to ~/.config/parley/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Model for a fresh conversation (overrides config file)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Ollama endpoint URL (overrides config file)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// History document path (overrides config file)
    #[arg(long, global = true)]
    pub history_file: Option<PathBuf>,

    /// Theme used when the history carries none
    #[arg(long, global = true, value_enum)]
    pub theme: Option<ThemeArg>,

    /// Use the offline mock backend instead of Ollama
    #[arg(long, global = true)]
    pub mock: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Interactive chat (default)
    Chat,

    /// List the models offered in the picker
    Models,

    /// Summarize the saved conversation
    History,

    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    /// Effective log level: `-v` wins, then the flag, then the config value
    pub fn effective_log_level(&self, configured: Option<&str>) -> LogLevel {
        if self.verbose {
            return LogLevel::Debug;
        }
        self.log_level
            .or_else(|| configured.and_then(LogLevel::from_config))
            .unwrap_or(LogLevel::Off)
    }

    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            history_file: self.history_file.clone(),
            theme: self.theme.map(ThemeName::from),
            backend: self.mock.then_some(BackendKind::Mock),
            log_file: self.log_file.clone(),
        }
    }
}
