use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::{BackendKind, Config, Environment};

static CONSOLE_LOGGER: Lazy<ConsoleLogger> = Lazy::new(ConsoleLogger::new);

pub fn init() -> Result<(), String> {
    init_with_config(LoggerConfig::default())
}

/// Installs the process logger. A second call only swaps the configuration.
pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let level = config.min_level.to_log_level_filter();
    CONSOLE_LOGGER.update_config(config)?;

    if log::set_logger(&*CONSOLE_LOGGER).is_err() {
        log::debug!("Logger already installed, configuration updated");
    }
    log::set_max_level(level);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn to_log_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }

    pub fn from_log_level(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("Unknown log level '{}'", other)),
        }
    }
}

/// One formatted line, also the shape of JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl LogEntry {
    fn from_record(record: &Record) -> Self {
        let location = match (record.file(), record.line()) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        };
        Self {
            timestamp: Utc::now(),
            level: LogLevel::from_log_level(record.level()),
            target: record.target().to_string(),
            message: record.args().to_string(),
            location,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_target: bool,
    pub show_file_location: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_file_path: Option<String>,
    /// Chatty dependency targets are capped at `Warn` unless this is set.
    pub verbose_dependencies: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_target: true,
            show_file_location: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_file_path: None,
            verbose_dependencies: false,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_file_output(mut self, path: &str) -> Self {
        self.log_file_path = Some(path.to_string());
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn production() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: false,
            output_json: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            show_colors: true,
            show_file_location: true,
            ..Default::default()
        }
    }

    /// Preset from `APP_ENV`, then `LOG_LEVEL` and `LOG_FILE` overrides.
    pub fn from_env() -> Result<Self, String> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV") {
            Some(raw) => raw.parse::<Environment>().map_err(|e| e.to_string())?,
            None => Environment::Development,
        };
        let mut config = match environment {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
        };

        if let Some(level) = lookup("LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
            config.min_level = level.parse()?;
        }
        if let Some(path) = lookup("LOG_FILE").filter(|v| !v.trim().is_empty()) {
            config.log_file_path = Some(path);
        }
        Ok(config)
    }
}

const QUIET_TARGETS: &[&str] = &["hyper", "reqwest", "h2", "rustls", "mio", "actix_server", "want"];

struct LoggerState {
    config: LoggerConfig,
    file: Option<File>,
}

pub struct ConsoleLogger {
    state: Mutex<LoggerState>,
}

impl ConsoleLogger {
    fn new() -> Self {
        Self {
            state: Mutex::new(LoggerState {
                config: LoggerConfig::default(),
                file: None,
            }),
        }
    }

    fn update_config(&self, config: LoggerConfig) -> Result<(), String> {
        let file = match &config.log_file_path {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| format!("Failed to open log file {}: {}", path, e))?,
            ),
            None => None,
        };

        let mut state = self
            .state
            .lock()
            .map_err(|_| "Logger state poisoned".to_string())?;
        state.config = config;
        state.file = file;
        Ok(())
    }

    fn format_console_output(entry: &LogEntry, config: &LoggerConfig) -> String {
        let mut output = String::new();

        let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
        if config.show_colors {
            output.push_str(&format!("{} ", timestamp.bright_black()));
            output.push_str(&format!(
                "[{}] ",
                format!("{:<5}", entry.level.as_str())
                    .color(entry.level.color())
                    .bold()
            ));
        } else {
            output.push_str(&format!("{} [{:<5}] ", timestamp, entry.level.as_str()));
        }

        if config.show_target {
            if config.show_colors {
                output.push_str(&format!("{}: ", entry.target.bright_blue()));
            } else {
                output.push_str(&format!("{}: ", entry.target));
            }
        }

        output.push_str(&entry.message);

        if config.show_file_location {
            if let Some(location) = &entry.location {
                if config.show_colors {
                    output.push_str(&format!(" ({})", location.bright_black()));
                } else {
                    output.push_str(&format!(" ({})", location));
                }
            }
        }

        output
    }

    fn render(entry: &LogEntry, config: &LoggerConfig) -> String {
        if config.output_json {
            serde_json::to_string(entry).unwrap_or_else(|_| entry.message.clone())
        } else {
            Self::format_console_output(entry, config)
        }
    }
}

fn is_quiet_target(target: &str) -> bool {
    QUIET_TARGETS
        .iter()
        .any(|quiet| target == *quiet || target.starts_with(&format!("{}::", quiet)))
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let Ok(state) = self.state.lock() else {
            return true;
        };
        let level = LogLevel::from_log_level(metadata.level());
        if level < state.config.min_level {
            return false;
        }
        state.config.verbose_dependencies || level >= LogLevel::Warn || !is_quiet_target(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_record(record);

        if let Ok(mut state) = self.state.lock() {
            let line = Self::render(&entry, &state.config);
            if entry.level >= LogLevel::Warn {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }

            if state.file.is_some() {
                // Files never get ANSI colour codes.
                let plain = LoggerConfig {
                    show_colors: false,
                    ..state.config.clone()
                };
                let line = Self::render(&entry, &plain);
                if let Some(file) = state.file.as_mut() {
                    let _ = writeln!(file, "{}", line);
                }
            }
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        if let Ok(mut state) = self.state.lock() {
            if let Some(file) = state.file.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Measures an operation; logs its duration at debug level when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::debug!(
            "Timer '{}' completed in {:.2}ms",
            self.name,
            self.elapsed().as_secs_f64() * 1000.0
        );
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_startup_info(app_name: &str, version: &str, address: &str) {
    log::info!("Starting {} v{}", app_name, version);
    log::info!("Server will listen on http://{}", address);
}

fn key_state(key: &Option<String>) -> &'static str {
    if key.is_some() {
        "present"
    } else {
        "missing"
    }
}

/// Configuration summary. Credentials are reported as present or missing only.
pub fn log_config_info(config: &Config) {
    let backends = if config.backends.is_empty() {
        "none (placeholder only)".to_string()
    } else {
        config
            .backends
            .iter()
            .map(BackendKind::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    };

    log::info!("Configuration loaded:");
    log::info!("   Environment: {:?}", config.environment);
    log::info!("   Backends: {}", backends);
    if config.backends.contains(&BackendKind::Prodia) {
        log::info!(
            "   Prodia: {} (key {}), polling {} x {}ms",
            config.prodia.base_url,
            key_state(&config.prodia.api_key),
            config.polling.max_attempts,
            config.polling.interval.as_millis()
        );
    }
    if config.backends.contains(&BackendKind::Pollinations) {
        log::info!("   Pollinations: {}", config.pollinations.base_url);
    }
    if config.backends.contains(&BackendKind::Gemini) {
        log::info!(
            "   Gemini: {} (key {})",
            config.gemini.model,
            key_state(&config.gemini.api_key)
        );
    }
    log::info!(
        "   Fallback: {:?} / {:?}, on backend failure: {:?}",
        config.fallback_format,
        config.fallback_style,
        config.failure_policy
    );
    log::info!("   Request timeout: {}s", config.request_timeout.as_secs());
}
