use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

static COVER_LOGGER: Lazy<CoverLogger> = Lazy::new(CoverLogger::new);

pub fn init() -> Result<(), String> {
    init_with_config(LoggerConfig::default())
}

pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    // A logger that is already installed keeps its settings.
    log::set_logger(&*COVER_LOGGER).map_err(|e| format!("Failed to set logger: {:?}", e))?;

    log::set_max_level(config.min_level.to_level_filter());
    COVER_LOGGER.update_config(config);
    Ok(())
}

/// Tag every following log line with `run_id`, or clear the tag with `None`.
pub fn set_run_id(run_id: Option<Uuid>) {
    if let Ok(mut current) = COVER_LOGGER.run_id.lock() {
        *current = run_id;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
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

    pub fn emoji(&self) -> &'static str {
        match self {
            LogLevel::Trace => "🔍",
            LogLevel::Debug => "🐛",
            LogLevel::Info => "💡",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
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

    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
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

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub module: String,
    pub file: String,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: String, module: String, file: String, line: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level,
            message,
            module,
            file,
            line,
            run_id: None,
        }
    }

    pub fn with_run_id(mut self, run_id: Option<Uuid>) -> Self {
        self.run_id = run_id.map(|id| id.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_file_location: bool,
    pub show_module: bool,
    pub include_timestamp: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_to_file: bool,
    pub log_file_path: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_emojis: true,
            show_file_location: false,
            show_module: true,
            include_timestamp: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_to_file: false,
            log_file_path: "rcover.log".to_string(),
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
        self.log_to_file = true;
        self.log_file_path = path.to_string();
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    /// Settings for the command line: `RCOVER_LOG_FILE` appends plain lines to
    /// a file, `json` switches stderr to one JSON object per line, and debug
    /// level also prints source locations.
    pub fn for_cli(level: LogLevel, json: bool, log_file: Option<&str>) -> Self {
        let mut config = Self::new()
            .with_level(level)
            .with_json_output(json)
            .with_colors(!json && io::stderr().is_terminal());
        config.show_file_location = level <= LogLevel::Debug;
        match log_file {
            Some(path) if !path.trim().is_empty() => config.with_file_output(path.trim()),
            _ => config,
        }
    }
}

/// Writes to stderr so stdout stays free for command output.
pub struct CoverLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
    run_id: Mutex<Option<Uuid>>,
}

impl CoverLogger {
    pub fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
            run_id: Mutex::new(None),
        }
    }

    pub fn update_config(&self, new_config: LoggerConfig) {
        if new_config.log_to_file {
            match OpenOptions::new()
                .create(true)
                .append(true)
                .open(&new_config.log_file_path)
            {
                Ok(file) => {
                    if let Ok(mut log_file) = self.log_file.lock() {
                        *log_file = Some(file);
                    }
                }
                Err(e) => eprintln!(
                    "Could not open log file {}: {}",
                    new_config.log_file_path, e
                ),
            }
        }

        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
    }

    fn format_console_output(&self, entry: &LogEntry, config: &LoggerConfig) -> String {
        let mut output = String::new();

        if config.include_timestamp {
            let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
            if config.show_colors {
                output.push_str(&format!("{} ", timestamp.bright_black()));
            } else {
                output.push_str(&format!("{} ", timestamp));
            }
        }

        let level_str = if config.show_emojis {
            format!("{} {}", entry.level.emoji(), entry.level.as_str())
        } else {
            entry.level.as_str().to_string()
        };
        if config.show_colors {
            output.push_str(&format!("[{}] ", level_str.color(entry.level.color()).bold()));
        } else {
            output.push_str(&format!("[{}] ", level_str));
        }

        if config.show_module && !entry.module.is_empty() {
            if config.show_colors {
                output.push_str(&format!("{}::", entry.module.bright_blue()));
            } else {
                output.push_str(&format!("{}::", entry.module));
            }
        }

        output.push_str(&entry.message);

        if let Some(run_id) = &entry.run_id {
            let short = &run_id[..8.min(run_id.len())];
            if config.show_colors {
                output.push_str(&format!(" [run:{}]", short.bright_yellow()));
            } else {
                output.push_str(&format!(" [run:{}]", short));
            }
        }

        if config.show_file_location {
            let location = format!("{}:{}", entry.file, entry.line);
            if config.show_colors {
                output.push_str(&format!(" ({})", location.bright_black()));
            } else {
                output.push_str(&format!(" ({})", location));
            }
        }

        output
    }

    fn render(&self, entry: &LogEntry, config: &LoggerConfig, colors: bool) -> String {
        if config.output_json {
            serde_json::to_string(entry).unwrap_or_default()
        } else if colors {
            self.format_console_output(entry, config)
        } else {
            let plain = LoggerConfig {
                show_colors: false,
                ..config.clone()
            };
            self.format_console_output(entry, &plain)
        }
    }

    fn create_log_entry(&self, record: &Record) -> LogEntry {
        let run_id = self.run_id.lock().ok().and_then(|id| *id);
        LogEntry::new(
            LogLevel::from_log_level(record.level()),
            record.args().to_string(),
            record.module_path().unwrap_or("unknown").to_string(),
            record.file().unwrap_or("unknown").to_string(),
            record.line().unwrap_or(0),
        )
        .with_run_id(run_id)
    }
}

impl Default for CoverLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl log::Log for CoverLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => metadata.level() <= config.min_level.to_level_filter(),
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = self.create_log_entry(record);

        if let Ok(config) = self.config.lock() {
            eprintln!("{}", self.render(&entry, &config, config.show_colors));

            if config.log_to_file {
                if let Ok(mut guard) = self.log_file.lock() {
                    if let Some(file) = guard.as_mut() {
                        let line = self.render(&entry, &config, false) + "\n";
                        let _ = file.write_all(line.as_bytes());
                    }
                }
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Logs how long a named stage took when it goes out of scope.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!(
            "⏱️  {} finished in {:.1}s",
            self.name,
            self.elapsed().as_secs_f64()
        );
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_startup_info(app_name: &str, version: &str) {
    log::info!("🚀 Starting {} v{}", app_name, version);
}

/// Log the effective settings. Secrets are never printed, only whether they are present.
pub fn log_config_info(config: &crate::config::Config) {
    log::info!("⚙️  Configuration loaded:");
    log::info!("   Provider: {}", config.provider);
    log::info!("   Output directory: {}", config.output_dir().display());
    log::info!(
        "   Pacing: {}ms text / {}ms image",
        config.text_delay().as_millis(),
        config.image_delay().as_millis()
    );
    match config.provider {
        crate::config::ProviderKind::OpenAi => {
            log::info!("   Endpoint: {}", config.openai.base_url());
            log::info!(
                "   Models: {} / {}",
                config.openai.text_model(),
                config.openai.image_model()
            );
            log::info!(
                "   API key: {}",
                if config.openai.api_key.is_some() { "✅" } else { "❌" }
            );
        }
        crate::config::ProviderKind::Bedrock => {
            log::info!("   Region: {}", config.bedrock.region());
            log::info!(
                "   Models: {} / {}",
                config.bedrock.text_model(),
                config.bedrock.image_model()
            );
            log::info!(
                "   Credentials: {}",
                if config.bedrock.has_credentials() { "✅" } else { "❌" }
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    #[test]
    fn test_log_levels() {
        assert_eq!(LogLevel::Info.as_str(), "INFO");
        assert_eq!(LogLevel::Error.emoji(), "❌");
        assert_eq!(LogLevel::Debug.color(), Color::Blue);
        assert_eq!("Warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_cli_config() {
        let config = LoggerConfig::for_cli(LogLevel::Debug, true, Some(" covers.log "));
        assert_eq!(config.min_level, LogLevel::Debug);
        assert!(config.output_json);
        assert!(!config.show_colors);
        assert!(config.show_file_location);
        assert!(config.log_to_file);
        assert_eq!(config.log_file_path, "covers.log");

        let quiet = LoggerConfig::for_cli(LogLevel::Warn, false, Some(""));
        assert!(!quiet.log_to_file);
        assert!(!quiet.output_json);
        assert!(!quiet.show_file_location);
    }

    #[test]
    fn test_plain_format_includes_run_tag() {
        let logger = CoverLogger::new();
        let run_id = Uuid::new_v4();
        let entry = LogEntry::new(
            LogLevel::Warn,
            "image 2 failed".into(),
            "rcover::pipeline".into(),
            "src/pipeline/images.rs".into(),
            42,
        )
        .with_run_id(Some(run_id));
        let config = LoggerConfig::new().with_colors(false);
        let line = logger.render(&entry, &config, false);

        assert!(line.contains("WARN"));
        assert!(line.contains("rcover::pipeline::image 2 failed"));
        assert!(line.contains(&format!("[run:{}]", &run_id.to_string()[..8])));
    }

    #[test]
    fn test_json_format() {
        let logger = CoverLogger::new();
        let entry = LogEntry::new(LogLevel::Info, "saved".into(), "m".into(), "f".into(), 1);
        let config = LoggerConfig::new().with_json_output(true);
        let value: serde_json::Value =
            serde_json::from_str(&logger.render(&entry, &config, false)).unwrap();
        assert_eq!(value["message"], "saved");
        assert_eq!(value["level"], "Info");
        assert!(value.get("run_id").is_none());
    }

    #[test]
    fn test_second_install_keeps_live_settings() {
        let debug = Metadata::builder().level(Level::Debug).target("rcover").build();

        let config = LoggerConfig::new().with_level(LogLevel::Debug);
        assert!(init_with_config(config).is_ok());
        assert!(log::logger().enabled(&debug));

        let quieter = LoggerConfig::new().with_level(LogLevel::Error);
        assert!(init_with_config(quieter).is_err());
        assert!(init().is_err());
        assert!(log::logger().enabled(&debug));
        assert_eq!(log::max_level(), LevelFilter::Debug);
    }
}
