//! Structured logging setup.
//!
//! `RUST_LOG` wins over the configured level. Output goes to stderr so the
//! generated module can be piped without log noise.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSettings;

/// Configuration for structured logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Whether to use JSON format (true) or text format (false)
    pub json_format: bool,
    /// The default log level if RUST_LOG is not set
    pub default_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            default_level: Level::INFO,
        }
    }
}

impl LoggingConfig {
    pub fn json() -> Self {
        Self {
            json_format: true,
            ..Default::default()
        }
    }

    pub fn text() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }
}

impl From<&LoggingSettings> for LoggingConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            json_format: settings.json,
            default_level: parse_log_level(&settings.level),
        }
    }
}

/// Maps a configured level name to a `Level`, defaulting to INFO.
pub fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize the global subscriber. Later calls have no effect.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_level.to_string()));

    if config.json_format {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(false)
                .with_line_number(false),
        );
        let _ = tracing::subscriber::set_global_default(subscriber);
    } else {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        );
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// JSON subscriber writing to `writer`, for capturing log output in tests.
pub fn create_json_layer<W>(writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'writer> fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(EnvFilter::new("trace"))
        .with(fmt::layer().json().with_writer(writer).with_target(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct CaptureWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl CaptureWriter {
        fn new() -> Self {
            Self {
                buffer: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn output(&self) -> String {
            String::from_utf8_lossy(&self.buffer.lock().unwrap()).to_string()
        }
    }

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> fmt::MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("trace"), Level::TRACE);
        assert_eq!(parse_log_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_log_level("Info"), Level::INFO);
        assert_eq!(parse_log_level("WARN"), Level::WARN);
        assert_eq!(parse_log_level("error"), Level::ERROR);
        assert_eq!(parse_log_level("unknown"), Level::INFO);
    }

    #[test]
    fn test_logging_config_from_settings() {
        let settings = LoggingSettings {
            level: "debug".to_string(),
            json: true,
        };
        assert_eq!(
            LoggingConfig::from(&settings),
            LoggingConfig::json().with_level(Level::DEBUG)
        );
        assert!(!LoggingConfig::text().json_format);
    }

    #[test]
    fn test_generation_logs_are_json_formatted() {
        let writer = CaptureWriter::new();
        let subscriber = create_json_layer(writer.clone());

        tracing::subscriber::with_default(subscriber, || {
            let model = rsfga_typegen::parse_dsl("type user").unwrap();
            rsfga_typegen::generate(&model).unwrap();
        });

        let output = writer.output();
        assert!(!output.is_empty(), "Should have captured log output");
        for line in output.lines().filter(|l| !l.is_empty()) {
            let json: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(json.get("level").is_some());
            assert!(json.get("target").is_some());
        }
        assert!(output.contains("Generated TypeScript module"));
    }
}
