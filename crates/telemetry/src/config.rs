//! Logging configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_FILTER: &str = "info";

/// Console output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive for the console layer.
    pub filter: String,
    pub format: LogFormat,
    /// Append-only file receiving INFO and above, without ANSI colours.
    pub request_log: Option<PathBuf>,
    pub test_mode: bool,
    /// `TEST_LOG` was set.
    pub test_log: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Pretty,
            request_log: None,
            test_mode: false,
            test_log: false,
        }
    }
}

impl TelemetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `RUST_LOG`, `LOG_FORMAT`, `IGAPI_REQUEST_LOG`, `TEST_LOG`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(filter) = get("RUST_LOG") {
            config.filter = filter;
        }
        if let Some(format) = get("LOG_FORMAT").and_then(|f| f.parse().ok()) {
            config.format = format;
        }
        config.request_log = get("IGAPI_REQUEST_LOG").map(PathBuf::from);
        config.test_log = get("TEST_LOG").is_some();
        config
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_request_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.request_log = Some(path.into());
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Tests stay quiet unless `TEST_LOG` is set.
    pub fn should_suppress_logs(&self) -> bool {
        self.test_mode && !self.test_log
    }
}
