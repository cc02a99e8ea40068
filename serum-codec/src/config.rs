//! Display configuration for [`Formatter`](crate::formatter::Formatter).
//!
//! The codec itself takes no configuration. These settings only shape how
//! decoded instructions and queues are rendered.

use std::{env, str::FromStr};

pub const ENV_VERBOSITY: &str = "SERUM_CODEC_VERBOSITY";
pub const ENV_LOG_EVENTS: &str = "SERUM_CODEC_LOG_EVENTS";
pub const ENV_MAX_QUEUE_ROWS: &str = "SERUM_CODEC_MAX_QUEUE_ROWS";

const DEFAULT_MAX_QUEUE_ROWS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogVerbosity {
    /// Instruction name and program only.
    Brief,
    /// Adds decoded fields and account roles.
    #[default]
    Standard,
    /// Adds raw data and every queue node column.
    Detailed,
}

impl FromStr for LogVerbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brief" => Ok(LogVerbosity::Brief),
            "standard" => Ok(LogVerbosity::Standard),
            "detailed" => Ok(LogVerbosity::Detailed),
            other => Err(format!("unknown verbosity `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    pub verbosity: LogVerbosity,
    /// Print every formatted item, not just failures.
    pub log_events: bool,
    /// Queue nodes rendered before the table is cut off.
    pub max_queue_rows: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            verbosity: LogVerbosity::default(),
            log_events: false,
            max_queue_rows: DEFAULT_MAX_QUEUE_ROWS,
        }
    }
}

impl CodecConfig {
    /// Detailed output with event logging on.
    pub fn debug() -> Self {
        Self {
            verbosity: LogVerbosity::Detailed,
            log_events: true,
            ..Self::default()
        }
    }

    /// Read `SERUM_CODEC_*` variables; unset or unparseable values keep defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let verbosity = lookup(ENV_VERBOSITY)
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.verbosity);
        let log_events = lookup(ENV_LOG_EVENTS)
            .map(|value| matches!(value.trim(), "1" | "true"))
            .unwrap_or(defaults.log_events);
        let max_queue_rows = lookup(ENV_MAX_QUEUE_ROWS)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(defaults.max_queue_rows);
        Self {
            verbosity,
            log_events,
            max_queue_rows,
        }
    }

    pub fn with_verbosity(mut self, verbosity: LogVerbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_max_queue_rows(mut self, rows: usize) -> Self {
        self.max_queue_rows = rows;
        self
    }
}
