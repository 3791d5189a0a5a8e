// src/config/model.rs

use serde::Deserialize;

use crate::engine::EngineOptions;
use crate::logging::parse_level_str;

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [engine]
/// max_concurrency = 4
///
/// [logging]
/// level = "debug"
///
/// [demo]
/// task_delay_ms = 20
/// cancel_after = "trousers"
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default)]
    pub demo: DemoSection,
}

/// `[engine]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineSection {
    /// Cap on task bodies running at once. Absent means unbounded.
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSection {
    /// One of "error", "warn", "info", "debug", "trace".
    #[serde(default)]
    pub level: Option<String>,
}

/// `[demo]` section, read only by the `dagflow` binary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemoSection {
    /// Artificial duration of every demo task, in milliseconds.
    #[serde(default)]
    pub task_delay_ms: u64,

    /// Cancel the run once this task has finished.
    #[serde(default)]
    pub cancel_after: Option<String>,

    /// Make this task fail.
    #[serde(default)]
    pub fail: Option<String>,
}

/// Validated configuration.
///
/// Obtain one through `ConfigFile::try_from(raw)` or
/// [`load_and_validate`](crate::config::load_and_validate).
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub engine: EngineSection,
    pub logging: LoggingSection,
    pub demo: DemoSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        engine: EngineSection,
        logging: LoggingSection,
        demo: DemoSection,
    ) -> Self {
        Self {
            engine,
            logging,
            demo,
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            max_concurrency: self.engine.max_concurrency,
        }
    }

    /// Log level from `[logging].level`, if set.
    pub fn log_level(&self) -> Option<tracing::Level> {
        self.logging.level.as_deref().and_then(parse_level_str)
    }
}
