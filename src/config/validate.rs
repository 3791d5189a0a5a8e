// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WorkflowError};
use crate::logging::parse_level_str;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = WorkflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.engine, raw.logging, raw.demo))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_engine(cfg)?;
    validate_logging(cfg)?;
    validate_demo(cfg)?;
    Ok(())
}

fn validate_engine(cfg: &RawConfigFile) -> Result<()> {
    if cfg.engine.max_concurrency == Some(0) {
        return Err(WorkflowError::ConfigError(
            "[engine].max_concurrency must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(cfg: &RawConfigFile) -> Result<()> {
    if let Some(level) = &cfg.logging.level {
        if parse_level_str(level).is_none() {
            return Err(WorkflowError::ConfigError(format!(
                "[logging].level '{level}' is not one of error, warn, info, debug, trace"
            )));
        }
    }
    Ok(())
}

fn validate_demo(cfg: &RawConfigFile) -> Result<()> {
    if let (Some(cancel), Some(fail)) = (&cfg.demo.cancel_after, &cfg.demo.fail) {
        if cancel == fail {
            return Err(WorkflowError::ConfigError(format!(
                "[demo] task '{cancel}' cannot be both `cancel_after` and `fail`"
            )));
        }
    }
    Ok(())
}
