// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "RICKDEX_LOG";

/// Installs the global subscriber. The terminal belongs to the TUI, so
/// events are appended to a file instead of stderr.
pub fn init(config: &Config) -> Result<PathBuf> {
    let path = config.log_file()?;
    let env_value = env::var(LOG_ENV).ok();
    let directives = filter_directives(env_value.as_deref(), config.log_level());
    let filter = EnvFilter::try_new(directives).with_context(|| {
        format!("invalid log filter {directives:?}; set {LOG_ENV} or [log].level to a filter such as info or rickdex_api=debug")
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}; set [log].file", path.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .context("install tracing subscriber")?;
    Ok(path)
}

fn filter_directives<'a>(env_value: Option<&'a str>, config_level: &'a str) -> &'a str {
    env_value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(config_level)
}

#[cfg(test)]
mod tests {
    use super::filter_directives;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn env_filter_overrides_config_level() {
        assert_eq!(filter_directives(Some("debug"), "info"), "debug");
        assert_eq!(filter_directives(Some("  "), "warn"), "warn");
        assert_eq!(filter_directives(None, "info"), "info");
    }

    #[test]
    fn crate_scoped_directives_parse() {
        assert!(EnvFilter::try_new("info,rickdex_api=debug").is_ok());
        assert!(EnvFilter::try_new("rickdex_api=loud").is_err());
    }
}
