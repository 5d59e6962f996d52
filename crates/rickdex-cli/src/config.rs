// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rickdex_tui::UiOptions;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "rickdex";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_API_TIMEOUT: &str = "10s";
const DEFAULT_SEARCH_DEBOUNCE: &str = "500ms";
const DEFAULT_PAGE_ROWS: i64 = 10;
const DEFAULT_LOG_LEVEL: &str = "info";
const MAX_API_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const MAX_SEARCH_DEBOUNCE: Duration = Duration::from_secs(10);
const CONFIG_PATH_ENV: &str = "RICKDEX_CONFIG_PATH";
const API_URL_ENV: &str = "RICKDEX_API_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Some(DEFAULT_API_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub search_debounce: Option<String>,
    pub page_rows: Option<i64>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            search_debounce: Some(DEFAULT_SEARCH_DEBOUNCE.to_owned()),
            page_rows: Some(DEFAULT_PAGE_ROWS),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub file: Option<String>,
    pub level: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [api], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(url) = &self.api.url
            && url.trim().is_empty()
        {
            bail!(
                "api.url in {} must not be empty; remove it to use the public endpoint",
                path.display()
            );
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)
                .with_context(|| format!("api.timeout in {} is invalid", path.display()))?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
            if parsed > MAX_API_TIMEOUT {
                bail!(
                    "api.timeout in {} must be at most 5m, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(debounce) = &self.ui.search_debounce {
            let parsed = parse_duration(debounce).with_context(|| {
                format!("ui.search_debounce in {} is invalid", path.display())
            })?;
            if parsed > MAX_SEARCH_DEBOUNCE {
                bail!(
                    "ui.search_debounce in {} must be at most 10s, got {}; try 500ms",
                    path.display(),
                    debounce
                );
            }
        }

        if let Some(rows) = self.ui.page_rows
            && rows <= 0
        {
            bail!(
                "ui.page_rows in {} must be positive, got {}",
                path.display(),
                rows
            );
        }

        if let Some(level) = &self.log.level
            && level.trim().is_empty()
        {
            bail!(
                "log.level in {} must not be empty; use a filter such as \"info\"",
                path.display()
            );
        }

        Ok(())
    }

    /// `[api].url`, then `RICKDEX_API_URL`, then the public endpoint.
    pub fn api_url(&self) -> String {
        if let Some(url) = &self.api.url {
            return url.trim().to_owned();
        }
        match env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url.trim().to_owned(),
            _ => rickdex_api::DEFAULT_API_URL.to_owned(),
        }
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_API_TIMEOUT))
    }

    pub fn search_debounce(&self) -> Result<Duration> {
        parse_duration(
            self.ui
                .search_debounce
                .as_deref()
                .unwrap_or(DEFAULT_SEARCH_DEBOUNCE),
        )
    }

    pub fn page_rows(&self) -> usize {
        let rows = self.ui.page_rows.unwrap_or(DEFAULT_PAGE_ROWS).max(1);
        usize::try_from(rows).unwrap_or(1)
    }

    pub fn ui_options(&self) -> Result<UiOptions> {
        Ok(UiOptions {
            search_debounce: self.search_debounce()?,
            page_rows: self.page_rows(),
        })
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let cache_root = dirs::cache_dir().ok_or_else(|| {
            anyhow!("cannot resolve cache directory; set [log].file to a writable path")
        })?;
        Ok(cache_root.join(APP_NAME).join("rickdex.log"))
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# rickdex config\n# Place this file at: {}\n\nversion = 1\n\n[api]\n# Optional. Defaults to RICKDEX_API_URL, then the public endpoint\n# url = \"{}\"\ntimeout = \"{}\"\n\n[ui]\nsearch_debounce = \"{}\"\npage_rows = {}\n\n[log]\n# Optional. Default is the platform cache dir (for example ~/.cache/rickdex/rickdex.log)\n# file = \"/absolute/path/to/rickdex.log\"\nlevel = \"{}\"\n",
            path.display(),
            rickdex_api::DEFAULT_API_URL,
            DEFAULT_API_TIMEOUT,
            DEFAULT_SEARCH_DEBOUNCE,
            DEFAULT_PAGE_ROWS,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
