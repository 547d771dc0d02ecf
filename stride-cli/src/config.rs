use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use stride_core::{ScanPolicy, SortConfig};

use crate::state::ensure_stride_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralSection,
    pub view: ViewSection,
    pub recurrence: RecurrenceSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSection {
    /// IANA zone due dates are written in (e.g. "America/Chicago").
    pub timezone: String,
}

/// Default sort for `stride list`, as UI labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSection {
    pub primary: String,
    pub primary_ascending: bool,
    pub secondary: Option<String>,
    pub secondary_ascending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceSection {
    pub scan_interval_minutes: u64,
    pub throttle_hours: i64,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for ViewSection {
    fn default() -> Self {
        Self {
            primary: "createdAt".to_string(),
            primary_ascending: false,
            secondary: None,
            secondary_ascending: true,
        }
    }
}

impl Default for RecurrenceSection {
    fn default() -> Self {
        Self {
            scan_interval_minutes: 60,
            throttle_hours: 24,
        }
    }
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        self.general
            .timezone
            .parse()
            .map_err(|_| anyhow!("invalid timezone: {}", self.general.timezone))
    }

    pub fn sort(&self) -> SortConfig {
        SortConfig::from_labels(
            &self.view.primary,
            self.view.primary_ascending,
            self.view.secondary.as_deref(),
            self.view.secondary_ascending,
        )
    }

    pub fn scan_policy(&self) -> ScanPolicy {
        ScanPolicy {
            throttle: chrono::Duration::hours(self.recurrence.throttle_hours.max(0)),
        }
    }

    pub fn scan_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.recurrence.scan_interval_minutes.max(1) * 60)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_stride_home()?.join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    save_config(path, &Config::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}
