use crate::error::AppError;
use crate::storage::json_store;
use crate::view::{SortKey, StatusFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "OHH_CONFIG_PATH";

pub const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        paint(self.accent, self.reset, text)
    }

    pub fn mutedize(&self, text: &str) -> String {
        paint(self.muted, self.reset, text)
    }
}

fn paint(color: &str, reset: &str, text: &str) -> String {
    if color.is_empty() {
        text.to_string()
    } else {
        format!("{color}{text}{reset}")
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.and_then(canonical_theme_name).as_deref() {
        Some("noir") => Palette {
            accent: "\x1b[38;5;208m",
            muted: "\x1b[38;5;250m",
            reset: "\x1b[0m",
        },
        Some("purple") => Palette {
            accent: "\x1b[38;5;141m",
            muted: "\x1b[38;5;103m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            accent: "",
            muted: "",
            reset: "",
        },
    }
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    match trimmed {
        "" | "plain" | "light" => Some("default".to_string()),
        "dark" | "dark_mode" | "darkmode" => Some("noir".to_string()),
        "violet" | "gradient" => Some("purple".to_string()),
        other => Some(other.to_string()),
    }
}

fn default_interval() -> u64 {
    DEFAULT_REMINDER_INTERVAL_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default = "default_interval")]
    pub reminder_interval_secs: u64,
    #[serde(default)]
    pub default_sort: Option<String>,
    #[serde(default)]
    pub default_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: None,
            reminder_interval_secs: DEFAULT_REMINDER_INTERVAL_SECS,
            default_sort: None,
            default_filter: None,
        }
    }
}

impl Config {
    pub fn sort_key(&self) -> SortKey {
        self.default_sort
            .as_deref()
            .map(SortKey::parse_lenient)
            .unwrap_or_default()
    }

    pub fn status_filter(&self) -> StatusFilter {
        self.default_filter
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub reminder_interval_secs: Option<u64>,
    pub default_sort: Option<String>,
    pub default_filter: Option<String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(json_store::app_dir()?.join(CONFIG_FILE_NAME))
}

pub fn load_config() -> Result<Config, AppError> {
    let path = config_path()?;
    load_config_from_path(&path)
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    validate_config(normalize_config_theme(config), path)
}

fn validate_config(config: Config, path: &Path) -> Result<Config, AppError> {
    if config.reminder_interval_secs == 0 {
        return Err(AppError::invalid_data(format!(
            "{}: reminder_interval_secs must be positive",
            path.display()
        )));
    }
    Ok(config)
}

fn normalize_config_theme(mut config: Config) -> Config {
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    config
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(normalized) = overrides
        .theme
        .as_deref()
        .and_then(canonical_theme_name)
    {
        merged.theme = Some(normalized);
    }
    if let Some(interval) = overrides.reminder_interval_secs {
        merged.reminder_interval_secs = interval;
    }
    if let Some(sort) = overrides.default_sort.as_ref() {
        merged.default_sort = Some(sort.clone());
    }
    if let Some(filter) = overrides.default_filter.as_ref() {
        merged.default_filter = Some(filter.clone());
    }

    merged
}
