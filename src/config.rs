//! Runtime configuration.
//!
//! Read once at startup from the process environment, after loading a
//! `.env` file from the working directory if one exists. The API key
//! falls back to the OS keyring entry `screen-capture` / `anthropic`.

use crate::analysis::{VisionAnalyzer, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::capture::{Appearance, CaptureSettings, MENU_BAR_OFFSET};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const KEYRING_SERVICE: &str = "screen-capture";
const KEYRING_USER: &str = "anthropic";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    /// How long a hide/show is given to reach the screen.
    pub hide_settle: Duration,
    pub flash: Duration,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
            min_width: 300,
            min_height: 200,
            hide_settle: Duration::from_millis(60),
            flash: Duration::from_millis(200),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct AnalysisSettings {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl fmt::Debug for AnalysisSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisSettings")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl AnalysisSettings {
    /// `None` when analysis is switched off.
    pub fn analyzer(&self) -> Option<VisionAnalyzer> {
        if !self.enabled {
            return None;
        }
        Some(
            VisionAnalyzer::new(self.api_key.clone())
                .with_model(self.model.clone())
                .with_endpoint(self.endpoint.clone()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppConfig {
    pub capture: CaptureSettings,
    pub window: WindowSettings,
    pub analysis: AnalysisSettings,
}

impl AppConfig {
    /// `.env` + environment + keyring.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => log::info!("[CONFIG] Loaded {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => log::warn!("[CONFIG] Ignoring unreadable .env: {}", e),
        }

        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;

        if config.analysis.enabled && config.analysis.api_key.is_none() {
            config.analysis.api_key = keyring_api_key();
        }
        if config.analysis.enabled && config.analysis.api_key.is_none() {
            log::warn!("[CONFIG] No ANTHROPIC_API_KEY, captures will not be analyzed");
        }

        log::debug!("[CONFIG] {:?}", config);
        Ok(config)
    }

    /// Builds a config from `lookup`, which maps a variable name to its
    /// value. Unset and blank variables take the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let opacity = match get("WINDOW_OPACITY") {
            Some(raw) => {
                let value: f64 = parse(&raw, "WINDOW_OPACITY")?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(invalid("WINDOW_OPACITY", raw, "must be between 0 and 1"));
                }
                value
            }
            None => defaults.capture.appearance.opacity,
        };

        let capture = CaptureSettings {
            output_dir: get("SCREENSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.capture.output_dir),
            menu_bar_offset: get("MENU_BAR_OFFSET")
                .map(|raw| parse(&raw, "MENU_BAR_OFFSET"))
                .transpose()?
                .unwrap_or(MENU_BAR_OFFSET),
            appearance: Appearance {
                opacity,
                always_on_top: get("WINDOW_ALWAYS_ON_TOP")
                    .map(|raw| parse_bool(&raw, "WINDOW_ALWAYS_ON_TOP"))
                    .transpose()?
                    .unwrap_or(defaults.capture.appearance.always_on_top),
            },
        };

        let millis = |key: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            Ok(get(key)
                .map(|raw| parse::<u64>(&raw, key))
                .transpose()?
                .map(Duration::from_millis)
                .unwrap_or(default))
        };

        let window = WindowSettings {
            hide_settle: millis("HIDE_SETTLE_MS", defaults.window.hide_settle)?,
            flash: millis("FLASH_MS", defaults.window.flash)?,
            ..defaults.window
        };

        let analysis = AnalysisSettings {
            enabled: get("ANALYSIS_ENABLED")
                .map(|raw| parse_bool(&raw, "ANALYSIS_ENABLED"))
                .transpose()?
                .unwrap_or(defaults.analysis.enabled),
            api_key: get("ANTHROPIC_API_KEY").map(|k| k.trim().to_string()),
            model: get("ANALYSIS_MODEL").unwrap_or(defaults.analysis.model),
            endpoint: get("ANALYSIS_ENDPOINT").unwrap_or(defaults.analysis.endpoint),
        };

        Ok(Self {
            capture,
            window,
            analysis,
        })
    }
}

fn keyring_api_key() -> Option<String> {
    match keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER) {
        Ok(entry) => api_key_from_entry(&entry),
        Err(e) => {
            log::warn!("[CONFIG] Keyring unavailable: {}", e);
            None
        }
    }
}

fn api_key_from_entry(entry: &keyring::Entry) -> Option<String> {
    match entry.get_password() {
        Ok(key) if !key.trim().is_empty() => {
            log::info!("[CONFIG] Using API key from keyring");
            Some(key.trim().to_string())
        }
        Ok(_) | Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            log::warn!("[CONFIG] Keyring lookup failed: {}", e);
            None
        }
    }
}

fn parse<T>(raw: &str, key: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, raw.to_string(), e.to_string()))
}

fn parse_bool(raw: &str, key: &'static str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw.to_string(), "expected true or false")),
    }
}

fn invalid(key: &'static str, value: String, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value,
        reason: reason.into(),
    }
}
