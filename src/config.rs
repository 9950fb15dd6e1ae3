//! Process-wide settings: debug mode and the variable discovery limit

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::Deserialize;
use thiserror::Error;

/// Default maximum number of names found by the discovery loop
pub const DEFAULT_DISCOVERY_LIMIT: usize = 256;

/// Environment variable enabling debug mode
pub const DEBUG_ENV: &str = "TEMPLATED_ERRORS_DEBUG";

/// Environment variable overriding the discovery limit
pub const DISCOVERY_LIMIT_ENV: &str = "TEMPLATED_ERRORS_DISCOVERY_LIMIT";

static DEBUG: AtomicBool = AtomicBool::new(false);
static DISCOVERY_LIMIT: AtomicUsize = AtomicUsize::new(DEFAULT_DISCOVERY_LIMIT);

/// Errors that can occur when loading settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse settings TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Settings for templated errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Let rendering failures surface from display instead of being absorbed
    pub debug: bool,
    /// Maximum number of names the discovery loop may find
    pub discovery_limit: usize,
}

/// TOML structure for deserializing settings
#[derive(Deserialize, Default)]
struct TomlSettings {
    templating: Option<TomlTemplating>,
}

#[derive(Deserialize, Default)]
struct TomlTemplating {
    debug: Option<bool>,
    discovery_limit: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            discovery_limit: DEFAULT_DISCOVERY_LIMIT,
        }
    }
}

impl Settings {
    /// Create settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the discovery limit
    pub fn with_discovery_limit(mut self, limit: usize) -> Self {
        self.discovery_limit = limit;
        self
    }

    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load settings from a TOML string with a `[templating]` table
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, SettingsError> {
        let parsed: TomlSettings = toml::from_str(content)?;
        let templating = parsed.templating.unwrap_or_default();
        let defaults = Self::default();

        Ok(Settings {
            debug: templating.debug.unwrap_or(defaults.debug),
            discovery_limit: templating
                .discovery_limit
                .unwrap_or(defaults.discovery_limit),
        })
    }

    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset or unparsable values keep defaults
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(value) = lookup(DEBUG_ENV) {
            settings.debug = matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(limit) = lookup(DISCOVERY_LIMIT_ENV).and_then(|v| v.trim().parse().ok()) {
            settings.discovery_limit = limit;
        }
        settings
    }

    /// Install these settings process-wide
    pub fn apply(&self) {
        tracing::debug!(
            debug = self.debug,
            discovery_limit = self.discovery_limit,
            "applying templating settings"
        );
        set_debug(self.debug);
        DISCOVERY_LIMIT.store(self.discovery_limit, Ordering::Relaxed);
    }

    /// The settings currently in effect
    pub fn current() -> Self {
        Self {
            debug: debug_enabled(),
            discovery_limit: discovery_limit(),
        }
    }
}

/// Turn debug mode on or off
pub fn set_debug(debug: bool) {
    DEBUG.store(debug, Ordering::Relaxed);
}

pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

pub fn discovery_limit() -> usize {
    DISCOVERY_LIMIT.load(Ordering::Relaxed)
}
