//! Portal session configuration, loaded from TOML.
//!
//! ```toml
//! api_url = "https://portal.example.edu/api"
//! login_route = "/login"
//!
//! [guard]
//! timeout_ms = 240000
//! activity_events = ["mousemove", "keydown", "scroll", "mousedown", "touchstart", "click"]
//!
//! [notices]
//! inactivity = "Logged out due to inactivity"
//! manual = "Logged out successfully"
//! ```

use crate::{
    activity::ActivityKind,
    logout::{INACTIVITY_NOTICE, MANUAL_NOTICE},
    navigation::LOGIN_ROUTE,
};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use thiserror::Error;

pub const DEFAULT_TIMEOUT_MS: u64 = 240_000;
pub const DEFAULT_MAILBOX_CAPACITY: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortalConfig {
    pub api_url: String,
    #[serde(default = "default_login_route")]
    pub login_route: String,
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub notices: NoticeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuardConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_activity_events")]
    pub activity_events: Vec<ActivityKind>,
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
}

impl GuardConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            activity_events: default_activity_events(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoticeConfig {
    #[serde(default = "default_inactivity_notice")]
    pub inactivity: String,
    #[serde(default = "default_manual_notice")]
    pub manual: String,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            inactivity: default_inactivity_notice(),
            manual: default_manual_notice(),
        }
    }
}

fn default_login_route() -> String {
    LOGIN_ROUTE.to_string()
}

const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_activity_events() -> Vec<ActivityKind> {
    ActivityKind::ALL.to_vec()
}

const fn default_mailbox_capacity() -> usize {
    DEFAULT_MAILBOX_CAPACITY
}

fn default_inactivity_notice() -> String {
    INACTIVITY_NOTICE.to_string()
}

fn default_manual_notice() -> String {
    MANUAL_NOTICE.to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl PortalConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            login_route: default_login_route(),
            guard: GuardConfig::default(),
            notices: NoticeConfig::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses and validates.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Validation("api_url must not be empty".to_string()));
        }
        if !self.login_route.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "login_route must be an absolute path, got {:?}",
                self.login_route
            )));
        }
        if self.guard.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "guard.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.guard.mailbox_capacity == 0 {
            return Err(ConfigError::Validation(
                "guard.mailbox_capacity must be greater than zero".to_string(),
            ));
        }
        if self.guard.activity_events.is_empty() {
            return Err(ConfigError::Validation(
                "guard.activity_events must list at least one event".to_string(),
            ));
        }
        Ok(())
    }
}
