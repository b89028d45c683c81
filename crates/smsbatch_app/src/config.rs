//! RON configuration file.
//!
//! ```ron
//! (
//!     api: (
//!         base_url: "https://sms.example.com",
//!         auth_token: Some("..."),
//!         request_timeout_secs: 20,
//!     ),
//!     state_file: Some("smsbatch_state.ron"),
//!     log: (level: "debug", destination: Both("smsbatch.log")),
//! )
//! ```
//!
//! Every field is optional.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use batch_logging::LogDestination;
use serde::Deserialize;
use smsbatch_engine::ApiSettings;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "smsbatch.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    /// Progress snapshot location; `None` disables persistence.
    pub state_file: Option<PathBuf>,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            state_file: Some(PathBuf::from("smsbatch_state.ron")),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub send_path: String,
    pub template_path: String,
    pub auth_token: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let defaults = ApiSettings::default();
        Self {
            base_url: defaults.base_url,
            send_path: defaults.send_path,
            template_path: defaults.template_path,
            auth_token: defaults.auth_token,
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            request_timeout_secs: defaults.request_timeout.as_secs(),
        }
    }
}

impl ApiConfig {
    pub fn to_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.base_url.clone(),
            send_path: self.send_path.clone(),
            template_path: self.template_path.clone(),
            auth_token: self.auth_token.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub destination: LogTarget,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            destination: LogTarget::Terminal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum LogTarget {
    Terminal,
    File(PathBuf),
    Both(PathBuf),
}

impl LogTarget {
    pub fn to_destination(&self) -> LogDestination {
        match self {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File(path) => LogDestination::File(path.clone()),
            LogTarget::Both(path) => LogDestination::Both(path.clone()),
        }
    }
}

/// Loads `explicit` if given (it must exist), else `smsbatch.ron` in the
/// working directory if present, else defaults.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match explicit {
        Some(path) => read(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                read(path)
            } else {
                Ok(AppConfig::default())
            }
        }
    }
}

fn read(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse(text: &str) -> Result<AppConfig, ron::error::SpannedError> {
    ron::from_str(text)
}
