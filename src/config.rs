use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Result, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::summarize::Provider;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://localhost:5173,https://summtube.vercel.app";

/// Service configuration, read once at startup.
///
/// Every field is optional in the file; accessors apply defaults.
#[derive(Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub allowed_origins: Option<Vec<String>>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub llm_timeout_secs: Option<u64>,
    pub caption_timeout_secs: Option<u64>,
    pub extractor_timeout_secs: Option<u64>,
    pub yt_dlp: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("allowed_origins", &self.allowed_origins)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("caption_timeout_secs", &self.caption_timeout_secs)
            .field("extractor_timeout_secs", &self.extractor_timeout_secs)
            .field("yt_dlp", &self.yt_dlp)
            .field("log_file", &self.log_file)
            .finish()
    }
}

impl Config {
    /// Load the per-user config file, if the platform has a config dir
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Config =
                toml::from_str(&content).wrap_err_with(|| format!("invalid config file {}", path.display()))?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    /// Overlay values that were given explicitly (flags or environment)
    pub fn merge(mut self, other: Config) -> Self {
        self.api_key = other.api_key.or(self.api_key);
        self.model = other.model.or(self.model);
        self.allowed_origins = other.allowed_origins.or(self.allowed_origins);
        self.host = other.host.or(self.host);
        self.port = other.port.or(self.port);
        self.llm_timeout_secs = other.llm_timeout_secs.or(self.llm_timeout_secs);
        self.caption_timeout_secs = other.caption_timeout_secs.or(self.caption_timeout_secs);
        self.extractor_timeout_secs = other.extractor_timeout_secs.or(self.extractor_timeout_secs);
        self.yt_dlp = other.yt_dlp.or(self.yt_dlp);
        self.log_file = other.log_file.or(self.log_file);
        self
    }

    /// Fill a missing credential from the provider's own env var
    pub fn with_provider_key_fallback(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            self.api_key = lookup(Provider::for_model(self.model()).key_env_var()).filter(|k| !k.trim().is_empty());
        }
        self
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().filter(|m| !m.is_empty()).unwrap_or(DEFAULT_MODEL)
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        match &self.allowed_origins {
            Some(origins) => origins.clone(),
            None => parse_origins(DEFAULT_ORIGINS),
        }
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs.unwrap_or(60))
    }

    pub fn caption_timeout(&self) -> Duration {
        Duration::from_secs(self.caption_timeout_secs.unwrap_or(10))
    }

    /// Upper bound on one extractor run
    pub fn extractor_timeout(&self) -> Duration {
        Duration::from_secs(self.extractor_timeout_secs.unwrap_or(45))
    }

    pub fn yt_dlp(&self) -> &str {
        self.yt_dlp.as_deref().unwrap_or("yt-dlp")
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

/// `<config dir>/summtube/config.toml`, or `None` without a home directory
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
}
