//! Configuration for Wakabeat
//!
//! Settings are loaded from `~/.config/wakabeat/config.json` (JSON with
//! serde defaults for every field) and can be overridden per-field with
//! `WAKABEAT_*` environment variables. A missing config file is not an
//! error: the service starts with defaults and skips flushes until an API
//! token shows up, since in editor-plugin hosts the settings panel is often
//! filled in after the first few timer ticks.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WakabeatError};
use crate::heartbeat::HeartbeatSchema;

/// Default heartbeat endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://waka.hackclub.com/api";

/// Flush interval bounds in seconds.
pub const MIN_INTERVAL_SECS: u64 = 10;
pub const MAX_INTERVAL_SECS: u64 = 240;

const DEFAULT_INTERVAL_SECS: u64 = 30;

/// Wakabeat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bearer token for the heartbeat API. Surrounding whitespace is trimmed
    /// before use. Empty means "not configured yet": flushes are skipped.
    pub api_token: String,

    /// Base API endpoint URL. Empty falls back to [`DEFAULT_ENDPOINT`].
    /// A single trailing slash is tolerated and stripped.
    pub endpoint: String,

    /// Flush interval in seconds, clamped to [10, 240].
    pub interval_secs: u64,

    /// Project name reported in each heartbeat.
    pub project: String,

    /// Machine/host name reported in each heartbeat. Empty falls back to
    /// the `HOSTNAME` environment variable, then `"unknown"`.
    pub machine: String,

    /// Operating system name reported in each heartbeat. Empty falls back
    /// to the compile-time platform name.
    pub operating_system: String,

    /// Which heartbeat JSON schema to emit.
    pub schema: HeartbeatSchema,

    /// Language tag reported in each heartbeat. The upstream plugins report
    /// a constant editor-wide tag rather than a per-file language.
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            endpoint: String::new(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            project: "unnamed".to_string(),
            machine: String::new(),
            operating_system: String::new(),
            schema: HeartbeatSchema::default(),
            language: "UnrealEngine".to_string(),
        }
    }
}

impl Config {
    /// Path to the config file (`~/.config/wakabeat/config.json`).
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wakabeat")
            .join("config.json")
    }

    /// Load configuration from the default path, then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from(&Self::path())
    }

    /// Load configuration from `path`, apply environment overrides, and
    /// clamp the interval.
    ///
    /// A missing file yields defaults; an unreadable or malformed file is
    /// an error (silently dropping a user's settings would be worse than
    /// failing loudly at startup).
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| WakabeatError::Config(format!("invalid {}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                return Err(WakabeatError::Config(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        config.apply_env_overrides();
        config.interval_secs = config
            .interval_secs
            .clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS);
        Ok(config)
    }

    /// Apply `WAKABEAT_*` environment variable overrides in place.
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("WAKABEAT_API_TOKEN") {
            self.api_token = token;
        }
        if let Ok(endpoint) = std::env::var("WAKABEAT_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Ok(interval) = std::env::var("WAKABEAT_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse() {
                self.interval_secs = secs;
            }
        }
        if let Ok(project) = std::env::var("WAKABEAT_PROJECT") {
            self.project = project;
        }
    }

    /// Bearer token with surrounding whitespace trimmed.
    pub fn trimmed_token(&self) -> &str {
        self.api_token.trim()
    }

    /// Machine name with fallbacks applied: configured value, then the
    /// `HOSTNAME`/`COMPUTERNAME` environment variables, then
    /// `/etc/hostname` (the env var is usually unset for non-interactive
    /// processes on Linux), then `"unknown"`.
    pub fn machine_name(&self) -> String {
        if !self.machine.is_empty() {
            return self.machine.clone();
        }
        for var in ["HOSTNAME", "COMPUTERNAME"] {
            if let Ok(name) = std::env::var(var) {
                if !name.trim().is_empty() {
                    return name.trim().to_string();
                }
            }
        }
        if let Ok(contents) = std::fs::read_to_string("/etc/hostname") {
            let name = contents.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
        "unknown".to_string()
    }

    /// Operating system name with the compile-time fallback applied.
    pub fn os_name(&self) -> String {
        if !self.operating_system.is_empty() {
            return self.operating_system.clone();
        }
        match std::env::consts::OS {
            "macos" => "Mac".to_string(),
            "windows" => "Windows".to_string(),
            "linux" => "Linux".to_string(),
            "ios" => "iOS".to_string(),
            "android" => "Android".to_string(),
            other if !other.is_empty() => other.to_string(),
            _ => "Unknown".to_string(),
        }
    }
}
