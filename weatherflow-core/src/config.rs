use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::Coordinates;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const BACKEND_URL_ENV: &str = "WEATHERFLOW_BACKEND_URL";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How the live dashboard finds its starting position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeolocationMode {
    /// Ask an IP geolocation service.
    #[default]
    Ip,
    /// Use the `home` coordinates from the config file.
    Home,
    /// No capability: always start at the fallback coordinate.
    Off,
}

impl GeolocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeolocationMode::Ip => "ip",
            GeolocationMode::Home => "home",
            GeolocationMode::Off => "off",
        }
    }
}

impl std::fmt::Display for GeolocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for GeolocationMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "ip" => Ok(GeolocationMode::Ip),
            "home" => Ok(GeolocationMode::Home),
            "off" => Ok(GeolocationMode::Off),
            _ => Err(anyhow!(
                "Unknown geolocation mode '{value}'. Supported modes: ip, home, off."
            )),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// backend_url = "http://localhost:8000"
/// timeout_secs = 10
/// geolocation = "home"
///
/// [home]
/// lat = 51.5072
/// lon = -0.1276
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    pub backend_url: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub geolocation: GeolocationMode,
    pub home: Option<Coordinates>,
}

impl Config {
    /// Backend base URL without a trailing slash.
    pub fn backend_url(&self) -> String {
        self.backend_url
            .as_deref()
            .map(|s| s.trim().trim_end_matches('/'))
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BACKEND_URL)
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Validate and store a backend URL.
    pub fn set_backend_url(&mut self, url: &str) -> Result<()> {
        let parsed = Url::parse(url.trim())
            .with_context(|| format!("Invalid backend URL: {url}"))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Backend URL must use http or https, got '{}'",
                parsed.scheme()
            ));
        }

        self.backend_url = Some(url.trim().trim_end_matches('/').to_string());
        Ok(())
    }

    pub fn set_home(&mut self, home: Coordinates) {
        self.home = Some(home);
        self.geolocation = GeolocationMode::Home;
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|s| !s.trim().is_empty()) {
            self.backend_url = Some(url);
        }
        self
    }

    /// Load the config file and apply process environment overrides.
    pub fn resolve() -> Result<Self> {
        Ok(Self::load()?.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherflow", "weatherflow")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
