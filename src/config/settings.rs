// src/config/settings.rs
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "STATISTICA";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_EXPORT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_SOURCE_BASE_URL: &str = "http://localhost:8000/static/code";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub export_base_url: String,
    pub source_base_url: String,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            export_base_url: DEFAULT_EXPORT_BASE_URL.to_string(),
            source_base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    /// `<config dir>/statistica/settings.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("statistica").join("settings.toml"))
    }

    /// Defaults, then the user's settings file, then `STATISTICA_*` variables.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path().as_deref(), ENV_PREFIX)
    }

    pub fn load_from(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("export_base_url", DEFAULT_EXPORT_BASE_URL)?
            .set_default("source_base_url", DEFAULT_SOURCE_BASE_URL)?
            .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix(env_prefix))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        Ok(settings.normalized())
    }

    fn normalized(mut self) -> Self {
        for url in [&mut self.api_base_url, &mut self.export_base_url, &mut self.source_base_url] {
            let trimmed = url.trim().trim_end_matches('/').to_string();
            *url = trimmed;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(Some(&dir.path().join("absent.toml")), "STATISTICA_TEST_DEFAULTS").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn file_overrides_defaults_and_urls_are_trimmed() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "api_base_url = \"https://stats.example.org/\"").unwrap();
        writeln!(file, "request_timeout_secs = 30").unwrap();

        let settings = Settings::load_from(Some(file.path()), "STATISTICA_TEST_FILE").unwrap();
        assert_eq!(settings.api_base_url, "https://stats.example.org");
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.export_base_url, DEFAULT_EXPORT_BASE_URL);
    }

    #[test]
    fn environment_wins_over_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "export_base_url = \"http://from-file:3000\"").unwrap();
        std::env::set_var("STATISTICA_TEST_ENV_EXPORT_BASE_URL", "http://from-env:3000//");

        let settings = Settings::load_from(Some(file.path()), "STATISTICA_TEST_ENV").unwrap();
        assert_eq!(settings.export_base_url, "http://from-env:3000");

        std::env::remove_var("STATISTICA_TEST_ENV_EXPORT_BASE_URL");
    }
}
