use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use worker_engine::FetchSettings;
use worker_logging::LogDestination;

pub const DEFAULT_CONFIG_PATH: &str = "worker.ron";

/// Worker settings as written in the RON config file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub fetch: FetchConfig,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Fetch limits; durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let defaults = FetchSettings::default();
        Self {
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            request_timeout_secs: defaults.request_timeout.as_secs(),
            redirect_limit: defaults.redirect_limit,
            max_bytes: defaults.max_bytes,
            user_agent: None,
        }
    }
}

impl FetchConfig {
    pub fn to_settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

impl WorkerConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = ron::from_str(content).context("invalid worker config")?;
        config.level_filter()?;
        Ok(config)
    }

    /// Loads `path` when given. Without a path, `worker.ron` in the working
    /// directory is used if present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse::<LevelFilter>()
            .with_context(|| format!("unknown log level `{}`", self.log_level))
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config_uses_defaults() {
        let config = WorkerConfig::parse("()").unwrap();
        assert_eq!(config, WorkerConfig::default());
        assert_eq!(config.fetch.to_settings(), FetchSettings::default());
        assert_eq!(config.log_destination(), LogDestination::Terminal);
    }

    #[test]
    fn partial_fetch_section_keeps_other_defaults() {
        let config = WorkerConfig::parse(
            r#"(
                fetch: (request_timeout_secs: 5, user_agent: Some("probe/1")),
                log_level: "debug",
                log_file: Some("worker.log"),
            )"#,
        )
        .unwrap();

        let settings = config.fetch.to_settings();
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
        assert_eq!(settings.redirect_limit, 5);
        assert_eq!(settings.user_agent, "probe/1");
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
        assert_eq!(
            config.log_destination(),
            LogDestination::Both(PathBuf::from("worker.log"))
        );
    }

    #[test]
    fn shipped_example_matches_defaults() {
        let config = WorkerConfig::parse(include_str!("../../../worker.example.ron")).unwrap();
        assert_eq!(config, WorkerConfig::default());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        assert!(WorkerConfig::parse(r#"(log_level: "chatty")"#).is_err());
    }

    #[test]
    fn malformed_config_is_rejected() {
        assert!(WorkerConfig::parse("(fetch: 3)").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let missing = Path::new("definitely/not/here/worker.ron");
        assert!(WorkerConfig::load(Some(missing)).is_err());
    }
}
