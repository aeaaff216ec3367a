use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use driftnet_core::parse_blocklist;
use serde::Deserialize;
use thiserror::Error;

use crate::feeder::FeederSettings;
use crate::fetch::RenderSettings;
use crate::worker::WorkerSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Process configuration, loaded once at startup from a JSON file.
/// Every field has a default so a partial file is fine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub page_load_timeout_secs: u64,
    pub desktop_user_agent: String,
    pub mobile_user_agent: String,
    pub default_submitter: String,
    pub entry_delay_ms: u64,
    pub profile_delay_ms: u64,
    pub idle_delay_ms: u64,
    pub step_delay_ms: u64,
    pub feed_sources_path: PathBuf,
    pub blocklist_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let render = RenderSettings::default();
        let feeder = FeederSettings::default();
        let worker = WorkerSettings::default();
        Self {
            db_path: PathBuf::from("driftnet.db"),
            page_load_timeout_secs: render.page_load_timeout.as_secs(),
            desktop_user_agent: render.desktop_user_agent,
            mobile_user_agent: render.mobile_user_agent,
            default_submitter: feeder.default_submitter,
            entry_delay_ms: feeder.entry_delay.as_millis() as u64,
            profile_delay_ms: feeder.profile_delay.as_millis() as u64,
            idle_delay_ms: worker.idle_delay.as_millis() as u64,
            step_delay_ms: worker.step_delay.as_millis() as u64,
            feed_sources_path: PathBuf::from("feed_sources.json"),
            blocklist_path: PathBuf::from("blocklist"),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            page_load_timeout: Duration::from_secs(self.page_load_timeout_secs),
            desktop_user_agent: self.desktop_user_agent.clone(),
            mobile_user_agent: self.mobile_user_agent.clone(),
        }
    }

    pub fn feeder_settings(&self) -> FeederSettings {
        FeederSettings {
            entry_delay: Duration::from_millis(self.entry_delay_ms),
            profile_delay: Duration::from_millis(self.profile_delay_ms),
            default_submitter: self.default_submitter.clone(),
        }
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            idle_delay: Duration::from_millis(self.idle_delay_ms),
            step_delay: Duration::from_millis(self.step_delay_ms),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedSources {
    sources: Vec<String>,
}

/// Load the ordered feed source list from a `{"sources": [...]}` JSON
/// document.
pub fn load_feed_sources(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: FeedSources =
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parsed.sources)
}

/// Load and parse the hosts-format blocklist. A missing file yields an
/// empty blocklist rather than an error.
pub fn load_blocklist(path: &Path) -> Result<HashSet<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse_blocklist(&content)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashSet::new()),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
