use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_START_STEP: u64 = 0;
pub const DEFAULT_STEP_DELTA: u64 = 1;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    pub probe: ProbeSection,
    pub output: OutputSection,
    #[serde(default)]
    pub replay: Option<ReplaySection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProbeSection {
    /// Edge on which a bus is expected to end its route
    pub depot_edge: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputSection {
    pub path: PathBuf,
    pub start_step: Option<u64>,
    /// Exclusive; the last measured step when unset
    pub end_step: Option<u64>,
    pub step_delta: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySection {
    pub trace_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    pub fn depot_edge(&self) -> &str {
        &self.probe.depot_edge
    }

    pub fn output_path(&self) -> &Path {
        &self.output.path
    }

    pub fn start_step(&self) -> u64 {
        self.output.start_step.unwrap_or(DEFAULT_START_STEP)
    }

    pub fn end_step(&self) -> Option<u64> {
        self.output.end_step
    }

    pub fn step_delta(&self) -> u64 {
        self.output.step_delta.unwrap_or(DEFAULT_STEP_DELTA)
    }

    /// Returns the replay trace path, treating an empty path as missing.
    pub fn trace_path(&self) -> Option<&Path> {
        let path = self.replay.as_ref()?.trace_path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }
}
