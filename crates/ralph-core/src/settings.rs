//! Dashboard settings from `~/.ralph/dashboard.yaml`.
//!
//! Every field is optional in the file. Command-line flags are applied on
//! top by the binary after loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RalphError, Result};
use crate::logging::ralph_home;

/// Jobs directory used when none is configured, relative to the working directory.
pub const DEFAULT_JOBS_DIR: &str = ".projects";

/// Default poll interval in milliseconds.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 500;

/// Default number of log lines kept for the focused job.
pub const DEFAULT_LOG_BUFFER_CAPACITY: usize = 500;

/// Default number of lines loaded when a job is selected.
pub const DEFAULT_PRIME_LINES: usize = 100;

/// Settings file name under `~/.ralph/`.
pub const SETTINGS_FILE_NAME: &str = "dashboard.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Directory containing one subdirectory per job
    pub jobs_dir: Option<PathBuf>,
    pub refresh_interval_ms: u64,
    pub log_buffer_capacity: usize,
    pub prime_lines: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            jobs_dir: None,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            log_buffer_capacity: DEFAULT_LOG_BUFFER_CAPACITY,
            prime_lines: DEFAULT_PRIME_LINES,
        }
    }
}

impl DashboardSettings {
    /// `~/.ralph/dashboard.yaml`
    pub fn default_path() -> Result<PathBuf> {
        Ok(ralph_home()?.join(SETTINGS_FILE_NAME))
    }

    /// Load settings from `path`, or the default location when `None`.
    ///
    /// A missing file yields defaults. A file that exists but does not
    /// parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            debug!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| RalphError::io("reading settings", &path, e))?;
        Self::parse(&content).map_err(|message| RalphError::ConfigInvalid { path, message })
    }

    /// Parse settings YAML. An empty document yields defaults.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.refresh_interval_ms < 50 {
            return Err(format!(
                "refresh_interval_ms must be >= 50, got {}",
                self.refresh_interval_ms
            ));
        }
        if self.log_buffer_capacity == 0 {
            return Err("log_buffer_capacity must be at least 1".to_string());
        }
        Ok(())
    }

    /// Configured jobs directory, or `.projects` under `cwd`.
    pub fn resolve_jobs_dir(&self, cwd: &Path) -> PathBuf {
        match &self.jobs_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => cwd.join(DEFAULT_JOBS_DIR),
        }
    }
}
