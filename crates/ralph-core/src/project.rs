//! Job directory operations: naming, creation and deletion.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::ProjectConfig;
use crate::error::{RalphError, Result};

/// Turn a display name into a directory name.
///
/// Lowercases, maps whitespace and underscores to `-`, drops everything
/// outside `[a-z0-9-]`, collapses repeated dashes and trims them at the ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        let mapped = if c.is_whitespace() || c == '_' { '-' } else { c };
        if !(mapped.is_ascii_lowercase() || mapped.is_ascii_digit() || mapped == '-') {
            continue;
        }
        if mapped == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(mapped);
    }
    slug.trim_matches('-').to_string()
}

/// Directory for a job named `name` under `jobs_dir`.
pub fn job_dir(jobs_dir: &Path, name: &str) -> Result<PathBuf> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(RalphError::InvalidJobName {
            name: name.to_string(),
        });
    }
    Ok(jobs_dir.join(slug))
}

/// Remove a job directory and everything in it.
pub fn delete_job(jobs_dir: &Path, name: &str) -> Result<()> {
    let path = jobs_dir.join(name);
    if !path.is_dir() {
        return Err(RalphError::job_not_found(name));
    }
    std::fs::remove_dir_all(&path).map_err(|e| {
        warn!(job = name, error = %e, "failed to delete job");
        RalphError::io("deleting job", &path, e)
    })?;
    info!(job = name, "deleted job");
    Ok(())
}

/// Create `<jobs_dir>/<slug>/config.json` for a new job.
///
/// An existing job directory with the same slug is an error.
pub fn create_job(jobs_dir: &Path, config: &ProjectConfig) -> Result<PathBuf> {
    let dir = job_dir(jobs_dir, &config.name)?;
    if dir.exists() {
        return Err(RalphError::JobExists {
            name: config.name.clone(),
        });
    }
    config.save(&dir.join("config.json"))?;
    info!(job = %dir.display(), "created job");
    Ok(dir)
}
