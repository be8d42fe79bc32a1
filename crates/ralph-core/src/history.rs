//! Iteration history for the detail screen's history tab.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::artifacts::{JobLayout, parse_iteration_dir, read_json};
use crate::tail::READABLE_LOG;

/// One `logs/iteration_NNN/` directory.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationInfo {
    pub number: u32,
    pub dir: PathBuf,
    pub has_readable_log: bool,
    /// Wall-clock seconds from `duration.json`
    pub duration_secs: Option<f64>,
    /// Integer parsed from the `exit_code` sidecar
    pub exit_code: Option<i32>,
}

impl IterationInfo {
    pub fn succeeded(&self) -> Option<bool> {
        self.exit_code.map(|code| code == 0)
    }
}

#[derive(Deserialize)]
struct DurationSidecar {
    seconds: f64,
}

/// List iterations newest first. Missing sidecars leave fields empty.
pub fn list_iterations(job_path: &Path) -> Vec<IterationInfo> {
    let layout = JobLayout::new(job_path);
    let Ok(entries) = std::fs::read_dir(layout.logs_dir()) else {
        return Vec::new();
    };

    let mut iterations: Vec<IterationInfo> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| {
            let number = parse_iteration_dir(&e.file_name().to_string_lossy())?;
            Some(read_iteration(number, e.path()))
        })
        .collect();

    iterations.sort_by(|a, b| b.number.cmp(&a.number));
    iterations
}

fn read_iteration(number: u32, dir: PathBuf) -> IterationInfo {
    let duration_secs = read_json::<DurationSidecar>(&dir.join("duration.json")).map(|d| d.seconds);
    let exit_code = std::fs::read_to_string(dir.join("exit_code"))
        .ok()
        .and_then(|raw| raw.trim().parse().ok());

    IterationInfo {
        number,
        has_readable_log: dir.join(READABLE_LOG).is_file(),
        duration_secs,
        exit_code,
        dir,
    }
}

/// Render seconds as `45s`, `3m 20s` or `1h 05m`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    if total < 60 {
        format!("{total}s")
    } else if total < 3600 {
        format!("{}m {:02}s", total / 60, total % 60)
    } else {
        format!("{}h {:02}m", total / 3600, (total % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_iteration(job: &Path, number: u32) -> PathBuf {
        let dir = job.join("logs").join(format!("iteration_{number:03}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_list_iterations_newest_first() {
        let temp = TempDir::new().unwrap();
        let one = create_iteration(temp.path(), 1);
        let two = create_iteration(temp.path(), 2);
        create_iteration(temp.path(), 10);
        fs::write(one.join(READABLE_LOG), "log").unwrap();
        fs::write(one.join("duration.json"), r#"{"seconds": 42.5}"#).unwrap();
        fs::write(one.join("exit_code"), "0\n").unwrap();
        fs::write(two.join("exit_code"), "garbage").unwrap();
        fs::write(temp.path().join("logs/status.json"), "{}").unwrap();

        let iterations = list_iterations(temp.path());
        let numbers: Vec<u32> = iterations.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![10, 2, 1]);

        let first = &iterations[2];
        assert!(first.has_readable_log);
        assert_eq!(first.duration_secs, Some(42.5));
        assert_eq!(first.succeeded(), Some(true));
        assert!(iterations[1].exit_code.is_none());
        assert!(!iterations[0].has_readable_log);
    }

    #[test]
    fn test_list_iterations_without_logs_dir() {
        let temp = TempDir::new().unwrap();
        assert!(list_iterations(temp.path()).is_empty());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45.0), "45s");
        assert_eq!(format_duration(200.0), "3m 20s");
        assert_eq!(format_duration(3900.0), "1h 05m");
    }
}
