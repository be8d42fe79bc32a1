//! Shared type definitions used across Ralph crates.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The job loop is executing an iteration
    Running,
    /// The completion marker says the job is done
    Completed,
    /// The job reported an error and is waiting for a human
    Blocked,
    /// No recognisable status artifact
    #[default]
    Idle,
}

impl JobStatus {
    /// All statuses in display order.
    pub const ALL: [JobStatus; 4] = [Self::Running, Self::Completed, Self::Blocked, Self::Idle];

    /// Map the coarse value written by the job loop into `logs/status.json`.
    ///
    /// Unknown values fall back to [`JobStatus::Idle`].
    pub fn from_run_status(raw: &str) -> Self {
        match raw {
            "running" => Self::Running,
            "complete" | "completed" => Self::Completed,
            "error" => Self::Blocked,
            _ => Self::Idle,
        }
    }

    /// Single-character indicator for list rendering.
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Running => "●",
            Self::Completed => "✓",
            Self::Blocked => "✗",
            Self::Idle => "○",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Blocked => write!(f, "blocked"),
            Self::Idle => write!(f, "idle"),
        }
    }
}

/// Status of a single task inside a phase document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
    /// Any value the job loop writes that we do not recognise
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Blocked => write!(f, "blocked"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Aggregated task counts for a job.
///
/// Always satisfies `completed <= total` and `total > 0`; a job with no
/// discoverable tasks carries no `TaskProgress` at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub completed: u32,
    pub total: u32,
    pub current_phase: String,
}

impl TaskProgress {
    /// Build a progress value, clamping `completed` to `total`.
    ///
    /// Returns `None` when `total` is zero.
    pub fn new(completed: u32, total: u32, current_phase: impl Into<String>) -> Option<Self> {
        if total == 0 {
            return None;
        }
        Some(Self {
            completed: completed.min(total),
            total,
            current_phase: current_phase.into(),
        })
    }

    /// Completion percentage in `0..=100`.
    pub fn percent(&self) -> u16 {
        ((u64::from(self.completed) * 100) / u64::from(self.total)) as u16
    }
}

/// Normalized, read-only snapshot of one job, rebuilt on every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct JobView {
    /// Directory name under the jobs directory
    pub name: String,
    /// Absolute path of the job directory
    pub path: PathBuf,
    pub description: Option<String>,
    pub status: JobStatus,
    pub iteration: Option<u32>,
    pub max_iterations: Option<u32>,
    /// Backend that runs the job (`status.cli`, else the builder backend)
    pub provider: Option<String>,
    pub model: Option<String>,
    pub last_activity: Option<DateTime<Utc>>,
    pub task_progress: Option<TaskProgress>,
}

impl JobView {
    /// A view with nothing known except the name and location.
    pub fn empty(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            description: None,
            status: JobStatus::Idle,
            iteration: None,
            max_iterations: None,
            provider: None,
            model: None,
            last_activity: None,
            task_progress: None,
        }
    }
}

/// Format a timestamp relative to `now` the way the job list shows it.
///
/// `<1m ago`, `5m ago`, `3h ago`, `2d ago`; `-` when there is no timestamp.
pub fn format_relative_time(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return "-".to_string();
    };
    let minutes = now.signed_duration_since(at).num_minutes();
    if minutes < 1 {
        "<1m ago".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 60 * 24 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / (60 * 24))
    }
}
