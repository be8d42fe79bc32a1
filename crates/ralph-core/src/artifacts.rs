//! On-disk artifacts written by a running job, and where to find them.
//!
//! Every job lives in `<jobs-dir>/<name>/`. The job loop writes the files
//! below at its own pace; none of them is guaranteed to exist or to be
//! well-formed at any given moment. [`read_json`] is the single tolerant
//! entry point: missing and malformed documents both come back as `None`.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::TaskStatus;

/// `logs/status.json`, rewritten by the job loop on every iteration.
///
/// Only the fields the dashboard reads are modelled. Anything else the job
/// loop writes is ignored, so an odd value there never hides the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub iteration: Option<u32>,
    /// Coarse value: `running`, `complete`, `error`, `idle`
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    /// Model name
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub project: Option<String>,
    /// Backend CLI running the iteration
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub cli: Option<String>,
}

/// `logs/completion.json`, written once when the job decides it is done.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionMarker {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub completed: bool,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub reason: Option<String>,
}

/// `.project/specs/tasks/summary.json`. May lag behind the phase documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_tasks: u32,
    #[serde(default, deserialize_with = "lenient::number")]
    pub completed_tasks: u32,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub current_phase: Option<String>,
}

/// A single task entry inside a phase document.
///
/// Progress only depends on how many tasks there are and which ones are
/// completed, so every field decodes leniently: a wrongly typed value falls
/// back to its default instead of rejecting the whole phase document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Numeric ids are kept in their decimal form
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
    /// Missing means pending; `null` or a non-string is unknown
    #[serde(default, deserialize_with = "lenient::task_status")]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub provider: Option<String>,
    /// `S`, `M` or `L`
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub complexity: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub depends_on: Vec<String>,
}

/// `.project/specs/tasks/phase-<N>*.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseDocument {
    #[serde(default, deserialize_with = "lenient::number")]
    pub phase: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
    /// `null` reads as no tasks
    #[serde(default, deserialize_with = "lenient::tasks")]
    pub tasks: Vec<Task>,
}

/// Field decoders that accept any JSON value and never fail.
///
/// The job loop is not under our control; a field we only display must not
/// be able to invalidate the document it sits in.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::Task;
    use crate::types::TaskStatus;

    fn scalar_string(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn scalar_u32(value: &Value) -> Option<u32> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(scalar_string(Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(scalar_string(Value::deserialize(d)?))
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        Ok(scalar_u32(&Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(scalar_u32(&Value::deserialize(d)?))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(matches!(Value::deserialize(d)?, Value::Bool(true)))
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.into_iter().filter_map(scalar_string).collect(),
            other => scalar_string(other).into_iter().collect(),
        })
    }

    pub fn task_status<'de, D: Deserializer<'de>>(d: D) -> Result<TaskStatus, D::Error> {
        Ok(match Value::deserialize(d)? {
            value @ Value::String(_) => {
                serde_json::from_value(value).unwrap_or(TaskStatus::Unknown)
            }
            _ => TaskStatus::Unknown,
        })
    }

    /// Entries that are not objects are still tasks; they just have no fields.
    pub fn tasks<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Task>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        })
    }
}

impl PhaseDocument {
    pub fn completed_count(&self) -> u32 {
        self.tasks.iter().filter(|t| t.status.is_done()).count() as u32
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|t| t.status.is_done())
    }
}

/// Path helpers for one job directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLayout {
    root: PathBuf,
}

impl JobLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn status_file(&self) -> PathBuf {
        self.logs_dir().join("status.json")
    }

    pub fn completion_file(&self) -> PathBuf {
        self.logs_dir().join("completion.json")
    }

    /// Pointer (usually a symlink) to the active iteration's readable log.
    pub fn current_log(&self) -> PathBuf {
        self.logs_dir().join("current.readable")
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join(".project").join("specs").join("tasks")
    }

    pub fn summary_file(&self) -> PathBuf {
        self.tasks_dir().join("summary.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn iteration_dir(&self, number: u32) -> PathBuf {
        self.logs_dir().join(format!("iteration_{number:03}"))
    }
}

/// Parse the number out of an `iteration_NNN` directory name.
pub fn parse_iteration_dir(name: &str) -> Option<u32> {
    name.strip_prefix("iteration_")?.parse().ok()
}

/// Parse the phase number out of a `phase-<N>[-suffix].json` file name.
pub fn parse_phase_file(name: &str) -> Option<u32> {
    let rest = name.strip_prefix("phase-")?.strip_suffix(".json")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        // phase-foo.json still counts as a phase document; it sorts first
        return Some(0);
    }
    digits.parse().ok()
}

/// Read and parse a JSON artifact. Absent and malformed documents are both `None`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %e, "artifact unreadable");
            }
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "artifact malformed, treating as absent");
            None
        }
    }
}
