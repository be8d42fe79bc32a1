//! Status aggregation: one coherent [`JobView`] per job directory.
//!
//! A job leaves several documents behind, each written independently and
//! possibly stale. The aggregator reads whatever subset exists and resolves
//! them with a fixed precedence:
//!
//! - **status**: completion marker, then `logs/status.json`, then idle
//! - **task progress**: live sum over phase documents, then `summary.json`
//! - **last activity**: newest mtime among iteration directories and `status.json`
//!
//! Nothing here returns an error. An unreadable artifact is an absent one.
//!
//! ```no_run
//! use ralph_core::StatusAggregator;
//!
//! let aggregator = StatusAggregator::new("/home/me/.projects");
//! for job in aggregator.compute_all() {
//!     println!("{}: {}", job.name, job.status);
//! }
//! ```

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::artifacts::{
    CompletionMarker, JobLayout, PhaseDocument, RunStatus, TaskSummary, parse_iteration_dir,
    parse_phase_file, read_json,
};
use crate::config::ProjectConfig;
use crate::types::{JobStatus, JobView, TaskProgress};

/// Reads job directories under a single jobs directory.
#[derive(Debug, Clone)]
pub struct StatusAggregator {
    jobs_dir: PathBuf,
}

impl StatusAggregator {
    pub fn new(jobs_dir: impl Into<PathBuf>) -> Self {
        let jobs_dir = jobs_dir.into();
        debug!(jobs_dir = %jobs_dir.display(), "StatusAggregator initialized");
        Self { jobs_dir }
    }

    pub fn jobs_dir(&self) -> &Path {
        &self.jobs_dir
    }

    /// List job directories, skipping files and names starting with `_` or `.`.
    ///
    /// A missing or unreadable jobs directory yields an empty list.
    pub fn discover_jobs(&self) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(&self.jobs_dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(jobs_dir = %self.jobs_dir.display(), error = %e, "cannot list jobs directory");
                }
                return Vec::new();
            }
        };

        let mut jobs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                !name.starts_with('_') && !name.starts_with('.')
            })
            .map(|entry| entry.path())
            .collect();
        jobs.sort();
        jobs
    }

    /// Aggregate every discovered job, most recently active first.
    ///
    /// Jobs without any activity timestamp sort last; ties break on name.
    pub fn compute_all(&self) -> Vec<JobView> {
        let mut views: Vec<JobView> = self
            .discover_jobs()
            .iter()
            .map(|path| compute_job_view(path))
            .collect();
        views.sort_by(compare_by_activity);
        views
    }
}

fn compare_by_activity(a: &JobView, b: &JobView) -> Ordering {
    match (a.last_activity, b.last_activity) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    }
}

/// Build the snapshot for one job directory. Always succeeds.
pub fn compute_job_view(job_path: &Path) -> JobView {
    let layout = JobLayout::new(job_path);
    let name = job_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let run_status: Option<RunStatus> = read_json(&layout.status_file());
    let completion: Option<CompletionMarker> = read_json(&layout.completion_file());
    let summary: Option<TaskSummary> = read_json(&layout.summary_file());
    let config: Option<ProjectConfig> = read_json(&layout.config_file());

    let mut view = JobView::empty(name, job_path);
    view.status = resolve_status(run_status.as_ref(), completion.as_ref());
    view.iteration = run_status.as_ref().and_then(|s| s.iteration);
    view.task_progress = task_progress(&layout, summary.as_ref());
    view.last_activity = last_activity(&layout);

    let status_cli = run_status.as_ref().and_then(|s| non_empty(s.cli.as_deref()));
    let builder_backend = config.as_ref().map(|c| c.builder.backend.id().to_string());
    view.provider = status_cli.or(builder_backend);

    let status_model = run_status.as_ref().and_then(|s| non_empty(s.project.as_deref()));
    view.model = status_model.or_else(|| config.as_ref().and_then(|c| c.builder.model.clone()));

    if let Some(config) = config {
        view.description = non_empty(Some(config.description.as_str()));
        view.max_iterations = Some(config.max_iterations);
    }

    view
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Completion marker wins over whatever the run status says.
pub fn resolve_status(
    run_status: Option<&RunStatus>,
    completion: Option<&CompletionMarker>,
) -> JobStatus {
    if completion.is_some_and(|c| c.completed) {
        return JobStatus::Completed;
    }
    match run_status.and_then(|s| s.status.as_deref()) {
        Some(raw) => JobStatus::from_run_status(raw),
        None => JobStatus::Idle,
    }
}

fn summary_progress(summary: Option<&TaskSummary>) -> Option<TaskProgress> {
    let summary = summary?;
    TaskProgress::new(
        summary.completed_tasks,
        summary.total_tasks,
        summary.current_phase.clone().unwrap_or_else(|| "unknown".to_string()),
    )
}

fn task_progress(layout: &JobLayout, summary: Option<&TaskSummary>) -> Option<TaskProgress> {
    let files = match list_phase_files(&layout.tasks_dir()) {
        Ok(files) => files,
        Err(e) => {
            debug!(dir = %layout.tasks_dir().display(), error = %e, "tasks directory unreadable, using summary");
            return summary_progress(summary);
        }
    };

    if files.is_empty() {
        return summary_progress(summary);
    }

    // Malformed phase documents are skipped; the rest still count.
    let phases: Vec<PhaseDocument> = files.iter().filter_map(|p| read_json(p)).collect();

    let total: u32 = phases.iter().map(|p| p.tasks.len() as u32).sum();
    let completed: u32 = phases.iter().map(PhaseDocument::completed_count).sum();

    let current_phase = summary
        .and_then(|s| non_empty(s.current_phase.as_deref()))
        .or_else(|| {
            phases
                .iter()
                .find(|p| !p.is_finished())
                .and_then(|p| non_empty(Some(p.name.as_str())))
        })
        .unwrap_or_else(|| "unknown".to_string());

    TaskProgress::new(completed, total, current_phase)
}

/// Phase document paths in a tasks directory, ordered by phase number.
fn list_phase_files(tasks_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<(u32, String, PathBuf)> = std::fs::read_dir(tasks_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            parse_phase_file(&name).map(|n| (n, name, entry.path()))
        })
        .collect();
    files.sort();
    Ok(files.into_iter().map(|(_, _, path)| path).collect())
}

/// Every parseable phase document of a job, ordered by phase number.
pub fn load_phases(job_path: &Path) -> Vec<PhaseDocument> {
    let layout = JobLayout::new(job_path);
    match list_phase_files(&layout.tasks_dir()) {
        Ok(files) => files.iter().filter_map(|p| read_json(p)).collect(),
        Err(_) => Vec::new(),
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn last_activity(layout: &JobLayout) -> Option<DateTime<Utc>> {
    let mut latest = mtime(&layout.status_file());

    if let Ok(entries) = std::fs::read_dir(layout.logs_dir()) {
        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            if parse_iteration_dir(&name.to_string_lossy()).is_none() {
                continue;
            }
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let modified = entry.metadata().and_then(|m| m.modified()).ok();
            latest = latest.max(modified);
        }
    }

    latest.map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_job(jobs_dir: &Path, name: &str) -> PathBuf {
        let path = jobs_dir.join(name);
        fs::create_dir_all(path.join("logs")).unwrap();
        path
    }

    fn create_test_status_file(job: &Path, content: &str) {
        fs::write(job.join("logs").join("status.json"), content).unwrap();
    }

    fn create_test_phase_file(job: &Path, file: &str, content: &str) {
        let dir = job.join(".project/specs/tasks");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_job_with_no_artifacts_is_idle() {
        let temp = TempDir::new().unwrap();
        let job = create_job(temp.path(), "empty");

        let view = compute_job_view(&job);
        assert_eq!(view.name, "empty");
        assert_eq!(view.status, JobStatus::Idle);
        assert!(view.provider.is_none());
        assert!(view.iteration.is_none());
        assert!(view.task_progress.is_none());
        assert!(view.last_activity.is_none());
    }

    #[test]
    fn test_run_status_only() {
        let temp = TempDir::new().unwrap();
        let job = create_job(temp.path(), "alpha");
        create_test_status_file(
            &job,
            r#"{"iteration": 3, "status": "running", "project": "opus", "cli": "claude"}"#,
        );

        let view = compute_job_view(&job);
        assert_eq!(view.status, JobStatus::Running);
        assert_eq!(view.iteration, Some(3));
        assert_eq!(view.provider.as_deref(), Some("claude"));
        assert_eq!(view.model.as_deref(), Some("opus"));
        assert!(view.last_activity.is_some());
    }

    #[test]
    fn test_error_maps_to_blocked() {
        let temp = TempDir::new().unwrap();
        let job = create_job(temp.path(), "beta");
        create_test_status_file(&job, r#"{"status": "error"}"#);
        assert_eq!(compute_job_view(&job).status, JobStatus::Blocked);
    }

    #[test]
    fn test_completion_false_does_not_override() {
        let temp = TempDir::new().unwrap();
        let job = create_job(temp.path(), "gamma");
        create_test_status_file(&job, r#"{"status": "running"}"#);
        fs::write(job.join("logs/completion.json"), r#"{"completed": false}"#).unwrap();
        assert_eq!(compute_job_view(&job).status, JobStatus::Running);
    }

    #[test]
    fn test_malformed_status_is_absent() {
        let temp = TempDir::new().unwrap();
        let job = create_job(temp.path(), "delta");
        create_test_status_file(&job, "{\"status\": \"runn");
        let view = compute_job_view(&job);
        assert_eq!(view.status, JobStatus::Idle);
        assert!(view.iteration.is_none());
    }

    #[test]
    fn test_run_status_with_unmodelled_fields() {
        let temp = TempDir::new().unwrap();
        let job = create_job(temp.path(), "kappa");
        create_test_status_file(
            &job,
            r#"{"iteration": 3, "status": "running", "started": 1718000000, "exit_code": null}"#,
        );

        let view = compute_job_view(&job);
        assert_eq!(view.status, JobStatus::Running);
        assert_eq!(view.iteration, Some(3));
    }

    #[test]
    fn test_loosely_typed_tasks_still_count() {
        let temp = TempDir::new().unwrap();
        let job = create_job(temp.path(), "lambda");
        create_test_phase_file(
            &job,
            "phase-1.json",
            r#"{"phase": 1, "name": "Setup", "tasks": [
                {"id": 1, "status": "completed"},
                {"id": "2", "status": "pending", "depends_on": null}]}"#,
        );

        let progress = compute_job_view(&job).task_progress.unwrap();
        assert_eq!((progress.completed, progress.total), (1, 2));
    }

    #[test]
    fn test_provider_falls_back_to_config() {
        let temp = TempDir::new().unwrap();
        let job = create_job(temp.path(), "epsilon");
        fs::write(
            job.join("config.json"),
            r#"{"name": "epsilon", "description": "docs site",
                "builder": {"backend": "gemini", "auth_mode": "gemini-api", "model": "pro"},
                "max_iterations": 40}"#,
        )
        .unwrap();

        let view = compute_job_view(&job);
        assert_eq!(view.provider.as_deref(), Some("gemini"));
        assert_eq!(view.model.as_deref(), Some("pro"));
        assert_eq!(view.description.as_deref(), Some("docs site"));
        assert_eq!(view.max_iterations, Some(40));
    }

    #[test]
    fn test_partial_phase_failure_counts_valid_files() {
        let temp = TempDir::new().unwrap();
        let job = create_job(temp.path(), "zeta");
        create_test_phase_file(
            &job,
            "phase-1.json",
            r#"{"phase": 1, "name": "Setup", "tasks": [
                {"id": "1", "status": "completed"}, {"id": "2", "status": "pending"}]}"#,
        );
        create_test_phase_file(&job, "phase-2.json", "not json");

        let progress = compute_job_view(&job).task_progress.unwrap();
        assert_eq!(progress.total, 2);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.current_phase, "Setup");
    }

    #[test]
    fn test_phase_files_without_tasks_mean_no_progress() {
        let temp = TempDir::new().unwrap();
        let job = create_job(temp.path(), "eta");
        create_test_phase_file(&job, "phase-1.json", r#"{"phase": 1, "name": "Empty", "tasks": []}"#);
        create_test_phase_file(
            &job,
            "summary.json",
            r#"{"total_tasks": 9, "completed_tasks": 2, "current_phase": "Old"}"#,
        );
        assert!(compute_job_view(&job).task_progress.is_none());
    }

    #[test]
    fn test_summary_used_without_phase_files() {
        let temp = TempDir::new().unwrap();
        let job = create_job(temp.path(), "theta");
        create_test_phase_file(
            &job,
            "summary.json",
            r#"{"total_tasks": 4, "completed_tasks": 7, "current_phase": "Build"}"#,
        );
        let progress = compute_job_view(&job).task_progress.unwrap();
        assert_eq!(progress.total, 4);
        assert_eq!(progress.completed, 4);
        assert_eq!(progress.current_phase, "Build");
    }

    #[test]
    fn test_load_phases_sorted_numerically() {
        let temp = TempDir::new().unwrap();
        let job = create_job(temp.path(), "iota");
        create_test_phase_file(&job, "phase-10.json", r#"{"phase": 10, "name": "Ten"}"#);
        create_test_phase_file(&job, "phase-2.json", r#"{"phase": 2, "name": "Two"}"#);
        create_test_phase_file(&job, "phase-1-setup.json", r#"{"phase": 1, "name": "One"}"#);

        let names: Vec<String> = load_phases(&job).into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["One", "Two", "Ten"]);
    }

    #[test]
    fn test_discover_skips_hidden_and_files() {
        let temp = TempDir::new().unwrap();
        create_job(temp.path(), "visible");
        create_job(temp.path(), "_template");
        create_job(temp.path(), ".cache");
        fs::write(temp.path().join("notes.txt"), "x").unwrap();

        let aggregator = StatusAggregator::new(temp.path());
        let names: Vec<String> = aggregator
            .discover_jobs()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["visible"]);
    }

    #[test]
    fn test_missing_jobs_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let aggregator = StatusAggregator::new(temp.path().join("nope"));
        assert!(aggregator.compute_all().is_empty());
    }

    #[test]
    fn test_compare_by_activity_puts_inactive_last() {
        let now = Utc::now();
        let mut a = JobView::empty("a", "/a");
        let mut b = JobView::empty("b", "/b");
        let c = JobView::empty("c", "/c");
        a.last_activity = Some(now - chrono::Duration::minutes(10));
        b.last_activity = Some(now);

        let mut views = vec![c, a, b];
        views.sort_by(compare_by_activity);
        let names: Vec<&str> = views.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
