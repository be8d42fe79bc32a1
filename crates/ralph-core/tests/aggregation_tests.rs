//! Integration tests for status aggregation over realistic job directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use ralph_core::{JobStatus, StatusAggregator, compute_job_view};
use tempfile::TempDir;

/// Write `content` to `job/relative`, creating parent directories.
fn write_artifact(job: &Path, relative: &str, content: &str) -> PathBuf {
    let path = job.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn set_mtime(path: &Path, ago: Duration) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - ago).unwrap();
}

const STALE_SUMMARY: &str =
    r#"{"total_tasks": 10, "completed_tasks": 1, "current_phase": "Foundation", "current_task": "1.2"}"#;

const PHASE_ONE: &str = r#"{
    "phase": 1,
    "name": "Foundation",
    "tasks": [
        {"id": "1.1", "name": "Scaffold", "status": "completed", "complexity": "S"},
        {"id": "1.2", "name": "Schema", "status": "completed", "depends_on": ["1.1"]},
        {"id": "1.3", "name": "Migrations", "status": "completed"}
    ]
}"#;

const PHASE_TWO: &str = r#"{
    "phase": 2,
    "name": "Features",
    "tasks": [
        {"id": "2.1", "name": "API", "status": "completed", "provider": "claude"},
        {"id": "2.2", "name": "UI", "status": "in_progress"},
        {"id": "2.3", "name": "Docs", "status": "blocked"}
    ]
}"#;

#[test]
fn test_run_status_only_job() {
    let temp = TempDir::new().unwrap();
    let job = temp.path().join("alpha");
    write_artifact(&job, "logs/status.json", r#"{"iteration": 7, "status": "running", "cli": "codex"}"#);

    let view = compute_job_view(&job);
    assert_eq!(view.status, JobStatus::Running);
    assert_eq!(view.iteration, Some(7));
    assert_eq!(view.provider.as_deref(), Some("codex"));
    assert!(view.task_progress.is_none());
    assert!(view.last_activity.is_some());
}

#[test]
fn test_completion_overrides_running() {
    let temp = TempDir::new().unwrap();
    let job = temp.path().join("beta");
    write_artifact(&job, "logs/status.json", r#"{"iteration": 12, "status": "running"}"#);
    write_artifact(&job, "logs/completion.json", r#"{"completed": true, "reason": "all tasks done"}"#);

    assert_eq!(compute_job_view(&job).status, JobStatus::Completed);
}

#[test]
fn test_completed_stays_completed_across_polls() {
    let temp = TempDir::new().unwrap();
    let job = temp.path().join("gamma");
    write_artifact(&job, "logs/completion.json", r#"{"completed": true}"#);

    for status in ["running", "error", "idle", "complete"] {
        write_artifact(&job, "logs/status.json", &format!(r#"{{"status": "{status}"}}"#));
        assert_eq!(compute_job_view(&job).status, JobStatus::Completed);
    }

    // Removing the marker is an external reset.
    fs::remove_file(job.join("logs/completion.json")).unwrap();
    write_artifact(&job, "logs/status.json", r#"{"status": "running"}"#);
    assert_eq!(compute_job_view(&job).status, JobStatus::Running);
}

#[test]
fn test_live_phase_sum_beats_stale_summary() {
    let temp = TempDir::new().unwrap();
    let job = temp.path().join("delta");
    write_artifact(&job, ".project/specs/tasks/summary.json", STALE_SUMMARY);
    write_artifact(&job, ".project/specs/tasks/phase-1.json", PHASE_ONE);
    write_artifact(&job, ".project/specs/tasks/phase-2.json", PHASE_TWO);

    let progress = compute_job_view(&job).task_progress.unwrap();
    assert_eq!(progress.total, 6);
    assert_eq!(progress.completed, 4);
    assert!(progress.completed <= progress.total);
    assert_eq!(progress.current_phase, "Foundation");
}

#[test]
fn test_current_phase_from_first_unfinished_phase() {
    let temp = TempDir::new().unwrap();
    let job = temp.path().join("epsilon");
    write_artifact(&job, ".project/specs/tasks/phase-1.json", PHASE_ONE);
    write_artifact(&job, ".project/specs/tasks/phase-2.json", PHASE_TWO);

    let progress = compute_job_view(&job).task_progress.unwrap();
    assert_eq!(progress.current_phase, "Features");
}

#[test]
fn test_every_artifact_malformed_still_yields_view() {
    let temp = TempDir::new().unwrap();
    let job = temp.path().join("zeta");
    for relative in [
        "logs/status.json",
        "logs/completion.json",
        ".project/specs/tasks/summary.json",
        "config.json",
    ] {
        write_artifact(&job, relative, "{{{");
    }

    let view = compute_job_view(&job);
    assert_eq!(view.name, "zeta");
    assert_eq!(view.status, JobStatus::Idle);
    assert!(view.task_progress.is_none());
}

#[test]
fn test_compute_all_orders_by_activity() {
    let temp = TempDir::new().unwrap();
    let old = write_artifact(&temp.path().join("old"), "logs/status.json", r#"{"status": "idle"}"#);
    let fresh = write_artifact(&temp.path().join("fresh"), "logs/status.json", r#"{"status": "running"}"#);
    fs::create_dir_all(temp.path().join("never-ran")).unwrap();
    fs::create_dir_all(temp.path().join("_template/logs")).unwrap();

    set_mtime(&old, Duration::from_secs(3600));
    set_mtime(&fresh, Duration::from_secs(5));

    let aggregator = StatusAggregator::new(temp.path());
    let names: Vec<String> = aggregator.compute_all().into_iter().map(|v| v.name).collect();
    assert_eq!(names, vec!["fresh", "old", "never-ran"]);
}

#[test]
fn test_vanished_job_is_dropped() {
    let temp = TempDir::new().unwrap();
    write_artifact(&temp.path().join("keep"), "logs/status.json", "{}");
    write_artifact(&temp.path().join("gone"), "logs/status.json", "{}");

    let aggregator = StatusAggregator::new(temp.path());
    assert_eq!(aggregator.compute_all().len(), 2);

    fs::remove_dir_all(temp.path().join("gone")).unwrap();
    let views = aggregator.compute_all();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].name, "keep");
}
