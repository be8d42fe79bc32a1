//! Periodic re-polling of the jobs directory.
//!
//! A [`RefreshScheduler`] owns the aggregator, the per-job tail offsets and
//! the log buffers. Every tick rebuilds the whole `JobView` list and, when
//! the detail screen is showing logs, appends that job's new lines to its
//! [`LogBuffer`]. Ticks run on the UI thread and never overlap.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ralph_core::artifacts::{PhaseDocument, Task};
use ralph_core::history::list_iterations;
use ralph_core::status::load_phases;
use ralph_core::{DashboardSettings, IterationInfo, JobView, LogTailer, StatusAggregator};
use tracing::{debug, trace};

use crate::view::TaskFilter;

/// Bounded log lines for one job. Oldest lines are evicted first.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
    /// Lines evicted because of the capacity limit
    dropped_count: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(10_000)),
            capacity,
            dropped_count: 0,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
            self.dropped_count += 1;
        }
        self.lines.push_back(line);
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = String>) {
        for line in lines {
            self.push(line);
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped_count
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &String> + ExactSizeIterator {
        self.lines.iter()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.dropped_count = 0;
    }
}

/// Phase documents and iteration history for the job on the detail screen.
#[derive(Debug, Clone, Default)]
pub struct DetailData {
    pub job: String,
    pub phases: Vec<PhaseDocument>,
    pub iterations: Vec<IterationInfo>,
}

impl DetailData {
    pub fn load(job: &str, job_path: &Path) -> Self {
        Self {
            job: job.to_string(),
            phases: load_phases(job_path),
            iterations: list_iterations(job_path),
        }
    }

    /// Tasks across all phases in phase order, with the phase they belong to.
    pub fn tasks(&self, filter: TaskFilter) -> Vec<(&PhaseDocument, &Task)> {
        self.phases
            .iter()
            .flat_map(|phase| phase.tasks.iter().map(move |task| (phase, task)))
            .filter(|(_, task)| filter.matches(task.status))
            .collect()
    }
}

/// What the current screen wants refreshed besides the job list.
#[derive(Debug, Clone, Copy, Default)]
pub struct Focus<'a> {
    /// Job shown on the detail screen
    pub job: Option<&'a str>,
    /// Whether the logs tab is visible
    pub tail_logs: bool,
}

/// Summary of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub jobs: usize,
    pub appended_lines: usize,
}

pub struct RefreshScheduler {
    aggregator: StatusAggregator,
    tailer: LogTailer,
    interval: Duration,
    last_tick: Option<Instant>,
    jobs: Vec<JobView>,
    buffers: HashMap<String, LogBuffer>,
    detail: Option<DetailData>,
    capacity: usize,
    prime_lines: usize,
}

impl RefreshScheduler {
    pub fn new(jobs_dir: impl Into<PathBuf>, settings: &DashboardSettings) -> Self {
        Self {
            aggregator: StatusAggregator::new(jobs_dir),
            tailer: LogTailer::new(),
            interval: Duration::from_millis(settings.refresh_interval_ms),
            last_tick: None,
            jobs: Vec::new(),
            buffers: HashMap::new(),
            detail: None,
            capacity: settings.log_buffer_capacity,
            prime_lines: settings.prime_lines,
        }
    }

    pub fn jobs_dir(&self) -> &Path {
        self.aggregator.jobs_dir()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Latest snapshots, most recently active first.
    pub fn jobs(&self) -> &[JobView] {
        &self.jobs
    }

    pub fn detail(&self) -> Option<&DetailData> {
        self.detail.as_ref()
    }

    pub fn log_buffer(&self, job: &str) -> Option<&LogBuffer> {
        self.buffers.get(job)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.time_until_due(now).is_zero()
    }

    /// Time left before the next tick; zero when one is due.
    pub fn time_until_due(&self, now: Instant) -> Duration {
        match self.last_tick {
            Some(last) => (last + self.interval).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Make the next [`RefreshScheduler::is_due`] return true.
    pub fn request_now(&mut self) {
        self.last_tick = None;
    }

    fn job_path(&self, job: &str) -> PathBuf {
        self.jobs
            .iter()
            .find(|view| view.name == job)
            .map(|view| view.path.clone())
            .unwrap_or_else(|| self.aggregator.jobs_dir().join(job))
    }

    /// Reset a job's buffer and offset, then load its most recent lines.
    ///
    /// Called when a job is selected from the list so the logs tab starts
    /// from a known state without duplicating what the next tail returns.
    pub fn select_job(&mut self, job: &str) {
        let path = self.job_path(job);
        let primed = self.tailer.prime(job, &path, self.prime_lines);
        debug!(job, lines = primed.len(), "primed log buffer");

        let buffer = self
            .buffers
            .entry(job.to_string())
            .or_insert_with(|| LogBuffer::new(self.capacity));
        buffer.clear();
        buffer.extend(primed);

        self.detail = Some(DetailData::load(job, &path));
    }

    /// Re-poll every job and refresh whatever `focus` needs.
    pub fn tick(&mut self, focus: Focus<'_>, now: Instant) -> TickReport {
        self.last_tick = Some(now);
        self.jobs = self.aggregator.compute_all();

        let live: Vec<&str> = self.jobs.iter().map(|j| j.name.as_str()).collect();
        self.buffers.retain(|name, _| live.contains(&name.as_str()));
        self.tailer.retain_jobs(live.iter().copied());

        let mut report = TickReport {
            jobs: self.jobs.len(),
            appended_lines: 0,
        };

        let Some(job) = focus.job.filter(|job| live.contains(job)) else {
            self.detail = None;
            trace!(jobs = report.jobs, "tick");
            return report;
        };
        let path = self.job_path(job);

        if focus.tail_logs {
            let lines = self.tailer.tail(job, &path);
            report.appended_lines = lines.len();
            self.buffers
                .entry(job.to_string())
                .or_insert_with(|| LogBuffer::new(self.capacity))
                .extend(lines);
        }
        self.detail = Some(DetailData::load(job, &path));

        trace!(jobs = report.jobs, appended = report.appended_lines, "tick");
        report
    }
}
