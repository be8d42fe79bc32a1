//! Incremental tailing of a job's readable log.
//!
//! Each poll reads exactly the bytes appended since the previous poll,
//! bounded by the file size observed at the start of that poll. A file that
//! shrank below the remembered offset was truncated or rotated, so reading
//! restarts from zero. Offsets are kept per job in memory only.
//!
//! A multi-byte UTF-8 character can be caught half-written at the end of a
//! read. Its leading bytes are left unread so the next poll decodes the
//! whole character instead of two replacement characters.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::artifacts::{JobLayout, parse_iteration_dir};

/// Name of the human-readable log inside an iteration directory.
pub const READABLE_LOG: &str = "output.readable";

/// Outcome of a single tail read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailResult {
    /// Complete or partial lines appended since the previous offset
    pub lines: Vec<String>,
    /// Offset to pass to the next read
    pub offset: u64,
    pub eof: bool,
}

/// Read position for one job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailState {
    /// Resolved log target the offset refers to
    pub path: Option<PathBuf>,
    pub offset: u64,
    pub eof: bool,
}

/// Locate the log file to tail for a job.
///
/// `logs/current.readable` wins when it can be opened. Otherwise the newest
/// iteration directory (by number) that has a readable log is used.
pub fn resolve_log_path(job_path: &Path) -> Option<PathBuf> {
    let layout = JobLayout::new(job_path);
    let current = layout.current_log();
    if File::open(&current).is_ok() {
        return Some(current);
    }

    let entries = std::fs::read_dir(layout.logs_dir()).ok()?;
    let mut iterations: Vec<(u32, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let number = parse_iteration_dir(&e.file_name().to_string_lossy())?;
            Some((number, e.path()))
        })
        .collect();
    iterations.sort_by(|a, b| b.0.cmp(&a.0));

    iterations
        .into_iter()
        .map(|(_, dir)| dir.join(READABLE_LOG))
        .find(|log| log.is_file())
}

/// Read the bytes `[last_offset, size)` of `path` and split them into lines.
///
/// An offset beyond the current size restarts from zero. A trailing newline
/// does not produce an empty final line. An incomplete UTF-8 sequence at the
/// very end is not consumed, so the returned offset can stop up to three
/// bytes short of the size.
pub fn tail_file(path: &Path, last_offset: u64) -> std::io::Result<TailResult> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();

    let start = if last_offset > size {
        debug!(path = %path.display(), last_offset, size, "log truncated, restarting from zero");
        0
    } else {
        last_offset
    };

    if start == size {
        return Ok(TailResult {
            lines: Vec::new(),
            offset: size,
            eof: true,
        });
    }

    file.seek(SeekFrom::Start(start))?;
    let mut bytes = Vec::with_capacity((size - start) as usize);
    file.take(size - start).read_to_end(&mut bytes)?;
    let read_to = start + bytes.len() as u64;
    let held = incomplete_utf8_suffix(&bytes);
    bytes.truncate(bytes.len() - held);

    Ok(TailResult {
        lines: split_lines(&String::from_utf8_lossy(&bytes)),
        offset: start + bytes.len() as u64,
        eof: read_to >= size,
    })
}

/// Read the last `max_lines` lines of `path` plus the offset they end at.
pub fn read_last_lines(path: &Path, max_lines: usize) -> std::io::Result<(Vec<String>, u64)> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    bytes.truncate(bytes.len() - incomplete_utf8_suffix(&bytes));

    let mut lines = split_lines(&String::from_utf8_lossy(&bytes));
    if lines.len() > max_lines {
        lines.drain(..lines.len() - max_lines);
    }
    Ok((lines, bytes.len() as u64))
}

/// Length of a UTF-8 sequence cut off at the end of `bytes`, or 0.
fn incomplete_utf8_suffix(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let byte = bytes[bytes.len() - back];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let width = match byte {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => 1,
        };
        return if width > back { back } else { 0 };
    }
    0
}

fn split_lines(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = content
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Per-job tail offsets.
#[derive(Debug, Default)]
pub struct LogTailer {
    states: HashMap<String, TailState>,
}

impl LogTailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, job: &str) -> Option<&TailState> {
        self.states.get(job)
    }

    /// Forget the offset for a job; the next tail starts from zero.
    pub fn reset(&mut self, job: &str) {
        self.states.remove(job);
    }

    /// Drop offsets for jobs that are no longer present.
    pub fn retain_jobs<'a>(&mut self, live: impl IntoIterator<Item = &'a str>) {
        let live: std::collections::HashSet<&str> = live.into_iter().collect();
        self.states.retain(|name, _| live.contains(name.as_str()));
    }

    /// Bulk-load the last `max_lines` lines and position the offset after them.
    ///
    /// Subsequent [`LogTailer::tail`] calls return only bytes written after
    /// the prime, so the two never overlap.
    pub fn prime(&mut self, job: &str, job_path: &Path, max_lines: usize) -> Vec<String> {
        let state = self.states.entry(job.to_string()).or_default();
        *state = TailState::default();

        let Some(path) = resolve_log_path(job_path) else {
            return Vec::new();
        };
        match read_last_lines(&path, max_lines) {
            Ok((lines, offset)) => {
                state.path = std::fs::canonicalize(&path).ok().or(Some(path));
                state.offset = offset;
                state.eof = true;
                lines
            }
            Err(e) => {
                debug!(job, path = %path.display(), error = %e, "prime read failed");
                Vec::new()
            }
        }
    }

    /// Return lines appended since the last call for this job.
    ///
    /// A change of the resolved log target (new iteration) restarts from
    /// zero. Read failures return nothing and keep the previous offset.
    pub fn tail(&mut self, job: &str, job_path: &Path) -> Vec<String> {
        let state = self.states.entry(job.to_string()).or_default();

        let Some(path) = resolve_log_path(job_path) else {
            *state = TailState::default();
            return Vec::new();
        };

        let target = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if state.path.as_ref() != Some(&target) {
            if state.path.is_some() {
                debug!(job, target = %target.display(), "log target changed, restarting");
            }
            state.path = Some(target);
            state.offset = 0;
        }

        match tail_file(&path, state.offset) {
            Ok(result) => {
                trace!(job, lines = result.lines.len(), offset = result.offset, "tailed log");
                state.offset = result.offset;
                state.eof = result.eof;
                result.lines
            }
            Err(e) => {
                debug!(job, path = %path.display(), error = %e, "tail read failed");
                Vec::new()
            }
        }
    }
}
