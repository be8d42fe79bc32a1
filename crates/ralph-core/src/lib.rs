//! # ralph-core
//!
//! Filesystem side of the Ralph job dashboard.
//!
//! This crate provides:
//! - [`StatusAggregator`] - reconciles a job's status artifacts into a [`JobView`]
//! - [`LogTailer`] - incremental, truncation-safe log tailing per job
//! - [`history`] - iteration directory listing
//! - [`config`] / [`project`] - `config.json` model and job directory operations
//! - [`DashboardSettings`] - dashboard settings file
//! - [`RalphError`] and [`logging`] - errors and tracing setup
//!
//! ## Example
//!
//! ```no_run
//! use ralph_core::{LogTailer, StatusAggregator};
//!
//! let aggregator = StatusAggregator::new(".projects");
//! let mut tailer = LogTailer::new();
//! for job in aggregator.compute_all() {
//!     let lines = tailer.tail(&job.name, &job.path);
//!     println!("{} [{}] +{} lines", job.name, job.status, lines.len());
//! }
//! ```

pub mod artifacts;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod project;
pub mod settings;
pub mod status;
pub mod tail;
pub mod types;

pub use config::{AuthMode, Backend, ProjectConfig, RoleConfig};
pub use error::{RalphError, Result};
pub use history::IterationInfo;
pub use logging::{LogGuard, init_logging};
pub use settings::DashboardSettings;
pub use status::{StatusAggregator, compute_job_view};
pub use tail::{LogTailer, TailResult, TailState};
pub use types::{JobStatus, JobView, TaskProgress, TaskStatus};
