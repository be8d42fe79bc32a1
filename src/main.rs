//! Ralph - background job dashboard
//!
//! A terminal dashboard that watches a directory of long-running Ralph jobs
//! and shows their status, task progress, logs and iteration history.
//!
//! ## Usage
//!
//! ```bash
//! # Watch ./.projects
//! ralph
//!
//! # Watch another jobs directory, polling every second
//! ralph --jobs-dir ~/work/jobs --refresh-ms 1000
//!
//! # With verbose logging to a custom directory
//! ralph -v --log-dir /tmp/ralph-logs
//! ```

use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ralph_core::{DashboardSettings, LogGuard, RalphError, init_logging};
use ralph_tui::App;
use tracing::{error, info};

/// Ralph job dashboard
///
/// Reads the status files, task documents and logs that Ralph jobs write
/// to disk and presents them as a navigable terminal UI.
#[derive(Parser, Debug)]
#[command(name = "ralph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing one subdirectory per job (defaults to ./.projects)
    #[arg(long)]
    jobs_dir: Option<PathBuf>,

    /// Dashboard settings file (defaults to ~/.ralph/dashboard.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for log files (defaults to ~/.ralph/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Poll interval in milliseconds
    #[arg(long)]
    refresh_ms: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::from(1);
        }
    };

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid dashboard settings: {e}");
            eprintln!("Error: {e}");
            if let Some(hint) = e.guidance() {
                eprintln!("{hint}");
            }
            return ExitCode::from(2);
        }
    };

    let jobs_dir = match &cli.jobs_dir {
        Some(dir) => dir.clone(),
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            settings.resolve_jobs_dir(&cwd)
        }
    };

    install_panic_hook();

    info!(jobs_dir = %jobs_dir.display(), "Starting Ralph dashboard");

    let mut app = App::new(jobs_dir, &settings);
    match app.run() {
        Ok(()) => {
            info!("Ralph dashboard exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Ralph dashboard error: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Load settings from disk and apply command-line overrides.
fn load_settings(cli: &Cli) -> ralph_core::Result<DashboardSettings> {
    let mut settings = DashboardSettings::load(cli.config.as_deref())?;
    if let Some(ms) = cli.refresh_ms {
        settings.refresh_interval_ms = ms;
    }
    settings
        .validate()
        .map_err(|message| RalphError::ConfigInvalid {
            path: PathBuf::from("--refresh-ms"),
            message,
        })?;
    Ok(settings)
}

/// Install a panic hook that restores the terminal before printing the panic message.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Restore terminal to its normal state.
fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    let _ = crossterm::terminal::disable_raw_mode();
    crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen)?;
    crossterm::execute!(stdout, crossterm::cursor::Show)?;
    stdout.flush()?;

    Ok(())
}

fn setup_logging(cli: &Cli) -> ralph_core::Result<LogGuard> {
    init_logging(cli.log_dir.clone(), cli.verbose > 0)
}
