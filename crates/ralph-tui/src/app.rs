//! Main application loop for the Ralph TUI.
//!
//! The `App` owns the navigation state and the refresh scheduler. Key
//! presses and refresh ticks are both turned into [`NavEvent`]s and run
//! through [`reduce`]; the effects it returns are executed here, and their
//! outcomes are fed back as further events.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Utc;
use crossterm::event::{self, Event, KeyEvent};
use ralph_core::artifacts::JobLayout;
use ralph_core::project::{create_job, delete_job};
use ralph_core::{DashboardSettings, ProjectConfig};
use ratatui::{Frame, Terminal, backend::CrosstermBackend};
use tracing::{debug, info, warn};

use crate::event::InputHandler;
use crate::nav::{Effect, NavContext, NavEvent, NavState, reduce};
use crate::refresh::{Focus, RefreshScheduler};
use crate::render::{RenderContext, draw};
use crate::theme::Theme;

/// Result type for app operations.
pub type AppResult<T> = anyhow::Result<T>;

/// Longest wait for input before re-checking the refresh schedule.
const MAX_INPUT_WAIT: Duration = Duration::from_millis(250);

pub struct App {
    nav: NavState,
    scheduler: RefreshScheduler,
    input_handler: InputHandler,
    theme: Theme,
    should_quit: bool,
    /// Whether the UI needs a redraw
    dirty: bool,
}

impl App {
    /// Create the app and run the first poll so the list is populated.
    pub fn new(jobs_dir: impl Into<PathBuf>, settings: &DashboardSettings) -> Self {
        let mut app = Self {
            nav: NavState::new(),
            scheduler: RefreshScheduler::new(jobs_dir, settings),
            input_handler: InputHandler::new(),
            theme: Theme::default(),
            should_quit: false,
            dirty: true,
        };
        app.refresh(Instant::now());
        app
    }

    pub fn nav(&self) -> &NavState {
        &self.nav
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run the main application loop.
    pub fn run(&mut self) -> AppResult<()> {
        crossterm::terminal::enable_raw_mode().context("enable raw mode")?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal);

        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        terminal.show_cursor()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> AppResult<()> {
        info!(jobs_dir = %self.scheduler.jobs_dir().display(), "dashboard started");
        while !self.should_quit {
            let now = Instant::now();
            if self.nav.auto_refresh && self.scheduler.is_due(now) {
                self.refresh(now);
            }

            if self.dirty {
                terminal.draw(|frame| self.draw(frame))?;
                self.dirty = false;
            }

            let timeout = if self.nav.auto_refresh {
                self.scheduler
                    .time_until_due(Instant::now())
                    .min(MAX_INPUT_WAIT)
            } else {
                MAX_INPUT_WAIT
            };

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key_event(key),
                    Event::Resize(_, _) => self.dirty = true,
                    _ => {}
                }
            }
        }
        info!("dashboard exiting");
        Ok(())
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        self.input_handler
            .set_text_mode(self.nav.text_field_focused());
        let event = self.input_handler.handle_key(key);
        self.dispatch(NavEvent::Key(event));
    }

    /// Re-poll all jobs and let the reducer react to the new snapshots.
    pub fn refresh(&mut self, now: Instant) {
        let focus = Focus {
            job: self.nav.focused_job.as_deref(),
            tail_logs: self.nav.wants_log_tail(),
        };
        self.scheduler.tick(focus, now);
        self.dispatch(NavEvent::Tick);
    }

    /// Run an event through the reducer, then execute resulting effects
    /// until none remain.
    pub fn dispatch(&mut self, event: NavEvent) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let nav = std::mem::take(&mut self.nav);
            let (nav, effects) = {
                let ctx = self.nav_context(&nav);
                reduce(nav, event, &ctx)
            };
            self.nav = nav;
            self.dirty = true;

            for effect in effects {
                if let Some(next) = self.execute(effect) {
                    queue.push_back(next);
                }
            }
        }
    }

    fn nav_context<'a>(&'a self, nav: &NavState) -> NavContext<'a> {
        let mut ctx = NavContext::new(self.scheduler.jobs());
        if let Some(detail) = self.scheduler.detail() {
            if nav.focused_job.as_deref() == Some(detail.job.as_str()) {
                ctx.task_count = detail.tasks(nav.task_filter).len();
                ctx.iteration_count = detail.iterations.len();
            }
        }
        ctx
    }

    fn execute(&mut self, effect: Effect) -> Option<NavEvent> {
        debug!(?effect, "executing effect");
        match effect {
            Effect::Quit => {
                self.should_quit = true;
                None
            }
            Effect::Refresh => {
                let focus = Focus {
                    job: self.nav.focused_job.as_deref(),
                    tail_logs: self.nav.wants_log_tail(),
                };
                self.scheduler.tick(focus, Instant::now());
                Some(NavEvent::Tick)
            }
            Effect::PrimeLogs { job } => {
                self.scheduler.select_job(&job);
                None
            }
            Effect::DeleteJob { job } => {
                let result = delete_job(self.scheduler.jobs_dir(), &job).map_err(|e| {
                    warn!(job = %job, error = %e, "delete failed");
                    e.to_string()
                });
                Some(NavEvent::JobDeleted { job, result })
            }
            Effect::LoadConfig { job } => {
                let path = JobLayout::new(self.scheduler.jobs_dir().join(&job)).config_file();
                let result = ProjectConfig::load(&path).map_err(|e| e.to_string());
                Some(NavEvent::ConfigLoaded { job, result })
            }
            Effect::SaveConfig { job, config } => {
                let result = self.save_config(job, &config);
                if let Err(e) = &result {
                    warn!(error = %e, "saving config failed");
                }
                Some(NavEvent::ConfigSaved { result })
            }
        }
    }

    fn save_config(&self, job: Option<String>, config: &ProjectConfig) -> Result<String, String> {
        let jobs_dir = self.scheduler.jobs_dir();
        match job {
            Some(job) => {
                let path = JobLayout::new(jobs_dir.join(&job)).config_file();
                config.save(&path).map_err(|e| e.to_string())?;
                info!(job = %job, "config saved");
                Ok(job)
            }
            None => {
                let dir = create_job(jobs_dir, config).map_err(|e| e.to_string())?;
                Ok(dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| config.name.clone()))
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let logs = self
            .nav
            .focused_job
            .as_deref()
            .and_then(|job| self.scheduler.log_buffer(job));
        let ctx = RenderContext {
            nav: &self.nav,
            jobs: self.scheduler.jobs(),
            jobs_dir: self.scheduler.jobs_dir(),
            detail: self.scheduler.detail(),
            logs,
            now: Utc::now(),
            theme: &self.theme,
        };
        draw(frame, &ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Screen;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;
    use std::fs;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn create_test_job(jobs_dir: &std::path::Path, name: &str) {
        let logs = jobs_dir.join(name).join("logs");
        fs::create_dir_all(&logs).unwrap();
        fs::write(
            logs.join("status.json"),
            r#"{"iteration": 2, "status": "running", "project": "sonnet", "cli": "claude"}"#,
        )
        .unwrap();
        fs::write(logs.join("current.readable"), "hello\nworld\n").unwrap();
    }

    fn test_app(temp: &TempDir) -> App {
        ralph_core::logging::init_test_logging();
        App::new(temp.path(), &DashboardSettings::default())
    }

    #[test]
    fn test_app_lists_jobs_on_start() {
        let temp = TempDir::new().unwrap();
        create_test_job(temp.path(), "alpha");
        let app = test_app(&temp);
        assert_eq!(app.scheduler().jobs().len(), 1);
        assert_eq!(app.nav().screen(), Screen::ProjectsList);
    }

    #[test]
    fn test_select_primes_logs() {
        let temp = TempDir::new().unwrap();
        create_test_job(temp.path(), "alpha");
        let mut app = test_app(&temp);

        app.handle_key_event(key(KeyCode::Enter));
        assert_eq!(app.nav().screen(), Screen::ProjectDetail);
        let lines: Vec<&String> = app
            .scheduler()
            .log_buffer("alpha")
            .map(|b| b.iter().collect())
            .unwrap_or_default();
        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[test]
    fn test_delete_job_flow() {
        let temp = TempDir::new().unwrap();
        create_test_job(temp.path(), "alpha");
        let mut app = test_app(&temp);

        app.handle_key_event(key(KeyCode::Char('d')));
        app.handle_key_event(key(KeyCode::Char('y')));

        assert!(!temp.path().join("alpha").exists());
        assert!(app.scheduler().jobs().is_empty());
        let message = app.nav().message.as_ref().map(|m| m.text.clone());
        assert_eq!(message.as_deref(), Some("Deleted project 'alpha'"));
    }

    #[test]
    fn test_new_project_saved_to_disk() {
        let temp = TempDir::new().unwrap();
        let mut app = test_app(&temp);

        app.handle_key_event(key(KeyCode::Char('n')));
        assert!(app.nav().text_field_focused());
        // Digits typed into the name field stay in the field.
        app.handle_key_event(key(KeyCode::Char('2')));
        for _ in 0..5 {
            app.handle_key_event(key(KeyCode::Tab));
        }
        app.handle_key_event(key(KeyCode::Enter));

        let config = temp.path().join("new-project2").join("config.json");
        assert!(config.exists());
        assert_eq!(app.nav().screen(), Screen::ProjectsList);
        assert_eq!(app.scheduler().jobs().len(), 1);
    }

    #[test]
    fn test_edit_existing_config() {
        let temp = TempDir::new().unwrap();
        create_test_job(temp.path(), "alpha");
        let config_path = temp.path().join("alpha").join("config.json");
        ProjectConfig::new("alpha").save(&config_path).unwrap();
        let mut app = test_app(&temp);

        app.handle_key_event(key(KeyCode::Enter));
        app.handle_key_event(key(KeyCode::Char('5')));
        app.handle_key_event(key(KeyCode::Char('e')));
        assert_eq!(app.nav().screen(), Screen::ConfigEditor);

        // Tab over to Loop, clear max iterations and type 7.
        for _ in 0..4 {
            app.handle_key_event(key(KeyCode::Tab));
        }
        for _ in 0..6 {
            app.handle_key_event(key(KeyCode::Backspace));
        }
        app.handle_key_event(key(KeyCode::Char('7')));
        app.handle_key_event(key(KeyCode::Tab));
        app.handle_key_event(key(KeyCode::Enter));

        assert_eq!(app.nav().screen(), Screen::ProjectDetail);
        let saved = ProjectConfig::load(&config_path).unwrap();
        assert_eq!(saved.max_iterations, 7);
    }

    #[test]
    fn test_missing_config_reports_error() {
        let temp = TempDir::new().unwrap();
        create_test_job(temp.path(), "alpha");
        let mut app = test_app(&temp);

        app.handle_key_event(key(KeyCode::Enter));
        app.handle_key_event(key(KeyCode::Char('5')));
        app.handle_key_event(key(KeyCode::Enter));
        assert_eq!(app.nav().screen(), Screen::ProjectDetail);
        assert!(app.nav().message.is_some());
    }

    #[test]
    fn test_quit() {
        let temp = TempDir::new().unwrap();
        let mut app = test_app(&temp);
        app.handle_key_event(key(KeyCode::Char('q')));
        assert!(app.should_quit());
    }

    #[test]
    fn test_draw_renders_job() {
        let temp = TempDir::new().unwrap();
        create_test_job(temp.path(), "alpha");
        let app = test_app(&temp);
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let content: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(content.contains("alpha"));
        assert!(content.contains("running"));
    }
}
