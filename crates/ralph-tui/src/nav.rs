//! Navigation state machine.
//!
//! [`reduce`] is a pure function from the current [`NavState`], one
//! [`NavEvent`] and a read-only [`NavContext`] to the next state plus a list
//! of [`Effect`]s for the app loop to perform. Keys, refresh ticks and the
//! outcomes of effects all flow through it the same way.
//!
//! Structural guarantees:
//! - the navigation stack is never empty and its top is the current screen
//! - at most one modal is open (`modal` is a single `Option`)
//! - while a modal is open, screen key handling is suspended

use ralph_core::project::slugify;
use ralph_core::{JobView, ProjectConfig};

use crate::editor::{ConfigField, EditorState, field_at, field_count};
use crate::event::AppEvent;
use crate::view::{ConfigTab, DetailTab, ListViewMode, Screen, TaskFilter};

/// Overlays drawn above the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Help,
    /// Waiting for `y`/enter or `n`/escape
    DeleteConfirm { job: String },
    /// Status filter picker on the tasks tab; `index` into [`TaskFilter::ALL`]
    FilterDropdown { index: usize },
    /// Details of one task; `index` into the filtered task list
    TaskDetail { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

/// Transient feedback line. Cleared on the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: MessageKind,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: MessageKind::Info,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: MessageKind::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: MessageKind::Error,
        }
    }
}

/// Read-only data the reducer needs to clamp selections.
#[derive(Debug, Clone, Copy)]
pub struct NavContext<'a> {
    /// Current job snapshots in list order
    pub jobs: &'a [JobView],
    /// Tasks visible under the current filter for the focused job
    pub task_count: usize,
    /// Iterations listed for the focused job
    pub iteration_count: usize,
}

impl<'a> NavContext<'a> {
    pub fn new(jobs: &'a [JobView]) -> Self {
        Self {
            jobs,
            task_count: 0,
            iteration_count: 0,
        }
    }
}

/// Inputs to the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    Key(AppEvent),
    /// A refresh finished; `NavContext` holds the new snapshots
    Tick,
    JobDeleted {
        job: String,
        result: Result<(), String>,
    },
    ConfigLoaded {
        job: String,
        result: Result<ProjectConfig, String>,
    },
    /// `Ok` carries the job directory name that was written
    ConfigSaved { result: Result<String, String> },
}

/// Side effects requested by the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Quit,
    /// Poll immediately instead of waiting for the next interval
    Refresh,
    /// Reset the job's log buffer and tail offset, then prime from disk
    PrimeLogs { job: String },
    DeleteJob { job: String },
    LoadConfig { job: String },
    /// `job` is `None` for a new project
    SaveConfig {
        job: Option<String>,
        config: ProjectConfig,
    },
}

/// All UI navigation state.
#[derive(Debug, Clone, PartialEq)]
pub struct NavState {
    stack: Vec<Screen>,
    pub detail_tab: DetailTab,
    pub config_tab: ConfigTab,
    pub focused_field: usize,
    pub dropdown_open: bool,
    pub modal: Option<Modal>,
    /// Index into the projects list
    pub selected_job: usize,
    /// Job shown on the detail screen
    pub focused_job: Option<String>,
    pub selected_task: usize,
    pub selected_iteration: usize,
    pub task_filter: TaskFilter,
    pub list_mode: ListViewMode,
    pub auto_scroll: bool,
    /// Lines scrolled back from the end of the log while auto-scroll is off
    pub log_scroll: usize,
    pub auto_refresh: bool,
    pub message: Option<StatusMessage>,
    pub editor: Option<EditorState>,
}

impl Default for NavState {
    fn default() -> Self {
        Self::new()
    }
}

impl NavState {
    pub fn new() -> Self {
        Self {
            stack: vec![Screen::ProjectsList],
            detail_tab: DetailTab::Overview,
            config_tab: ConfigTab::Project,
            focused_field: 0,
            dropdown_open: false,
            modal: None,
            selected_job: 0,
            focused_job: None,
            selected_task: 0,
            selected_iteration: 0,
            task_filter: TaskFilter::All,
            list_mode: ListViewMode::Compact,
            auto_scroll: true,
            log_scroll: 0,
            auto_refresh: true,
            message: None,
            editor: None,
        }
    }

    /// Current screen (top of the stack).
    pub fn screen(&self) -> Screen {
        self.stack.last().copied().unwrap_or_default()
    }

    pub fn stack(&self) -> &[Screen] {
        &self.stack
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    fn push(&mut self, screen: Screen) {
        self.stack.push(screen);
    }

    /// Pop one screen. A single-element stack is left alone.
    fn pop(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        self.stack.pop();
        if self.screen() == Screen::ProjectsList {
            self.focused_job = None;
        }
        true
    }

    fn pop_to_root(&mut self) {
        while self.pop() {}
    }

    /// Whether typed characters should go to a text field.
    pub fn text_field_focused(&self) -> bool {
        self.current_field().is_some_and(|f| f.is_text())
            && self.modal.is_none()
            && !self.dropdown_open
    }

    /// Focused config editor field, if the editor is showing.
    pub fn current_field(&self) -> Option<ConfigField> {
        if self.screen() != Screen::ConfigEditor {
            return None;
        }
        let editor = self.editor.as_ref()?;
        field_at(self.config_tab, self.focused_field, &editor.config)
    }

    /// Detail screen is on the logs tab. Open modals do not pause tailing.
    pub fn wants_log_tail(&self) -> bool {
        self.screen() == Screen::ProjectDetail && self.detail_tab == DetailTab::Logs
    }

    fn set_detail_tab(&mut self, tab: DetailTab) {
        self.detail_tab = tab;
    }

    fn set_config_tab(&mut self, tab: ConfigTab) {
        self.config_tab = tab;
        self.focused_field = 0;
        self.dropdown_open = false;
    }

    fn close_editor(&mut self) {
        self.editor = None;
        self.focused_field = 0;
        self.dropdown_open = false;
        self.config_tab = ConfigTab::Project;
        self.pop();
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

/// Apply one event.
pub fn reduce(mut state: NavState, event: NavEvent, ctx: &NavContext<'_>) -> (NavState, Vec<Effect>) {
    let mut effects = Vec::new();
    match event {
        NavEvent::Key(key) => reduce_key(&mut state, key, ctx, &mut effects),
        NavEvent::Tick => reduce_tick(&mut state, ctx),
        NavEvent::JobDeleted { job, result } => match result {
            Ok(()) => {
                state.message = Some(StatusMessage::success(format!("Deleted project '{job}'")));
                effects.push(Effect::Refresh);
            }
            Err(e) => {
                state.message = Some(StatusMessage::error(format!("Failed to delete '{job}': {e}")));
            }
        },
        NavEvent::ConfigLoaded { job, result } => match result {
            Ok(config) => {
                if state.screen() == Screen::ProjectDetail {
                    state.editor = Some(EditorState::editing(job, config));
                    state.set_config_tab(ConfigTab::Project);
                    state.push(Screen::ConfigEditor);
                }
            }
            Err(e) => {
                state.message = Some(StatusMessage::error(format!(
                    "Cannot load config for '{job}': {e}"
                )));
            }
        },
        NavEvent::ConfigSaved { result } => match result {
            Ok(job) => {
                state.message = Some(StatusMessage::success(format!("Saved project '{job}'")));
                if state.screen() == Screen::ConfigEditor {
                    state.close_editor();
                }
                effects.push(Effect::Refresh);
            }
            Err(e) => {
                state.message = Some(StatusMessage::error(format!("Save failed: {e}")));
            }
        },
    }
    (state, effects)
}

fn reduce_tick(state: &mut NavState, ctx: &NavContext<'_>) {
    state.selected_job = clamp_index(state.selected_job, ctx.jobs.len());

    if state.screen() == Screen::ProjectDetail {
        let vanished = match &state.focused_job {
            Some(name) => !ctx.jobs.iter().any(|j| &j.name == name),
            None => true,
        };
        if vanished {
            state.modal = None;
            state.pop_to_root();
            return;
        }
    }

    state.selected_task = clamp_index(state.selected_task, ctx.task_count);
    state.selected_iteration = clamp_index(state.selected_iteration, ctx.iteration_count);
    if let Some(Modal::TaskDetail { index }) = state.modal {
        if index >= ctx.task_count {
            state.modal = None;
        }
    }
}

fn reduce_key(state: &mut NavState, key: AppEvent, ctx: &NavContext<'_>, effects: &mut Vec<Effect>) {
    if key == AppEvent::None {
        return;
    }
    state.message = None;

    if key == AppEvent::ForceQuit {
        effects.push(Effect::Quit);
        return;
    }

    if let Some(modal) = state.modal.take() {
        state.modal = reduce_modal(state, modal, key, effects);
        return;
    }

    match key {
        AppEvent::Quit => {
            if !state.dropdown_open {
                effects.push(Effect::Quit);
            }
            return;
        }
        AppEvent::Cancel => {
            cancel(state);
            return;
        }
        AppEvent::ShowHelp => {
            state.modal = Some(Modal::Help);
            return;
        }
        AppEvent::Refresh => {
            effects.push(Effect::Refresh);
            return;
        }
        AppEvent::Command('p') => {
            state.auto_refresh = !state.auto_refresh;
            let text = if state.auto_refresh {
                "Auto-refresh on"
            } else {
                "Auto-refresh paused"
            };
            state.message = Some(StatusMessage::info(text));
            return;
        }
        _ => {}
    }

    match state.screen() {
        Screen::ProjectsList => reduce_projects_list(state, key, ctx, effects),
        Screen::ProjectDetail => reduce_project_detail(state, key, ctx, effects),
        Screen::ConfigEditor => reduce_config_editor(state, key, effects),
    }
}

/// Returns the modal to keep open, if any.
fn reduce_modal(
    state: &mut NavState,
    modal: Modal,
    key: AppEvent,
    effects: &mut Vec<Effect>,
) -> Option<Modal> {
    match modal {
        Modal::Help => match key {
            AppEvent::Cancel | AppEvent::ShowHelp | AppEvent::Select => None,
            _ => Some(Modal::Help),
        },
        Modal::DeleteConfirm { job } => match key {
            AppEvent::Command('y') | AppEvent::Command('Y') | AppEvent::Select => {
                effects.push(Effect::DeleteJob { job });
                None
            }
            AppEvent::Command('n') | AppEvent::Command('N') | AppEvent::Cancel => None,
            _ => Some(Modal::DeleteConfirm { job }),
        },
        Modal::FilterDropdown { index } => match key {
            AppEvent::NavigateUp => Some(Modal::FilterDropdown {
                index: index.saturating_sub(1),
            }),
            AppEvent::NavigateDown => Some(Modal::FilterDropdown {
                index: clamp_index(index + 1, TaskFilter::ALL.len()),
            }),
            AppEvent::Select | AppEvent::Command('f') => {
                state.task_filter = TaskFilter::ALL[clamp_index(index, TaskFilter::ALL.len())];
                state.selected_task = 0;
                None
            }
            AppEvent::Cancel => None,
            _ => Some(Modal::FilterDropdown { index }),
        },
        Modal::TaskDetail { index } => match key {
            AppEvent::Cancel | AppEvent::Select => None,
            _ => Some(Modal::TaskDetail { index }),
        },
    }
}

fn cancel(state: &mut NavState) {
    if state.dropdown_open {
        state.dropdown_open = false;
        return;
    }
    match state.screen() {
        Screen::ConfigEditor => state.close_editor(),
        _ => {
            state.pop();
        }
    }
}

fn reduce_projects_list(
    state: &mut NavState,
    key: AppEvent,
    ctx: &NavContext<'_>,
    effects: &mut Vec<Effect>,
) {
    match key {
        AppEvent::NavigateUp => state.selected_job = state.selected_job.saturating_sub(1),
        AppEvent::NavigateDown => {
            state.selected_job = clamp_index(state.selected_job + 1, ctx.jobs.len());
        }
        AppEvent::Select => {
            if let Some(job) = ctx.jobs.get(state.selected_job) {
                state.focused_job = Some(job.name.clone());
                state.push(Screen::ProjectDetail);
                state.set_detail_tab(DetailTab::Overview);
                state.selected_task = 0;
                state.selected_iteration = 0;
                state.task_filter = TaskFilter::All;
                state.log_scroll = 0;
                effects.push(Effect::PrimeLogs {
                    job: job.name.clone(),
                });
            }
        }
        AppEvent::Toggle => state.list_mode = state.list_mode.toggle(),
        AppEvent::Command('d') => {
            if let Some(job) = ctx.jobs.get(state.selected_job) {
                state.modal = Some(Modal::DeleteConfirm {
                    job: job.name.clone(),
                });
            }
        }
        AppEvent::Command('n') => {
            state.editor = Some(EditorState::new_project());
            state.set_config_tab(ConfigTab::Project);
            state.push(Screen::ConfigEditor);
        }
        _ => {}
    }
}

fn reduce_project_detail(
    state: &mut NavState,
    key: AppEvent,
    ctx: &NavContext<'_>,
    effects: &mut Vec<Effect>,
) {
    let tab = state.detail_tab;
    match key {
        AppEvent::JumpTab(n) => {
            if let Some(tab) = DetailTab::from_number(n) {
                state.set_detail_tab(tab);
            }
        }
        AppEvent::NavigateLeft | AppEvent::PrevTab => state.set_detail_tab(tab.prev()),
        AppEvent::NavigateRight | AppEvent::NextTab => state.set_detail_tab(tab.next()),
        AppEvent::NavigateUp => match tab {
            DetailTab::Tasks => state.selected_task = state.selected_task.saturating_sub(1),
            DetailTab::History => {
                state.selected_iteration = state.selected_iteration.saturating_sub(1);
            }
            DetailTab::Logs if !state.auto_scroll => state.log_scroll += 1,
            _ => {}
        },
        AppEvent::NavigateDown => match tab {
            DetailTab::Tasks => {
                state.selected_task = clamp_index(state.selected_task + 1, ctx.task_count);
            }
            DetailTab::History => {
                state.selected_iteration =
                    clamp_index(state.selected_iteration + 1, ctx.iteration_count);
            }
            DetailTab::Logs if !state.auto_scroll => {
                state.log_scroll = state.log_scroll.saturating_sub(1);
            }
            _ => {}
        },
        AppEvent::Select => match tab {
            DetailTab::Tasks if ctx.task_count > 0 => {
                state.modal = Some(Modal::TaskDetail {
                    index: clamp_index(state.selected_task, ctx.task_count),
                });
            }
            DetailTab::Config => request_config(state, effects),
            _ => {}
        },
        AppEvent::Command('e') if tab == DetailTab::Config => request_config(state, effects),
        AppEvent::Command('f') if tab == DetailTab::Tasks => {
            state.modal = Some(Modal::FilterDropdown {
                index: state.task_filter.index(),
            });
        }
        AppEvent::Command('s') if tab == DetailTab::Logs => {
            state.auto_scroll = !state.auto_scroll;
            state.log_scroll = 0;
        }
        _ => {}
    }
}

fn request_config(state: &NavState, effects: &mut Vec<Effect>) {
    if let Some(job) = &state.focused_job {
        effects.push(Effect::LoadConfig { job: job.clone() });
    }
}

fn reduce_config_editor(state: &mut NavState, key: AppEvent, effects: &mut Vec<Effect>) {
    let tab = state.config_tab;
    let focused = state.focused_field;
    let Some(editor) = state.editor.as_mut() else {
        // Editor screen without a draft has nothing to show.
        state.pop();
        return;
    };
    let field = field_at(tab, focused, &editor.config);

    if state.dropdown_open {
        match (key, field) {
            (AppEvent::NavigateUp, Some(ConfigField::AuthMode(role))) => {
                editor.step_auth_mode(role, false);
            }
            (AppEvent::NavigateDown, Some(ConfigField::AuthMode(role))) => {
                editor.step_auth_mode(role, true);
            }
            (AppEvent::Select, _) => state.dropdown_open = false,
            _ => {}
        }
        return;
    }

    match key {
        AppEvent::JumpTab(n) => {
            if let Some(tab) = ConfigTab::from_number(n) {
                state.set_config_tab(tab);
            }
        }
        AppEvent::NextTab | AppEvent::NavigateRight => state.set_config_tab(tab.next()),
        AppEvent::PrevTab | AppEvent::NavigateLeft => state.set_config_tab(tab.prev()),
        AppEvent::Command('s') => state.set_config_tab(ConfigTab::Summary),
        AppEvent::NavigateUp => state.focused_field = focused.saturating_sub(1),
        AppEvent::NavigateDown => {
            state.focused_field = clamp_index(focused + 1, field_count(tab, &editor.config));
        }
        AppEvent::Toggle => {
            if let Some(field) = field {
                editor.toggle(field);
                state.focused_field = clamp_index(focused, field_count(tab, &editor.config));
            }
        }
        AppEvent::Select => match field {
            Some(f) if f.is_dropdown() => state.dropdown_open = true,
            Some(ConfigField::SaveButton) => {
                if slugify(&editor.config.name).is_empty() {
                    state.message = Some(StatusMessage::error("Project name is required"));
                } else {
                    effects.push(Effect::SaveConfig {
                        job: editor.job.clone(),
                        config: editor.config.clone(),
                    });
                }
            }
            Some(ConfigField::CancelButton) => state.close_editor(),
            _ => {}
        },
        AppEvent::TextInput(c) => {
            if let Some(field) = field.filter(ConfigField::is_text) {
                editor.input_char(field, c);
            }
        }
        AppEvent::Backspace => {
            if let Some(field) = field.filter(ConfigField::is_text) {
                editor.backspace(field);
            }
        }
        _ => {}
    }
}
