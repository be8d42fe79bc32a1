//! Drawing. Everything here is a pure function of a [`RenderContext`].

use std::path::Path;

use chrono::{DateTime, Utc};
use ralph_core::artifacts::{PhaseDocument, Task};
use ralph_core::history::format_duration;
use ralph_core::types::format_relative_time;
use ralph_core::{JobStatus, JobView, ProjectConfig, TaskStatus};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Gauge, List, ListItem, ListState, Paragraph, Row, Table,
    TableState, Tabs, Wrap,
};

use crate::editor::{ConfigField, EditorState, Role, fields};
use crate::nav::{Modal, NavState};
use crate::refresh::{DetailData, LogBuffer};
use crate::theme::Theme;
use crate::view::{ConfigTab, DetailTab, ListViewMode, Screen, TaskFilter};

/// Everything a frame is drawn from.
pub struct RenderContext<'a> {
    pub nav: &'a NavState,
    pub jobs: &'a [JobView],
    pub jobs_dir: &'a Path,
    pub detail: Option<&'a DetailData>,
    pub logs: Option<&'a LogBuffer>,
    pub now: DateTime<Utc>,
    pub theme: &'a Theme,
}

impl RenderContext<'_> {
    fn focused_view(&self) -> Option<&JobView> {
        let name = self.nav.focused_job.as_deref()?;
        self.jobs.iter().find(|j| j.name == name)
    }

    fn filtered_tasks(&self) -> Vec<(&PhaseDocument, &Task)> {
        self.detail
            .map(|d| d.tasks(self.nav.task_filter))
            .unwrap_or_default()
    }
}

pub fn draw(frame: &mut Frame, ctx: &RenderContext) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Content
            Constraint::Length(2), // Footer
        ])
        .split(area);

    draw_header(frame, chunks[0], ctx);
    match ctx.nav.screen() {
        Screen::ProjectsList => draw_projects_list(frame, chunks[1], ctx),
        Screen::ProjectDetail => draw_project_detail(frame, chunks[1], ctx),
        Screen::ConfigEditor => draw_config_editor(frame, chunks[1], ctx),
    }
    draw_footer(frame, chunks[2], ctx);

    match &ctx.nav.modal {
        Some(Modal::Help) => draw_help_overlay(frame, area, ctx),
        Some(Modal::DeleteConfirm { job }) => draw_delete_confirm(frame, area, ctx, job),
        Some(Modal::FilterDropdown { index }) => draw_filter_dropdown(frame, area, ctx, *index),
        Some(Modal::TaskDetail { index }) => draw_task_detail(frame, area, ctx, *index),
        None => {}
    }
}

fn draw_header(frame: &mut Frame, area: Rect, ctx: &RenderContext) {
    let theme = ctx.theme;
    let mut crumbs: Vec<String> = Vec::new();
    for screen in ctx.nav.stack() {
        match screen {
            Screen::ProjectDetail => crumbs.push(
                ctx.nav
                    .focused_job
                    .clone()
                    .unwrap_or_else(|| screen.title().to_string()),
            ),
            Screen::ConfigEditor => match ctx.nav.editor.as_ref() {
                Some(editor) if editor.is_new() => crumbs.push("New Project".to_string()),
                _ => crumbs.push(screen.title().to_string()),
            },
            Screen::ProjectsList => crumbs.push(screen.title().to_string()),
        }
    }
    let title = format!(" Ralph - {} ", crumbs.join(" › "));

    let mut right = format!("{} jobs", ctx.jobs.len());
    if !ctx.nav.auto_refresh {
        right.push_str("  [paused]");
    }
    let spacing = (area.width as usize).saturating_sub(title.chars().count() + right.chars().count() + 3);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(title, theme.title_style()),
        Span::raw(" ".repeat(spacing)),
        Span::styled(right, Style::default().fg(theme.text_dim)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border_dim)),
    );

    frame.render_widget(header, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, ctx: &RenderContext) {
    let theme = ctx.theme;

    if let Some(message) = &ctx.nav.message {
        let footer = Paragraph::new(Span::styled(
            message.text.clone(),
            Style::default().fg(theme.message_color(message.kind)),
        ))
        .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, area);
        return;
    }

    let hints: &[(&str, &str)] = match ctx.nav.screen() {
        Screen::ProjectsList => &[
            ("[enter]", "Open "),
            ("[space]", "View "),
            ("[n]", "New "),
            ("[d]", "Delete "),
            ("[r]", "Refresh "),
            ("[p]", "Pause "),
            ("[?]", "Help "),
            ("[q]", "Quit"),
        ],
        Screen::ProjectDetail => match ctx.nav.detail_tab {
            DetailTab::Tasks => &[
                ("[1-5]", "Tab "),
                ("[↑↓]", "Select "),
                ("[enter]", "Details "),
                ("[f]", "Filter "),
                ("[esc]", "Back "),
                ("[q]", "Quit"),
            ],
            DetailTab::Logs => &[
                ("[1-5]", "Tab "),
                ("[s]", "Auto-scroll "),
                ("[↑↓]", "Scroll "),
                ("[esc]", "Back "),
                ("[q]", "Quit"),
            ],
            DetailTab::Config => &[
                ("[1-5]", "Tab "),
                ("[e]", "Edit "),
                ("[esc]", "Back "),
                ("[q]", "Quit"),
            ],
            _ => &[
                ("[1-5]", "Tab "),
                ("[←→]", "Switch "),
                ("[esc]", "Back "),
                ("[q]", "Quit"),
            ],
        },
        Screen::ConfigEditor => &[
            ("[tab]", "Next tab "),
            ("[↑↓]", "Field "),
            ("[space]", "Toggle "),
            ("[enter]", "Open/Save "),
            ("[esc]", "Cancel"),
        ],
    };

    let hotkey_style = Style::default().fg(theme.hotkey);
    let spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, label)| [Span::styled(*key, hotkey_style), Span::raw(*label)])
        .collect();

    let footer = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(theme.text_dim))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, area);
}

// ============================================================
// Projects list
// ============================================================

fn stats_line(jobs: &[JobView], theme: &Theme) -> Line<'static> {
    let mut spans = Vec::new();
    for status in JobStatus::ALL {
        let count = jobs.iter().filter(|j| j.status == status).count();
        spans.push(Span::styled(
            format!("{} {count} {status}  ", status.indicator()),
            Style::default().fg(theme.status_color(status)),
        ));
    }
    Line::from(spans)
}

fn iteration_label(job: &JobView) -> String {
    match (job.iteration, job.max_iterations) {
        (Some(i), Some(max)) if max > 0 => format!("iter {i}/{max}"),
        (Some(i), _) => format!("iter {i}"),
        (None, _) => "-".to_string(),
    }
}

fn provider_label(job: &JobView) -> &str {
    job.provider.as_deref().unwrap_or("unknown")
}

fn progress_label(job: &JobView) -> String {
    match &job.task_progress {
        Some(p) => format!("{}/{} {}%", p.completed, p.total, p.percent()),
        None => "-".to_string(),
    }
}

fn job_item<'a>(job: &JobView, mode: ListViewMode, ctx: &RenderContext) -> ListItem<'a> {
    let theme = ctx.theme;
    let status_style = Style::default().fg(theme.status_color(job.status));
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{} ", job.status.indicator()), status_style),
        Span::styled(format!("{:<24} ", job.name), Style::default().fg(theme.text)),
        Span::styled(format!("{:<10} ", job.status.to_string()), status_style),
        Span::raw(format!("{:<12} ", iteration_label(job))),
        Span::raw(format!("{:<14} ", progress_label(job))),
        Span::styled(format!("{:<10} ", provider_label(job)), Style::default().fg(theme.text_dim)),
        Span::styled(
            format_relative_time(job.last_activity, ctx.now),
            Style::default().fg(theme.text_dim),
        ),
    ])];

    if mode == ListViewMode::Expanded {
        let dim = Style::default().fg(theme.text_dim);
        lines.push(Line::from(Span::styled(
            format!("    {}", job.description.as_deref().unwrap_or("No description")),
            dim,
        )));
        let phase = job
            .task_progress
            .as_ref()
            .map(|p| p.current_phase.as_str())
            .unwrap_or("-");
        lines.push(Line::from(Span::styled(
            format!(
                "    model: {}  phase: {}",
                job.model.as_deref().unwrap_or("-"),
                phase
            ),
            dim,
        )));
    }
    ListItem::new(lines)
}

fn draw_projects_list(frame: &mut Frame, area: Rect, ctx: &RenderContext) {
    let theme = ctx.theme;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    frame.render_widget(Paragraph::new(stats_line(ctx.jobs, theme)), chunks[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(true))
        .title(Span::styled(" Projects ", theme.title_style()));

    if ctx.jobs.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(format!("No projects found in {}", ctx.jobs_dir.display())),
            Line::from(""),
            Line::from(Span::styled(
                "Press n to create one.",
                Style::default().fg(theme.text_dim),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: false });
        frame.render_widget(empty, chunks[1]);
        return;
    }

    let items: Vec<ListItem> = ctx
        .jobs
        .iter()
        .map(|job| job_item(job, ctx.nav.list_mode, ctx))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(theme.selected_style())
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(ctx.nav.selected_job));
    frame.render_stateful_widget(list, chunks[1], &mut state);
}

// ============================================================
// Project detail
// ============================================================

fn draw_project_detail(frame: &mut Frame, area: Rect, ctx: &RenderContext) {
    let theme = ctx.theme;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let titles: Vec<String> = DetailTab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| format!("{} {}", i + 1, tab.title()))
        .collect();
    let selected = DetailTab::ALL
        .iter()
        .position(|t| *t == ctx.nav.detail_tab)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL).border_style(theme.border_style(false)))
        .style(Style::default().fg(theme.text_dim))
        .highlight_style(theme.title_style())
        .divider("│");
    frame.render_widget(tabs, chunks[0]);

    let Some(job) = ctx.focused_view() else {
        frame.render_widget(
            Paragraph::new("Project not found").block(Block::default().borders(Borders::ALL)),
            chunks[1],
        );
        return;
    };

    match ctx.nav.detail_tab {
        DetailTab::Overview => draw_overview(frame, chunks[1], ctx, job),
        DetailTab::Tasks => draw_tasks(frame, chunks[1], ctx),
        DetailTab::Logs => draw_logs(frame, chunks[1], ctx),
        DetailTab::History => draw_history(frame, chunks[1], ctx),
        DetailTab::Config => draw_config_summary(frame, chunks[1], ctx, job),
    }
}

fn draw_overview(frame: &mut Frame, area: Rect, ctx: &RenderContext, job: &JobView) {
    let theme = ctx.theme;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(3)])
        .split(area);

    let label = Style::default().fg(theme.text_dim);
    let row = |name: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{name:<14}"), label),
            Span::raw(value),
        ])
    };
    let lines = vec![
        Line::from(vec![
            Span::styled(format!("{:<14}", "Status"), label),
            Span::styled(
                format!("{} {}", job.status.indicator(), job.status),
                Style::default()
                    .fg(theme.status_color(job.status))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        row("Iteration", iteration_label(job)),
        row("Provider", provider_label(job).to_string()),
        row("Model", job.model.clone().unwrap_or_else(|| "-".to_string())),
        row("Last activity", format_relative_time(job.last_activity, ctx.now)),
        row(
            "Phase",
            job.task_progress
                .as_ref()
                .map(|p| p.current_phase.clone())
                .unwrap_or_else(|| "-".to_string()),
        ),
        row(
            "Description",
            job.description.clone().unwrap_or_else(|| "-".to_string()),
        ),
        row("Path", job.path.display().to_string()),
    ];
    let info = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style(true))
                .title(Span::styled(format!(" {} ", job.name), theme.title_style())),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(info, chunks[0]);

    let (percent, text) = match &job.task_progress {
        Some(p) => (p.percent(), format!("{}/{} tasks", p.completed, p.total)),
        None => (0, "no tasks".to_string()),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(theme.status_running))
        .percent(percent)
        .label(text);
    frame.render_widget(gauge, chunks[1]);
}

fn task_glyph(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Completed => "✓",
        TaskStatus::InProgress => "▶",
        TaskStatus::Blocked => "✗",
        TaskStatus::Pending | TaskStatus::Unknown => "·",
    }
}

fn draw_tasks(frame: &mut Frame, area: Rect, ctx: &RenderContext) {
    let theme = ctx.theme;
    let tasks = ctx.filtered_tasks();
    let title = format!(" Tasks [{}] ({}) ", ctx.nav.task_filter.label(), tasks.len());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(true))
        .title(Span::styled(title, theme.title_style()));

    if tasks.is_empty() {
        frame.render_widget(Paragraph::new("No tasks").block(block), area);
        return;
    }

    let items: Vec<ListItem> = tasks
        .iter()
        .map(|(phase, task)| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", task_glyph(task.status)),
                    Style::default().fg(theme.task_color(task.status)),
                ),
                Span::styled(format!("{:<8} ", task.id), Style::default().fg(theme.text_dim)),
                Span::raw(format!("{:<40} ", task.name)),
                Span::styled(
                    format!("P{} {}", phase.phase, phase.name),
                    Style::default().fg(theme.text_dim),
                ),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(theme.selected_style())
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(ctx.nav.selected_task));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Lines visible in a window of `height` rows, `scroll` rows back from the end.
fn visible_log_lines(buffer: &LogBuffer, height: usize, scroll: usize) -> Vec<&String> {
    let total = buffer.len();
    let end = total.saturating_sub(scroll.min(total.saturating_sub(height)));
    let start = end.saturating_sub(height);
    buffer.iter().skip(start).take(end - start).collect()
}

fn draw_logs(frame: &mut Frame, area: Rect, ctx: &RenderContext) {
    let theme = ctx.theme;
    let mode = if ctx.nav.auto_scroll {
        "auto-scroll"
    } else {
        "paused"
    };
    let dropped = ctx.logs.map_or(0, LogBuffer::dropped_count);
    let title = if dropped > 0 {
        format!(" Logs [{mode}] ({dropped} older lines dropped) ")
    } else {
        format!(" Logs [{mode}] ")
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(true))
        .title(Span::styled(title, theme.title_style()));

    let height = area.height.saturating_sub(2) as usize;
    let scroll = if ctx.nav.auto_scroll {
        0
    } else {
        ctx.nav.log_scroll
    };
    let lines: Vec<Line> = match ctx.logs {
        Some(buffer) if !buffer.is_empty() => visible_log_lines(buffer, height, scroll)
            .into_iter()
            .map(|l| Line::from(l.as_str()))
            .collect(),
        _ => vec![Line::from(Span::styled(
            "No log output yet",
            Style::default().fg(theme.text_dim),
        ))],
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_history(frame: &mut Frame, area: Rect, ctx: &RenderContext) {
    let theme = ctx.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(true))
        .title(Span::styled(" History ", theme.title_style()));

    let iterations = ctx.detail.map(|d| d.iterations.as_slice()).unwrap_or_default();
    if iterations.is_empty() {
        frame.render_widget(Paragraph::new("No iterations yet").block(block), area);
        return;
    }

    let rows: Vec<Row> = iterations
        .iter()
        .map(|it| {
            let (result, color) = match it.succeeded() {
                Some(true) => ("ok".to_string(), theme.status_running),
                Some(false) => (
                    format!("exit {}", it.exit_code.unwrap_or_default()),
                    theme.status_blocked,
                ),
                None => ("-".to_string(), theme.text_dim),
            };
            Row::new(vec![
                Cell::from(format!("#{}", it.number)),
                Cell::from(it.duration_secs.map(format_duration).unwrap_or_else(|| "-".to_string())),
                Cell::from(Span::styled(result, Style::default().fg(color))),
                Cell::from(if it.has_readable_log { "yes" } else { "no" }),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(6),
        ],
    )
    .header(
        Row::new(vec!["Iter", "Duration", "Result", "Log"])
            .style(Style::default().fg(theme.text_dim).add_modifier(Modifier::BOLD)),
    )
    .block(block)
    .row_highlight_style(theme.selected_style());
    let mut state = TableState::default().with_selected(Some(ctx.nav.selected_iteration));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_config_summary(frame: &mut Frame, area: Rect, ctx: &RenderContext, job: &JobView) {
    let theme = ctx.theme;
    let lines = vec![
        Line::from(format!("Provider:        {}", provider_label(job))),
        Line::from(format!("Model:           {}", job.model.as_deref().unwrap_or("-"))),
        Line::from(format!(
            "Max iterations:  {}",
            job.max_iterations
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string())
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press enter or e to edit config.json",
            Style::default().fg(theme.hotkey),
        )),
    ];
    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(true))
            .title(Span::styled(" Config ", theme.title_style())),
    );
    frame.render_widget(panel, area);
}

// ============================================================
// Config editor
// ============================================================

fn check(value: bool) -> &'static str {
    if value { "[x]" } else { "[ ]" }
}

fn field_row(field: ConfigField, config: &ProjectConfig) -> (&'static str, String) {
    match field {
        ConfigField::Name => ("Name", config.name.clone()),
        ConfigField::Description => ("Description", config.description.clone()),
        ConfigField::Enabled(role) => ("Enabled", check(role.config(config).is_enabled()).to_string()),
        ConfigField::Backend(role) => (
            "Backend",
            format!("‹ {} ›", role.config(config).backend.display_name()),
        ),
        ConfigField::AuthMode(role) => (
            "Auth mode",
            format!("{} ▾", role.config(config).auth_mode.display_name()),
        ),
        ConfigField::MaxIterations => ("Max iterations", config.max_iterations.to_string()),
        ConfigField::CompletionEnabled => {
            ("Completion check", check(config.completion_enabled).to_string())
        }
        ConfigField::EscalationEnabled => ("Escalation", check(config.escalation.enabled).to_string()),
        ConfigField::SaveButton => ("", "[ Save ]".to_string()),
        ConfigField::CancelButton => ("", "[ Cancel ]".to_string()),
    }
}

fn role_summary(name: &str, role: Role, config: &ProjectConfig) -> Line<'static> {
    let cfg = role.config(config);
    let value = if cfg.is_enabled() {
        format!("{} / {}", cfg.backend.display_name(), cfg.auth_mode.display_name())
    } else {
        "disabled".to_string()
    };
    Line::from(format!("{name:<16}{value}"))
}

fn draw_config_editor(frame: &mut Frame, area: Rect, ctx: &RenderContext) {
    let theme = ctx.theme;
    let Some(editor) = ctx.nav.editor.as_ref() else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let titles: Vec<String> = ConfigTab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| format!("{} {}", i + 1, tab.title()))
        .collect();
    let selected = ConfigTab::ALL
        .iter()
        .position(|t| *t == ctx.nav.config_tab)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL).border_style(theme.border_style(false)))
        .style(Style::default().fg(theme.text_dim))
        .highlight_style(theme.title_style())
        .divider("│");
    frame.render_widget(tabs, chunks[0]);

    let title = if editor.is_new() {
        " New Project ".to_string()
    } else {
        format!(" Edit {} ", editor.job.as_deref().unwrap_or_default())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(true))
        .title(Span::styled(title, theme.title_style()));

    let mut lines = Vec::new();
    if ctx.nav.config_tab == ConfigTab::Summary {
        let config = &editor.config;
        lines.push(Line::from(format!("{:<16}{}", "Name", config.name)));
        lines.push(role_summary("Builder", Role::Builder, config));
        lines.push(role_summary("Reviewer", Role::Reviewer, config));
        lines.push(role_summary("Architect", Role::Architect, config));
        lines.push(Line::from(format!("{:<16}{}", "Max iterations", config.max_iterations)));
        lines.push(Line::from(""));
    }

    let text_focused = ctx.nav.text_field_focused();
    for (i, field) in fields(ctx.nav.config_tab, &editor.config).into_iter().enumerate() {
        let focused = i == ctx.nav.focused_field;
        let (label, mut value) = field_row(field, &editor.config);
        if focused && text_focused {
            value.push('█');
        }
        let marker = if focused { "> " } else { "  " };
        let style = if focused {
            theme.selected_style()
        } else {
            Style::default().fg(theme.text)
        };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(theme.hotkey)),
            Span::styled(format!("{label:<18}"), Style::default().fg(theme.text_dim)),
            Span::styled(value, style),
        ]));
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        chunks[1],
    );

    if ctx.nav.dropdown_open {
        draw_auth_dropdown(frame, chunks[1], ctx, editor);
    }
}

fn draw_auth_dropdown(frame: &mut Frame, area: Rect, ctx: &RenderContext, editor: &EditorState) {
    let Some(ConfigField::AuthMode(role)) = ctx.nav.current_field() else {
        return;
    };
    let cfg = role.config(&editor.config);
    let modes = cfg.backend.auth_modes();
    let items: Vec<ListItem> = modes
        .iter()
        .map(|m| ListItem::new(m.display_name()))
        .collect();

    let height = (modes.len() as u16 + 2).min(area.height);
    let width = 36.min(area.width);
    let dropdown_area = Rect::new(
        area.x + 20.min(area.width.saturating_sub(width)),
        area.y + (ctx.nav.focused_field as u16 + 1).min(area.height.saturating_sub(height)),
        width,
        height,
    );
    frame.render_widget(Clear, dropdown_area);
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme_header(ctx))
                .title(" Auth mode "),
        )
        .highlight_style(ctx.theme.selected_style())
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(cfg.auth_mode_index()));
    frame.render_stateful_widget(list, dropdown_area, &mut state);
}

fn theme_header(ctx: &RenderContext) -> Style {
    Style::default().fg(ctx.theme.header)
}

// ============================================================
// Modals
// ============================================================

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn modal_block<'a>(title: &'a str, ctx: &RenderContext) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme_header(ctx))
        .title(Span::styled(title, ctx.theme.title_style()))
}

fn draw_help_overlay(frame: &mut Frame, area: Rect, ctx: &RenderContext) {
    let overlay = centered_rect(area, 60, 24);
    frame.render_widget(Clear, overlay);

    let help_text = "\
Projects list:
  ↑↓ j k    Select project
  enter     Open project
  space     Compact / expanded view
  n         New project
  d         Delete project

Project detail:
  1-5       Jump to tab
  ←→ h l    Previous / next tab
  f         Filter tasks (tasks tab)
  s         Toggle auto-scroll (logs tab)
  e         Edit config (config tab)

General:
  r         Refresh now
  p         Pause / resume auto-refresh
  esc       Close / back
  ?         Toggle this help
  q         Quit (Ctrl+C always quits)";

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(ctx.theme.text))
        .block(modal_block(" Help ", ctx))
        .wrap(Wrap { trim: false });
    frame.render_widget(help, overlay);
}

fn draw_delete_confirm(frame: &mut Frame, area: Rect, ctx: &RenderContext, job: &str) {
    let overlay = centered_rect(area, 50, 7);
    frame.render_widget(Clear, overlay);

    let text = vec![
        Line::from(format!("Delete project '{job}'?")),
        Line::from(Span::styled(
            "This removes the whole job directory.",
            Style::default().fg(ctx.theme.text_dim),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", Style::default().fg(ctx.theme.status_blocked)),
            Span::raw(" Delete   "),
            Span::styled("[n]", Style::default().fg(ctx.theme.hotkey)),
            Span::raw(" Cancel"),
        ]),
    ];
    let dialog = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(modal_block(" Confirm Delete ", ctx));
    frame.render_widget(dialog, overlay);
}

fn draw_filter_dropdown(frame: &mut Frame, area: Rect, ctx: &RenderContext, index: usize) {
    let overlay = centered_rect(area, 30, TaskFilter::ALL.len() as u16 + 2);
    frame.render_widget(Clear, overlay);

    let items: Vec<ListItem> = TaskFilter::ALL
        .iter()
        .map(|f| {
            let current = if *f == ctx.nav.task_filter { " *" } else { "" };
            ListItem::new(format!("{}{current}", f.label()))
        })
        .collect();
    let list = List::new(items)
        .block(modal_block(" Filter ", ctx))
        .highlight_style(ctx.theme.selected_style())
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(index));
    frame.render_stateful_widget(list, overlay, &mut state);
}

fn draw_task_detail(frame: &mut Frame, area: Rect, ctx: &RenderContext, index: usize) {
    let tasks = ctx.filtered_tasks();
    let Some((phase, task)) = tasks.get(index) else {
        return;
    };
    let overlay = centered_rect(area, 70, 16);
    frame.render_widget(Clear, overlay);

    let dim = Style::default().fg(ctx.theme.text_dim);
    let row = |label: &str, value: String| {
        Line::from(vec![Span::styled(format!("{label:<13}"), dim), Span::raw(value)])
    };
    let mut lines = vec![
        Line::from(Span::styled(task.name.clone(), ctx.theme.title_style())),
        Line::from(""),
        row("ID", task.id.clone()),
        Line::from(vec![
            Span::styled(format!("{:<13}", "Status"), dim),
            Span::styled(
                format!("{} {}", task_glyph(task.status), task.status),
                Style::default().fg(ctx.theme.task_color(task.status)),
            ),
        ]),
        row("Phase", format!("{} {}", phase.phase, phase.name)),
        row("Provider", task.provider.clone().unwrap_or_else(|| "-".to_string())),
        row("Complexity", task.complexity.clone().unwrap_or_else(|| "-".to_string())),
    ];
    if !task.depends_on.is_empty() {
        lines.push(row("Depends on", task.depends_on.join(", ")));
    }
    if let Some(description) = &task.description {
        lines.push(Line::from(""));
        lines.push(Line::from(description.clone()));
    }

    let dialog = Paragraph::new(lines)
        .block(modal_block(" Task ", ctx))
        .wrap(Wrap { trim: false });
    frame.render_widget(dialog, overlay);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AppEvent;
    use crate::nav::{NavContext, NavEvent, reduce};
    use ralph_core::TaskProgress;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    fn test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    fn render(ctx: &RenderContext, width: u16, height: u16) -> Buffer {
        let mut terminal = test_terminal(width, height);
        terminal.draw(|frame| draw(frame, ctx)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn buffer_contains(buffer: &Buffer, text: &str) -> bool {
        buffer_to_string(buffer).contains(text)
    }

    fn buffer_to_string(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut result = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                result.push(buffer[(x, y)].symbol().chars().next().unwrap_or(' '));
            }
            result.push('\n');
        }
        result
    }

    fn sample_jobs() -> Vec<JobView> {
        let mut running = JobView::empty("api-server", "/jobs/api-server");
        running.status = JobStatus::Running;
        running.iteration = Some(3);
        running.max_iterations = Some(50);
        running.provider = Some("claude".into());
        running.description = Some("REST backend".into());
        running.task_progress = TaskProgress::new(4, 6, "Phase 2");

        let mut done = JobView::empty("docs-site", "/jobs/docs-site");
        done.status = JobStatus::Completed;
        vec![running, done]
    }

    fn press(nav: NavState, keys: &[AppEvent], jobs: &[JobView]) -> NavState {
        let ctx = NavContext::new(jobs);
        keys.iter()
            .fold(nav, |nav, key| reduce(nav, NavEvent::Key(*key), &ctx).0)
    }

    fn context<'a>(
        nav: &'a NavState,
        jobs: &'a [JobView],
        theme: &'a Theme,
        logs: Option<&'a LogBuffer>,
    ) -> RenderContext<'a> {
        RenderContext {
            nav,
            jobs,
            jobs_dir: Path::new(".projects"),
            detail: None,
            logs,
            now: Utc::now(),
            theme,
        }
    }

    #[test]
    fn test_empty_list_shows_hint() {
        let nav = NavState::new();
        let theme = Theme::default();
        let buffer = render(&context(&nav, &[], &theme, None), 100, 20);
        assert!(buffer_contains(&buffer, "No projects found in .projects"));
        assert!(buffer_contains(&buffer, "0 jobs"));
    }

    #[test]
    fn test_list_renders_jobs_and_stats() {
        let nav = NavState::new();
        let jobs = sample_jobs();
        let theme = Theme::default();
        let buffer = render(&context(&nav, &jobs, &theme, None), 120, 20);
        assert!(buffer_contains(&buffer, "api-server"));
        assert!(buffer_contains(&buffer, "docs-site"));
        assert!(buffer_contains(&buffer, "iter 3/50"));
        assert!(buffer_contains(&buffer, "4/6 66%"));
        assert!(buffer_contains(&buffer, "1 running"));
        assert!(buffer_contains(&buffer, "1 completed"));
        assert!(!buffer_contains(&buffer, "REST backend"));
    }

    #[test]
    fn test_expanded_list_shows_description() {
        let jobs = sample_jobs();
        let nav = press(NavState::new(), &[AppEvent::Toggle], &jobs);
        let theme = Theme::default();
        let buffer = render(&context(&nav, &jobs, &theme, None), 120, 20);
        assert!(buffer_contains(&buffer, "REST backend"));
        assert!(buffer_contains(&buffer, "phase: Phase 2"));
    }

    #[test]
    fn test_detail_overview() {
        let jobs = sample_jobs();
        let nav = press(NavState::new(), &[AppEvent::Select], &jobs);
        let theme = Theme::default();
        let buffer = render(&context(&nav, &jobs, &theme, None), 120, 30);
        assert!(buffer_contains(&buffer, "Projects › api-server"));
        assert!(buffer_contains(&buffer, "1 Overview"));
        assert!(buffer_contains(&buffer, "5 Config"));
        assert!(buffer_contains(&buffer, "4/6 tasks"));
        assert!(buffer_contains(&buffer, "REST backend"));
    }

    #[test]
    fn test_logs_tab_shows_tail_of_buffer() {
        let jobs = sample_jobs();
        let nav = press(NavState::new(), &[AppEvent::Select, AppEvent::JumpTab(3)], &jobs);
        let mut logs = LogBuffer::new(100);
        logs.extend((1..=40).map(|i| format!("log line {i:02}")));
        let theme = Theme::default();
        let buffer = render(&context(&nav, &jobs, &theme, Some(&logs)), 100, 24);
        assert!(buffer_contains(&buffer, "Logs [auto-scroll]"));
        assert!(buffer_contains(&buffer, "log line 40"));
        assert!(!buffer_contains(&buffer, "log line 01"));
        assert!(!buffer_contains(&buffer, "dropped"));
    }

    #[test]
    fn test_logs_title_counts_evicted_lines() {
        let jobs = sample_jobs();
        let nav = press(NavState::new(), &[AppEvent::Select, AppEvent::JumpTab(3)], &jobs);
        let mut logs = LogBuffer::new(10);
        logs.extend((1..=25).map(|i| format!("log line {i:02}")));
        let theme = Theme::default();
        let buffer = render(&context(&nav, &jobs, &theme, Some(&logs)), 100, 24);
        assert!(buffer_contains(&buffer, "(15 older lines dropped)"));
        assert!(buffer_contains(&buffer, "log line 25"));
    }

    #[test]
    fn test_visible_log_lines_scrolls_back() {
        let mut logs = LogBuffer::new(100);
        logs.extend((1..=10).map(|i| i.to_string()));
        let tail: Vec<&str> = visible_log_lines(&logs, 3, 0).into_iter().map(String::as_str).collect();
        assert_eq!(tail, vec!["8", "9", "10"]);
        let back: Vec<&str> = visible_log_lines(&logs, 3, 2).into_iter().map(String::as_str).collect();
        assert_eq!(back, vec!["6", "7", "8"]);
        let top: Vec<&str> = visible_log_lines(&logs, 3, 99).into_iter().map(String::as_str).collect();
        assert_eq!(top, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_help_overlay_renders() {
        let nav = press(NavState::new(), &[AppEvent::ShowHelp], &[]);
        let theme = Theme::default();
        let buffer = render(&context(&nav, &[], &theme, None), 100, 30);
        assert!(buffer_contains(&buffer, "Help"));
        assert!(buffer_contains(&buffer, "Refresh now"));
    }

    #[test]
    fn test_delete_confirm_names_job() {
        let jobs = sample_jobs();
        let nav = press(NavState::new(), &[AppEvent::Command('d')], &jobs);
        let theme = Theme::default();
        let buffer = render(&context(&nav, &jobs, &theme, None), 100, 24);
        assert!(buffer_contains(&buffer, "Delete project 'api-server'?"));
    }

    #[test]
    fn test_config_editor_renders_fields() {
        let nav = press(NavState::new(), &[AppEvent::Command('n'), AppEvent::JumpTab(2)], &[]);
        let theme = Theme::default();
        let buffer = render(&context(&nav, &[], &theme, None), 100, 24);
        assert!(buffer_contains(&buffer, "New Project"));
        assert!(buffer_contains(&buffer, "Backend"));
        assert!(buffer_contains(&buffer, "Auth mode"));
        assert!(buffer_contains(&buffer, "6 Summary"));
    }

    #[test]
    fn test_summary_tab_shows_buttons() {
        let nav = press(NavState::new(), &[AppEvent::Command('n'), AppEvent::JumpTab(6)], &[]);
        let theme = Theme::default();
        let buffer = render(&context(&nav, &[], &theme, None), 100, 24);
        assert!(buffer_contains(&buffer, "[ Save ]"));
        assert!(buffer_contains(&buffer, "[ Cancel ]"));
        assert!(buffer_contains(&buffer, "disabled"));
    }

    #[test]
    fn test_footer_shows_message() {
        let mut nav = NavState::new();
        nav.message = Some(crate::nav::StatusMessage::error("Failed to delete 'x'"));
        let theme = Theme::default();
        let buffer = render(&context(&nav, &[], &theme, None), 100, 20);
        assert!(buffer_contains(&buffer, "Failed to delete 'x'"));
        assert!(!buffer_contains(&buffer, "[q]"));
    }

    #[test]
    fn test_minimum_terminal_does_not_panic() {
        let jobs = sample_jobs();
        let nav = press(NavState::new(), &[AppEvent::ShowHelp], &jobs);
        let theme = Theme::default();
        render(&context(&nav, &jobs, &theme, None), 20, 8);
    }
}
