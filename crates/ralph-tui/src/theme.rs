//! Color palette for the dashboard.

use ralph_core::{JobStatus, TaskStatus};
use ratatui::style::{Color, Modifier, Style};

use crate::nav::MessageKind;

#[derive(Debug, Clone)]
pub struct Theme {
    /// Headers, titles and focused borders
    pub header: Color,
    /// Hotkey hints
    pub hotkey: Color,
    pub text: Color,
    /// Timestamps and secondary info
    pub text_dim: Color,
    pub border_dim: Color,
    /// Background of the selected row
    pub selection: Color,
    pub status_running: Color,
    pub status_completed: Color,
    pub status_blocked: Color,
    pub status_idle: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header: Color::Cyan,
            hotkey: Color::Yellow,
            text: Color::White,
            text_dim: Color::Gray,
            border_dim: Color::DarkGray,
            selection: Color::Rgb(40, 40, 60),
            status_running: Color::Green,
            status_completed: Color::Blue,
            status_blocked: Color::Red,
            status_idle: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn status_color(&self, status: JobStatus) -> Color {
        match status {
            JobStatus::Running => self.status_running,
            JobStatus::Completed => self.status_completed,
            JobStatus::Blocked => self.status_blocked,
            JobStatus::Idle => self.status_idle,
        }
    }

    pub fn task_color(&self, status: TaskStatus) -> Color {
        match status {
            TaskStatus::Completed => self.status_completed,
            TaskStatus::InProgress => self.status_running,
            TaskStatus::Blocked => self.status_blocked,
            TaskStatus::Pending | TaskStatus::Unknown => self.text_dim,
        }
    }

    pub fn message_color(&self, kind: MessageKind) -> Color {
        match kind {
            MessageKind::Info => self.header,
            MessageKind::Success => self.status_running,
            MessageKind::Error => self.status_blocked,
        }
    }

    pub fn title_style(&self) -> Style {
        Style::default().fg(self.header).add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.header)
        } else {
            Style::default().fg(self.border_dim)
        }
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .bg(self.selection)
            .fg(self.text)
            .add_modifier(Modifier::BOLD)
    }
}
