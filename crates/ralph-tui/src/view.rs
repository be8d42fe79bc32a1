//! Screens, tabs and list modes for the Ralph dashboard.

use std::fmt;

use ralph_core::TaskStatus;

/// Top-level screens. The navigation stack holds these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// All jobs under the jobs directory
    #[default]
    ProjectsList,
    /// One job, with tabs
    ProjectDetail,
    /// Create or edit a job's `config.json`
    ConfigEditor,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::ProjectsList => "Projects",
            Screen::ProjectDetail => "Project",
            Screen::ConfigEditor => "Config Editor",
        }
    }
}

/// Tabs on the project detail screen. Cycling wraps around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Overview,
    Tasks,
    Logs,
    History,
    Config,
}

impl DetailTab {
    pub const ALL: [DetailTab; 5] = [
        DetailTab::Overview,
        DetailTab::Tasks,
        DetailTab::Logs,
        DetailTab::History,
        DetailTab::Config,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            DetailTab::Overview => "Overview",
            DetailTab::Tasks => "Tasks",
            DetailTab::Logs => "Logs",
            DetailTab::History => "History",
            DetailTab::Config => "Config",
        }
    }

    /// Tab for a 1-based digit key.
    pub fn from_number(n: u8) -> Option<DetailTab> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn next(&self) -> DetailTab {
        let idx = Self::ALL.iter().position(|t| t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> DetailTab {
        let idx = Self::ALL.iter().position(|t| t == self).unwrap_or(0);
        if idx == 0 {
            Self::ALL[Self::ALL.len() - 1]
        } else {
            Self::ALL[idx - 1]
        }
    }
}

impl fmt::Display for DetailTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Tabs of the config editor. Cycling stops at either end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigTab {
    #[default]
    Project,
    Builder,
    Reviewer,
    Architect,
    Loop,
    Summary,
}

impl ConfigTab {
    pub const ALL: [ConfigTab; 6] = [
        ConfigTab::Project,
        ConfigTab::Builder,
        ConfigTab::Reviewer,
        ConfigTab::Architect,
        ConfigTab::Loop,
        ConfigTab::Summary,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ConfigTab::Project => "Project",
            ConfigTab::Builder => "Builder",
            ConfigTab::Reviewer => "Reviewer",
            ConfigTab::Architect => "Architect",
            ConfigTab::Loop => "Loop",
            ConfigTab::Summary => "Summary",
        }
    }

    pub fn from_number(n: u8) -> Option<ConfigTab> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn next(&self) -> ConfigTab {
        let idx = Self::ALL.iter().position(|t| t == self).unwrap_or(0);
        Self::ALL[(idx + 1).min(Self::ALL.len() - 1)]
    }

    pub fn prev(&self) -> ConfigTab {
        let idx = Self::ALL.iter().position(|t| t == self).unwrap_or(0);
        Self::ALL[idx.saturating_sub(1)]
    }
}

impl fmt::Display for ConfigTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Row density of the projects list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListViewMode {
    #[default]
    Compact,
    Expanded,
}

impl ListViewMode {
    pub fn toggle(&self) -> ListViewMode {
        match self {
            ListViewMode::Compact => ListViewMode::Expanded,
            ListViewMode::Expanded => ListViewMode::Compact,
        }
    }
}

/// Status filter applied to the tasks tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl TaskFilter {
    pub const ALL: [TaskFilter; 5] = [
        TaskFilter::All,
        TaskFilter::Pending,
        TaskFilter::InProgress,
        TaskFilter::Completed,
        TaskFilter::Blocked,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Pending => "pending",
            TaskFilter::InProgress => "in_progress",
            TaskFilter::Completed => "completed",
            TaskFilter::Blocked => "blocked",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Pending => status == TaskStatus::Pending,
            TaskFilter::InProgress => status == TaskStatus::InProgress,
            TaskFilter::Completed => status == TaskStatus::Completed,
            TaskFilter::Blocked => status == TaskStatus::Blocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_tab_cycles() {
        assert_eq!(DetailTab::Config.next(), DetailTab::Overview);
        assert_eq!(DetailTab::Overview.prev(), DetailTab::Config);
        assert_eq!(DetailTab::Tasks.next(), DetailTab::Logs);
    }

    #[test]
    fn test_config_tab_clamps() {
        assert_eq!(ConfigTab::Summary.next(), ConfigTab::Summary);
        assert_eq!(ConfigTab::Project.prev(), ConfigTab::Project);
        assert_eq!(ConfigTab::Builder.next(), ConfigTab::Reviewer);
    }

    #[test]
    fn test_tab_numbers() {
        assert_eq!(DetailTab::from_number(1), Some(DetailTab::Overview));
        assert_eq!(DetailTab::from_number(5), Some(DetailTab::Config));
        assert_eq!(DetailTab::from_number(6), None);
        assert_eq!(DetailTab::from_number(0), None);
        assert_eq!(ConfigTab::from_number(6), Some(ConfigTab::Summary));
    }

    #[test]
    fn test_task_filter_matches() {
        assert!(TaskFilter::All.matches(TaskStatus::Unknown));
        assert!(TaskFilter::Blocked.matches(TaskStatus::Blocked));
        assert!(!TaskFilter::Pending.matches(TaskStatus::Completed));
        assert_eq!(TaskFilter::InProgress.index(), 2);
    }
}
