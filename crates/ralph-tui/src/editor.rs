//! Field model for the config editor.
//!
//! Each [`ConfigTab`] exposes a small ordered list of fields. What a field
//! is depends on the tab, the index and sometimes the draft itself (an
//! optional role that is disabled only shows its toggle).

use ralph_core::{AuthMode, ProjectConfig, RoleConfig};

use crate::view::ConfigTab;

/// Upper bound accepted for `max_iterations` while typing.
const MAX_ITERATIONS_LIMIT: u32 = 100_000;

/// Agent role edited on the builder, reviewer and architect tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Builder,
    Reviewer,
    Architect,
}

impl Role {
    pub fn config<'a>(&self, config: &'a ProjectConfig) -> &'a RoleConfig {
        match self {
            Role::Builder => &config.builder,
            Role::Reviewer => &config.reviewer,
            Role::Architect => &config.architect,
        }
    }

    pub fn config_mut<'a>(&self, config: &'a mut ProjectConfig) -> &'a mut RoleConfig {
        match self {
            Role::Builder => &mut config.builder,
            Role::Reviewer => &mut config.reviewer,
            Role::Architect => &mut config.architect,
        }
    }

    fn for_tab(tab: ConfigTab) -> Option<Role> {
        match tab {
            ConfigTab::Builder => Some(Role::Builder),
            ConfigTab::Reviewer => Some(Role::Reviewer),
            ConfigTab::Architect => Some(Role::Architect),
            _ => None,
        }
    }
}

/// A focusable field in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Name,
    Description,
    Enabled(Role),
    Backend(Role),
    AuthMode(Role),
    MaxIterations,
    CompletionEnabled,
    EscalationEnabled,
    SaveButton,
    CancelButton,
}

impl ConfigField {
    /// Fields that consume typed characters.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ConfigField::Name | ConfigField::Description | ConfigField::MaxIterations
        )
    }

    /// Fields that open the auth-mode dropdown on enter.
    pub fn is_dropdown(&self) -> bool {
        matches!(self, ConfigField::AuthMode(_))
    }
}

/// Fields shown on `tab` for the current draft.
pub fn fields(tab: ConfigTab, config: &ProjectConfig) -> Vec<ConfigField> {
    match tab {
        ConfigTab::Project => vec![ConfigField::Name, ConfigField::Description],
        ConfigTab::Builder => vec![
            ConfigField::Backend(Role::Builder),
            ConfigField::AuthMode(Role::Builder),
        ],
        ConfigTab::Reviewer | ConfigTab::Architect => {
            let Some(role) = Role::for_tab(tab) else {
                return Vec::new();
            };
            if role.config(config).is_enabled() {
                vec![
                    ConfigField::Enabled(role),
                    ConfigField::Backend(role),
                    ConfigField::AuthMode(role),
                ]
            } else {
                vec![ConfigField::Enabled(role)]
            }
        }
        ConfigTab::Loop => vec![
            ConfigField::MaxIterations,
            ConfigField::CompletionEnabled,
            ConfigField::EscalationEnabled,
        ],
        ConfigTab::Summary => vec![ConfigField::SaveButton, ConfigField::CancelButton],
    }
}

pub fn field_count(tab: ConfigTab, config: &ProjectConfig) -> usize {
    fields(tab, config).len()
}

pub fn field_at(tab: ConfigTab, index: usize, config: &ProjectConfig) -> Option<ConfigField> {
    fields(tab, config).get(index).copied()
}

/// Draft being edited plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub config: ProjectConfig,
    /// Job directory name when editing an existing job; `None` for a new one
    pub job: Option<String>,
}

impl EditorState {
    pub fn new_project() -> Self {
        Self {
            config: ProjectConfig::new("new-project"),
            job: None,
        }
    }

    pub fn editing(job: impl Into<String>, config: ProjectConfig) -> Self {
        Self {
            config,
            job: Some(job.into()),
        }
    }

    pub fn is_new(&self) -> bool {
        self.job.is_none()
    }

    /// Apply space to a field. Returns true if the draft changed.
    pub fn toggle(&mut self, field: ConfigField) -> bool {
        match field {
            ConfigField::Enabled(role) => {
                let role = role.config_mut(&mut self.config);
                role.enabled = Some(!role.is_enabled());
            }
            ConfigField::Backend(role) => {
                let role = role.config_mut(&mut self.config);
                role.set_backend(role.backend.next());
            }
            ConfigField::CompletionEnabled => {
                self.config.completion_enabled = !self.config.completion_enabled;
            }
            ConfigField::EscalationEnabled => {
                self.config.escalation.enabled = !self.config.escalation.enabled;
            }
            _ => return false,
        }
        true
    }

    /// Move the role's auth mode within its backend's modes, clamped.
    pub fn step_auth_mode(&mut self, role: Role, down: bool) -> AuthMode {
        let role = role.config_mut(&mut self.config);
        let modes = role.backend.auth_modes();
        let current = role.auth_mode_index();
        let next = if down {
            (current + 1).min(modes.len() - 1)
        } else {
            current.saturating_sub(1)
        };
        role.auth_mode = modes[next];
        role.auth_mode
    }

    /// Append a typed character to a text field.
    pub fn input_char(&mut self, field: ConfigField, c: char) {
        match field {
            ConfigField::Name => self.config.name.push(c),
            ConfigField::Description => self.config.description.push(c),
            ConfigField::MaxIterations => {
                if let Some(digit) = c.to_digit(10) {
                    let value = self
                        .config
                        .max_iterations
                        .saturating_mul(10)
                        .saturating_add(digit);
                    if value <= MAX_ITERATIONS_LIMIT {
                        self.config.max_iterations = value;
                    }
                }
            }
            _ => {}
        }
    }

    pub fn backspace(&mut self, field: ConfigField) {
        match field {
            ConfigField::Name => {
                self.config.name.pop();
            }
            ConfigField::Description => {
                self.config.description.pop();
            }
            ConfigField::MaxIterations => self.config.max_iterations /= 10,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ralph_core::Backend;

    #[test]
    fn test_field_counts() {
        let mut config = ProjectConfig::new("x");
        assert_eq!(field_count(ConfigTab::Project, &config), 2);
        assert_eq!(field_count(ConfigTab::Builder, &config), 2);
        assert_eq!(field_count(ConfigTab::Reviewer, &config), 1);
        assert_eq!(field_count(ConfigTab::Architect, &config), 1);
        assert_eq!(field_count(ConfigTab::Loop, &config), 3);
        assert_eq!(field_count(ConfigTab::Summary, &config), 2);

        config.reviewer.enabled = Some(true);
        assert_eq!(field_count(ConfigTab::Reviewer, &config), 3);
    }

    #[test]
    fn test_field_kinds() {
        let config = ProjectConfig::new("x");
        assert!(field_at(ConfigTab::Project, 1, &config).unwrap().is_text());
        assert!(field_at(ConfigTab::Builder, 1, &config).unwrap().is_dropdown());
        assert!(field_at(ConfigTab::Loop, 0, &config).unwrap().is_text());
        assert!(field_at(ConfigTab::Loop, 3, &config).is_none());
    }

    #[test]
    fn test_toggle_backend_cycles_and_resets_auth() {
        let mut editor = EditorState::new_project();
        assert!(editor.toggle(ConfigField::Backend(Role::Builder)));
        assert_eq!(editor.config.builder.backend, Backend::Gemini);
        assert_eq!(editor.config.builder.auth_mode, AuthMode::GeminiOauth);
    }

    #[test]
    fn test_auth_mode_stepping_is_clamped() {
        let mut editor = EditorState::new_project();
        assert_eq!(editor.step_auth_mode(Role::Builder, false), AuthMode::AnthropicOauth);
        assert_eq!(editor.step_auth_mode(Role::Builder, true), AuthMode::AnthropicApi);
        assert_eq!(editor.step_auth_mode(Role::Builder, true), AuthMode::Glm);
        assert_eq!(editor.step_auth_mode(Role::Builder, true), AuthMode::Glm);
    }

    #[test]
    fn test_max_iterations_accepts_digits_only() {
        let mut editor = EditorState::new_project();
        for c in ['4', 'x', '2'] {
            editor.input_char(ConfigField::MaxIterations, c);
        }
        assert_eq!(editor.config.max_iterations, 42);
        editor.backspace(ConfigField::MaxIterations);
        assert_eq!(editor.config.max_iterations, 4);
    }

    #[test]
    fn test_name_editing() {
        let mut editor = EditorState::new_project();
        editor.config.name.clear();
        for c in "api".chars() {
            editor.input_char(ConfigField::Name, c);
        }
        editor.backspace(ConfigField::Name);
        assert_eq!(editor.config.name, "ap");
        assert!(!editor.toggle(ConfigField::Name));
    }
}
