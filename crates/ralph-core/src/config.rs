//! Per-job `config.json` model.
//!
//! The dashboard reads the config for display fallbacks and writes it from
//! the config editor. Fields the editor does not know about are carried in
//! `extra` maps so a round trip through the editor never drops data.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{RalphError, Result};

/// Backend CLI that executes an agent role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Claude,
    Gemini,
    Codex,
    Opencode,
    Zai,
}

/// How a backend authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    Glm,
    #[default]
    AnthropicOauth,
    AnthropicApi,
    GeminiOauth,
    GeminiApi,
    OpenaiOauth,
    OpenaiApi,
    OpencodeOauth,
    OpencodeApi,
}

impl Backend {
    /// Backends in the order the editor cycles through them.
    pub const ALL: [Backend; 5] = [
        Self::Claude,
        Self::Gemini,
        Self::Codex,
        Self::Opencode,
        Self::Zai,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Codex => "codex",
            Self::Opencode => "opencode",
            Self::Zai => "zai",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::Gemini => "Gemini",
            Self::Codex => "Codex",
            Self::Opencode => "OpenCode",
            Self::Zai => "Z.AI/GLM",
        }
    }

    /// Auth modes this backend accepts. Never empty.
    pub fn auth_modes(&self) -> &'static [AuthMode] {
        match self {
            Self::Claude => &[
                AuthMode::AnthropicOauth,
                AuthMode::AnthropicApi,
                AuthMode::Glm,
            ],
            Self::Gemini => &[AuthMode::GeminiOauth, AuthMode::GeminiApi],
            Self::Codex => &[AuthMode::OpenaiOauth, AuthMode::OpenaiApi],
            Self::Opencode => &[AuthMode::OpencodeOauth, AuthMode::OpencodeApi],
            Self::Zai => &[AuthMode::Glm],
        }
    }

    /// The next backend in [`Backend::ALL`], wrapping around.
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|b| b == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl AuthMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Glm => "GLM Proxy",
            Self::AnthropicOauth => "Anthropic OAuth",
            Self::AnthropicApi => "Anthropic API Key",
            Self::GeminiOauth => "Gemini OAuth",
            Self::GeminiApi => "Gemini API Key",
            Self::OpenaiOauth => "OpenAI OAuth",
            Self::OpenaiApi => "OpenAI API Key",
            Self::OpencodeOauth => "OpenCode OAuth",
            Self::OpencodeApi => "OpenCode API Key",
        }
    }
}

/// Settings for one agent role (builder, reviewer, architect).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RoleConfig {
    /// Present for optional roles only; the builder always runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub auth_mode: AuthMode,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoleConfig {
    fn optional(backend: Backend, auth_mode: AuthMode) -> Self {
        Self {
            enabled: Some(false),
            backend,
            auth_mode,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Switch backend, resetting the auth mode to the backend's first one.
    pub fn set_backend(&mut self, backend: Backend) {
        self.backend = backend;
        self.auth_mode = backend.auth_modes()[0];
    }

    /// Position of the current auth mode within the backend's modes.
    pub fn auth_mode_index(&self) -> usize {
        self.backend
            .auth_modes()
            .iter()
            .position(|m| *m == self.auth_mode)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_builder_failures")]
    pub max_builder_failures: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_max_builder_failures() -> u32 {
    3
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_builder_failures: default_max_builder_failures(),
            extra: Map::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Contents of `<job>/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub builder: RoleConfig,
    #[serde(default)]
    pub reviewer: RoleConfig,
    #[serde(default)]
    pub architect: RoleConfig,
    #[serde(default)]
    pub escalation: EscalationConfig,
    /// Zero means unlimited
    #[serde(default)]
    pub max_iterations: u32,
    #[serde(default = "default_true")]
    pub completion_enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectConfig {
    /// Config for a brand-new project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            builder: RoleConfig::default(),
            reviewer: RoleConfig::optional(Backend::Claude, AuthMode::AnthropicOauth),
            architect: RoleConfig::optional(Backend::Gemini, AuthMode::GeminiOauth),
            escalation: EscalationConfig::default(),
            max_iterations: 0,
            completion_enabled: true,
            extra: Map::new(),
        }
    }

    /// Load a config, failing if it is missing or malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RalphError::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                RalphError::io("reading config", path, e)
            }
        })?;

        let config = serde_json::from_str(&content).map_err(|e| RalphError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded project config");
        Ok(config)
    }

    /// Write the config as pretty JSON, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RalphError::DirectoryCreation {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| RalphError::json_parse("serializing config", e))?;
        std::fs::write(path, json).map_err(|e| RalphError::io("writing config", path, e))?;
        info!(path = %path.display(), "saved project config");
        Ok(())
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backend_auth_modes() {
        for backend in Backend::ALL {
            assert!(!backend.auth_modes().is_empty());
        }
        assert_eq!(Backend::Zai.auth_modes(), &[AuthMode::Glm]);
        assert_eq!(Backend::Zai.next(), Backend::Claude);
    }

    #[test]
    fn test_set_backend_resets_auth() {
        let mut role = RoleConfig::default();
        role.auth_mode = AuthMode::Glm;
        role.set_backend(Backend::Gemini);
        assert_eq!(role.auth_mode, AuthMode::GeminiOauth);
        assert_eq!(role.auth_mode_index(), 0);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "name": "alpha",
                "version": "0.1.0",
                "prompts": {"dir": ".project/prompts"},
                "builder": {"backend": "codex", "auth_mode": "openai-api", "session_mode": "fresh"},
                "reviewer": {"enabled": true, "backend": "claude", "auth_mode": "glm"},
                "max_iterations": 20
            }"#,
        )
        .unwrap();

        let mut config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.builder.backend, Backend::Codex);
        assert!(config.reviewer.is_enabled());
        assert!(config.completion_enabled);

        config.description = "edited".into();
        config.save(&path).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], "0.1.0");
        assert_eq!(raw["prompts"]["dir"], ".project/prompts");
        assert_eq!(raw["builder"]["session_mode"], "fresh");
        assert_eq!(raw["description"], "edited");
        assert!(raw["builder"].get("enabled").is_none());
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        assert!(matches!(
            ProjectConfig::load(&path),
            Err(RalphError::ConfigNotFound { .. })
        ));

        std::fs::write(&path, "[1, 2").unwrap();
        let err = ProjectConfig::load(&path).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_save_creates_job_dir() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("new-job").join("config.json");
        ProjectConfig::new("new-job").save(&path).unwrap();
        assert!(path.exists());
    }
}
