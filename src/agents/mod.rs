//! Command builders for the supported AI coding agents.
//!
//! Each agent knows how to turn exercise instructions and a file list into a
//! [`CoreCommand`]: the argument vector and environment needed to invoke it.
//! Builders never spawn processes or touch the filesystem, and they do not
//! know whether the command will run on the host or inside a container.
//!
//! # Example
//!
//! ```ignore
//! use agent_bench::agents::{AgentKind, AgentSpec, CommandBuilder, Credentials, FileList};
//!
//! let spec = AgentSpec::new(AgentKind::Claude, "claude-sonnet-4", "bench-agents:latest");
//! let builder = CommandBuilder::for_agent(&spec, &Credentials::from_env())?;
//! let command = builder.build_core_command("Solve the exercise", &FileList::default());
//! assert_eq!(command.argv[0], "claude");
//! ```

pub mod aider;
pub mod claude;
pub mod codex;
pub mod credentials;
pub mod cursor;
pub mod custom;
pub mod gemini;
pub mod goose;
pub mod opencode;
pub mod qwen;
pub mod version;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

pub use credentials::Credentials;
pub use version::detect_version;

/// Supported agent kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Claude Code (Anthropic's coding agent).
    Claude,
    /// Goose (Block's developer agent).
    Goose,
    /// Aider (AI pair programming tool).
    Aider,
    /// OpenAI Codex CLI.
    Codex,
    /// Google Gemini CLI.
    Gemini,
    /// OpenCode.
    #[serde(rename = "opencode")]
    OpenCode,
    /// Qwen Code.
    Qwen,
    /// Cursor agent CLI.
    Cursor,
    /// Operator-supplied shell command reading the prompt from stdin.
    Custom,
}

impl AgentKind {
    /// Every supported agent, in CLI listing order.
    pub const ALL: [AgentKind; 9] = [
        AgentKind::Claude,
        AgentKind::Goose,
        AgentKind::Aider,
        AgentKind::Codex,
        AgentKind::Gemini,
        AgentKind::OpenCode,
        AgentKind::Qwen,
        AgentKind::Cursor,
        AgentKind::Custom,
    ];

    /// Returns the identifier used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Claude => "claude",
            AgentKind::Goose => "goose",
            AgentKind::Aider => "aider",
            AgentKind::Codex => "codex",
            AgentKind::Gemini => "gemini",
            AgentKind::OpenCode => "opencode",
            AgentKind::Qwen => "qwen",
            AgentKind::Cursor => "cursor",
            AgentKind::Custom => "custom",
        }
    }

    /// Returns the display name for this agent kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentKind::Claude => "Claude Code",
            AgentKind::Goose => "Goose",
            AgentKind::Aider => "Aider",
            AgentKind::Codex => "Codex",
            AgentKind::Gemini => "Gemini CLI",
            AgentKind::OpenCode => "OpenCode",
            AgentKind::Qwen => "Qwen Code",
            AgentKind::Cursor => "Cursor Agent",
            AgentKind::Custom => "Custom",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" | "claude-code" => Ok(AgentKind::Claude),
            "goose" => Ok(AgentKind::Goose),
            "aider" => Ok(AgentKind::Aider),
            "codex" => Ok(AgentKind::Codex),
            "gemini" => Ok(AgentKind::Gemini),
            "opencode" => Ok(AgentKind::OpenCode),
            "qwen" => Ok(AgentKind::Qwen),
            "cursor" | "cursor-agent" => Ok(AgentKind::Cursor),
            "custom" => Ok(AgentKind::Custom),
            other => Err(BuildError::UnknownAgent(other.to_string())),
        }
    }
}

/// Identifies the agent under benchmark. Created once per benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Which builder variant to use.
    pub kind: AgentKind,
    /// Model name handed to the agent.
    pub model: String,
    /// Optional provider, used by agents that can talk to several backends.
    pub provider: Option<String>,
    /// Container image used by the containerized strategy.
    pub container_id: String,
    /// Shell command for [`AgentKind::Custom`].
    pub custom_command: Option<String>,
}

impl AgentSpec {
    /// Creates a spec without provider or custom command.
    pub fn new(kind: AgentKind, model: impl Into<String>, container_id: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
            provider: None,
            container_id: container_id.into(),
            custom_command: None,
        }
    }

    /// Sets the provider.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the shell command for the custom agent.
    pub fn with_custom_command(mut self, command: impl Into<String>) -> Self {
        self.custom_command = Some(command.into());
        self
    }
}

/// Source and test files of one exercise, relative to the exercise root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileList {
    /// Files the agent is expected to edit.
    pub source_files: Vec<String>,
    /// Files that grade the agent and must not be altered.
    pub test_files: Vec<String>,
}

impl FileList {
    /// Creates a file list.
    pub fn new(source_files: Vec<String>, test_files: Vec<String>) -> Self {
        Self {
            source_files,
            test_files,
        }
    }
}

/// Agent- and runtime-agnostic command: argument vector plus environment.
///
/// Secrets travel only through `env`, never through `argv`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreCommand {
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    /// Environment variables for the process. Ordered for stable output.
    pub env: BTreeMap<String, String>,
}

impl CoreCommand {
    /// Creates a command with an empty environment.
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            env: BTreeMap::new(),
        }
    }

    /// Creates a command that runs `script` through `sh -c`.
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new(vec!["sh".to_string(), "-c".to_string(), script.into()])
    }

    /// Adds an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Values every builder variant reads from.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub provider: Option<String>,
    pub credentials: Credentials,
    pub custom_command: Option<String>,
}

impl AgentSettings {
    /// Returns the provider or an empty string.
    pub fn provider(&self) -> &str {
        self.provider.as_deref().unwrap_or("")
    }
}

/// Builds [`CoreCommand`]s for one agent.
///
/// A closed set of variants selected by [`AgentKind`]; each variant lives in
/// its own submodule and contributes an argument vector and an environment.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    kind: AgentKind,
    settings: AgentSettings,
}

impl CommandBuilder {
    /// Creates the builder for `spec`, capturing the credentials it needs.
    pub fn for_agent(spec: &AgentSpec, credentials: &Credentials) -> Result<Self, BuildError> {
        if spec.kind == AgentKind::Custom {
            let has_command = spec
                .custom_command
                .as_deref()
                .map(|c| !c.trim().is_empty())
                .unwrap_or(false);
            if !has_command {
                return Err(BuildError::MissingCustomCommand);
            }
        } else if spec.model.trim().is_empty() {
            return Err(BuildError::EmptyModel);
        }

        Ok(Self {
            kind: spec.kind,
            settings: AgentSettings {
                model: spec.model.clone(),
                provider: spec.provider.clone(),
                credentials: credentials.clone(),
                custom_command: spec.custom_command.clone(),
            },
        })
    }

    /// Returns the agent kind this builder targets.
    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Builds the command that asks the agent to carry out `instructions`.
    pub fn build_core_command(&self, instructions: &str, files: &FileList) -> CoreCommand {
        let s = &self.settings;
        let (argv, env) = match self.kind {
            AgentKind::Claude => (claude::core_args(s, instructions), claude::environment(s)),
            AgentKind::Goose => (goose::core_args(instructions), goose::environment(s)),
            AgentKind::Aider => (aider::core_args(s, instructions, files), aider::environment(s)),
            AgentKind::Codex => (codex::core_args(s, instructions), codex::environment(s)),
            AgentKind::Gemini => (gemini::core_args(s, instructions), gemini::environment(s)),
            AgentKind::OpenCode => (opencode::core_args(s, instructions), opencode::environment(s)),
            AgentKind::Qwen => (qwen::core_args(s, instructions), qwen::environment(s)),
            AgentKind::Cursor => (cursor::core_args(s, instructions, files), cursor::environment(s)),
            AgentKind::Custom => (custom::core_args(s, instructions), custom::environment(s, files)),
        };
        CoreCommand { argv, env }
    }
}

/// Builds an environment map from literal pairs.
pub(crate) fn env_map<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
