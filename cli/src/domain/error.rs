//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed cause carried by [`EmbedError::ArchiveIo`].
pub type IoCause = Box<dyn std::error::Error + Send + Sync>;

// ── Embedding errors ──────────────────────────────────────────────────────────

/// Fatal failures of the embedding transform.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error(
        "Target archive is not runnable. Reason: {reason}. Embedding agents into it makes no sense."
    )]
    NotRunnable { reason: String },

    #[error("Agent archive for {agent} not found")]
    AgentNotFound { agent: String },

    #[error(
        "Cannot determine the agent class for {agent}. Set 'agent_class' or add a Premain-Class attribute to the agent's manifest."
    )]
    AgentClassUnresolved { agent: String },

    #[error("{context}")]
    ArchiveIo {
        context: String,
        #[source]
        source: IoCause,
    },

    #[error("Manifest attribute '{name}' has a value with a line break or NUL character")]
    InvalidAttributeValue { name: String },

    #[error("Artifact {} does not exist. Build it before embedding agents.", path.display())]
    ArtifactMissing { path: PathBuf },
}

impl EmbedError {
    pub fn archive_io(context: impl Into<String>, source: impl Into<IoCause>) -> Self {
        Self::ArchiveIo {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Stable identifier used in `--json` error objects.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotRunnable { .. } => "not_runnable",
            Self::AgentNotFound { .. } => "agent_not_found",
            Self::AgentClassUnresolved { .. } => "agent_class_unresolved",
            Self::ArchiveIo { .. } => "archive_io",
            Self::InvalidAttributeValue { .. } => "invalid_attribute_value",
            Self::ArtifactMissing { .. } => "artifact_missing",
        }
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors in the embed configuration or its command-line overrides.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No artifact to process. Pass --artifact or set 'artifact' in the configuration file.")]
    MissingArtifact,

    #[error("Invalid --agent value '{0}': expected PATH or PATH=ARGS")]
    InvalidAgentFlag(String),

    #[error("Got {classes} --agent-class values for {agents} --agent values")]
    TooManyAgentClasses { classes: usize, agents: usize },

    #[error("Invalid agent class name '{0}': expected a fully qualified class name such as org.example.Agent")]
    InvalidClassName(String),

    #[error("Agent #{0} has neither coordinates nor an 'agent_path'")]
    UnidentifiedAgent(usize),
}
