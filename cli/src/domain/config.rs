//! Domain types and validators for the embed configuration.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

/// Configuration file looked up in the working directory by default.
pub const DEFAULT_CONFIG_FILE: &str = "agent-embedder.yaml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "AGENT_EMBEDDER_CONFIG";

/// Agents are always plain jar artifacts.
pub const AGENT_ARTIFACT_TYPE: &str = "jar";

/// Fully qualified class name, e.g. `org.example.Agent` or `a.b.Outer$Inner`.
pub static CLASS_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[\p{L}_$][\p{L}\p{N}_$]*(\.[\p{L}_$][\p{L}\p{N}_$]*)*$").expect("valid regex")
});

// ── Config schema ────────────────────────────────────────────────────────────

/// Everything one embed run needs, as read from `agent-embedder.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// Executable archive to modify in place.
    pub artifact: Option<PathBuf>,
    /// Agents to embed, in activation order.
    pub agents: Vec<AgentDescriptor>,
    /// Delete nested agent archives after unpacking them.
    pub remove_embedded_agents: bool,
    /// Which copy of an agent archive wins when both exist.
    pub source_precedence: SourcePrecedence,
    /// How the artifact is opened for writing.
    pub strategy: ArchiveStrategyChoice,
    /// Dependencies resolved by the build tool, used to locate agents by
    /// coordinates.
    pub dependencies: Vec<ResolvedDependency>,
}

/// One agent to embed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDescriptor {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub classifier: Option<String>,
    /// Class with the agent's `premain` hook. Discovered from the agent's
    /// own manifest when absent.
    pub agent_class: Option<String>,
    pub agent_args: Option<String>,
    /// Host path or path inside the artifact, used when no dependency
    /// matches the coordinates.
    pub agent_path: Option<String>,
}

impl AgentDescriptor {
    /// Descriptor for an agent given only by path.
    #[must_use]
    pub fn from_path(path: impl Into<String>, agent_args: Option<String>) -> Self {
        Self {
            agent_path: Some(path.into()),
            agent_args,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.group_id.is_some() && self.artifact_id.is_some()
    }

    /// Whether `dependency` is this agent's artifact: type, group, artifact
    /// and classifier must all be equal.
    #[must_use]
    pub fn matches(&self, dependency: &ResolvedDependency) -> bool {
        dependency.kind == AGENT_ARTIFACT_TYPE
            && self.group_id.as_deref() == Some(dependency.group_id.as_str())
            && self.artifact_id.as_deref() == Some(dependency.artifact_id.as_str())
            && self.classifier == dependency.classifier
    }
}

impl fmt::Display for AgentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.group_id, &self.artifact_id, &self.classifier) {
            (Some(g), Some(a), Some(c)) => write!(f, "{g}:{a}:{c}"),
            (Some(g), Some(a), None) => write!(f, "{g}:{a}"),
            _ => match &self.agent_path {
                Some(path) => f.write_str(path),
                None => f.write_str("<unidentified agent>"),
            },
        }
    }
}

/// A dependency as resolved by the build tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDependency {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(rename = "type", default = "default_artifact_type")]
    pub kind: String,
    pub path: PathBuf,
}

fn default_artifact_type() -> String {
    AGENT_ARTIFACT_TYPE.to_string()
}

/// Which agent archive to read when a file exists both on the host and
/// nested inside the artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourcePrecedence {
    #[default]
    External,
    Embedded,
}

/// Requested archive opening strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveStrategyChoice {
    /// Probe the artifact's directory and pick the best strategy.
    #[default]
    Auto,
    /// Rewrite through a temporary file next to the artifact.
    InPlace,
    /// Work on a copy in a private temporary directory.
    CopyOut,
}

impl FromStr for ArchiveStrategyChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "in-place" => Ok(Self::InPlace),
            "copy-out" => Ok(Self::CopyOut),
            other => Err(format!(
                "unknown strategy '{other}' (expected auto, in-place or copy-out)"
            )),
        }
    }
}

// ── Command-line overrides ───────────────────────────────────────────────────

/// Values given on the command line; they take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct EmbedOverrides {
    pub artifact: Option<PathBuf>,
    /// `PATH` or `PATH=ARGS`, appended after configured agents.
    pub agents: Vec<String>,
    /// Applied positionally to `agents`.
    pub agent_classes: Vec<String>,
    pub remove_embedded_agents: bool,
    pub prefer_embedded: bool,
    pub strategy: Option<ArchiveStrategyChoice>,
}

impl EmbedConfig {
    /// Merge command-line overrides into the file configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an `--agent` value is malformed or there are more
    /// `--agent-class` values than `--agent` values.
    pub fn with_overrides(mut self, overrides: EmbedOverrides) -> Result<Self> {
        if overrides.agent_classes.len() > overrides.agents.len() {
            return Err(ConfigError::TooManyAgentClasses {
                classes: overrides.agent_classes.len(),
                agents: overrides.agents.len(),
            }
            .into());
        }

        let mut classes = overrides.agent_classes.into_iter();
        for flag in &overrides.agents {
            let mut agent = parse_agent_flag(flag)?;
            agent.agent_class = classes.next();
            self.agents.push(agent);
        }

        if overrides.artifact.is_some() {
            self.artifact = overrides.artifact;
        }
        self.remove_embedded_agents |= overrides.remove_embedded_agents;
        if overrides.prefer_embedded {
            self.source_precedence = SourcePrecedence::Embedded;
        }
        if let Some(strategy) = overrides.strategy {
            self.strategy = strategy;
        }
        Ok(self)
    }

    /// Check every agent is identifiable and every explicit class is a legal
    /// class name.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        for (i, agent) in self.agents.iter().enumerate() {
            if !agent.has_coordinates() && agent.agent_path.is_none() {
                return Err(ConfigError::UnidentifiedAgent(i + 1).into());
            }
            if let Some(class) = &agent.agent_class {
                validate_class_name(class)?;
            }
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Parse an `--agent PATH[=ARGS]` value. An empty argument string counts as
/// no arguments.
///
/// # Errors
///
/// Returns an error if the path part is empty.
pub fn parse_agent_flag(value: &str) -> Result<AgentDescriptor> {
    let (path, args) = match value.split_once('=') {
        Some((path, args)) => (path, Some(args)),
        None => (value, None),
    };
    if path.trim().is_empty() {
        return Err(ConfigError::InvalidAgentFlag(value.to_string()).into());
    }
    let args = args.filter(|a| !a.is_empty()).map(str::to_string);
    Ok(AgentDescriptor::from_path(path, args))
}

/// Validates a fully qualified class name.
///
/// # Errors
///
/// Returns an error if `name` is not a dotted sequence of identifiers.
pub fn validate_class_name(name: &str) -> Result<()> {
    if !CLASS_NAME_RE.is_match(name) {
        return Err(ConfigError::InvalidClassName(name.to_string()).into());
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
