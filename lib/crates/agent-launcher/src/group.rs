//! The agent attribute group.
//!
//! The runtime only auto-activates the single class named by
//! `Launcher-Agent-Class`. Any number of agents are registered instead in one
//! named manifest section:
//!
//! ```text
//! Name: dev/agent-embedder
//! Agent-Count: 2
//! Agent-Class-1: org.example.FirstAgent
//! Agent-Args-1: option1=one,option2=two
//! Agent-Class-2: org.example.SecondAgent
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::manifest::{Attributes, Manifest};

/// Main attribute naming the bundle's entry point.
pub const MAIN_CLASS: &str = "Main-Class";

/// Main attribute naming the single auto-activated bootstrap class.
pub const LAUNCHER_AGENT_CLASS: &str = "Launcher-Agent-Class";

/// Name of the section holding the registered agents.
pub const AGENT_ATTRIBUTES_GROUP: &str = "dev/agent-embedder";

pub const AGENT_COUNT: &str = "Agent-Count";
pub const AGENT_CLASS_PREFIX: &str = "Agent-Class-";
pub const AGENT_ARGS_PREFIX: &str = "Agent-Args-";

/// One registered agent, in activation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentEntry {
    pub agent_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_args: Option<String>,
}

impl AgentEntry {
    #[must_use]
    pub fn new(agent_class: impl Into<String>, agent_args: Option<String>) -> Self {
        Self {
            agent_class: agent_class.into(),
            agent_args,
        }
    }
}

/// Malformed or missing agent group.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("manifest has no '{}' section", AGENT_ATTRIBUTES_GROUP)]
    MissingGroup,

    #[error("agent group has no '{}' attribute", AGENT_COUNT)]
    MissingCount,

    #[error("agent group has an invalid '{}' value '{}'", AGENT_COUNT, .0)]
    InvalidCount(String),

    #[error("agent group has no '{}{}' attribute", AGENT_CLASS_PREFIX, .0)]
    MissingAgentClass(usize),
}

/// Replace the agent group with `agents`, in order.
///
/// `Agent-Args-<i>` is only written for non-empty argument strings.
pub fn write_group(manifest: &mut Manifest, agents: &[AgentEntry]) {
    let mut attrs = Attributes::new();
    attrs.set(AGENT_COUNT, agents.len().to_string());
    for (i, agent) in agents.iter().enumerate() {
        let index = i + 1;
        attrs.set(format!("{AGENT_CLASS_PREFIX}{index}"), agent.agent_class.clone());
        if let Some(args) = agent.agent_args.as_deref()
            && !args.is_empty()
        {
            attrs.set(format!("{AGENT_ARGS_PREFIX}{index}"), args);
        }
    }
    manifest.insert_section(AGENT_ATTRIBUTES_GROUP, attrs);
}

/// The agent group header of a manifest. Agent attributes are only looked up
/// by [`AgentGroup::agent`], one index at a time.
#[derive(Debug, Clone, Copy)]
pub struct AgentGroup<'a> {
    attrs: &'a Attributes,
    count: usize,
}

impl<'a> AgentGroup<'a> {
    /// Locate the group section and parse `Agent-Count`.
    pub fn open(manifest: &'a Manifest) -> Result<Self, GroupError> {
        let attrs = manifest
            .section(AGENT_ATTRIBUTES_GROUP)
            .ok_or(GroupError::MissingGroup)?;
        let raw_count = attrs.get(AGENT_COUNT).ok_or(GroupError::MissingCount)?;
        let count = raw_count
            .trim()
            .parse()
            .map_err(|_| GroupError::InvalidCount(raw_count.to_string()))?;
        Ok(Self { attrs, count })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Agent `index`, 1-based.
    pub fn agent(&self, index: usize) -> Result<AgentEntry, GroupError> {
        let agent_class = self
            .attrs
            .get(&format!("{AGENT_CLASS_PREFIX}{index}"))
            .filter(|class| !class.is_empty())
            .ok_or(GroupError::MissingAgentClass(index))?;
        let agent_args = self
            .attrs
            .get(&format!("{AGENT_ARGS_PREFIX}{index}"))
            .map(str::to_string);
        Ok(AgentEntry::new(agent_class, agent_args))
    }
}

/// Read the whole agent group in activation order.
pub fn read_group(manifest: &Manifest) -> Result<Vec<AgentEntry>, GroupError> {
    let group = AgentGroup::open(manifest)?;
    (1..=group.len()).map(|index| group.agent(index)).collect()
}
