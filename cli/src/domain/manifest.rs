//! Manifest editing rules for the embed transform.
//!
//! Works on parsed [`Manifest`] values only; reading the manifest out of an
//! archive and writing it back is done by
//! `crate::application::services::manifest`.

use std::fmt;

use agent_launcher::{
    AGENT_ARGS_PREFIX, AGENT_CLASS_PREFIX, AgentEntry, LAUNCHER_AGENT_CLASS, MAIN_CLASS,
    MANIFEST_PATH, Manifest, write_group,
};
use serde::Serialize;

use crate::domain::error::EmbedError;

/// Agent manifest attributes naming the agent class, in lookup order.
pub const AGENT_CLASS_ATTRIBUTES: &[&str] = &["Premain-Class", "Agent-Class", LAUNCHER_AGENT_CLASS];

/// An existing bootstrap attribute that was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestConflict {
    pub attribute: String,
    pub previous: String,
    pub replacement: String,
}

impl fmt::Display for ManifestConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Overwriting existing manifest attribute '{}: {}'",
            self.attribute, self.previous
        )
    }
}

/// Parse the primary archive's manifest and require it to be runnable.
///
/// `bytes` is the content of [`MANIFEST_PATH`], `None` when the entry is
/// missing.
///
/// # Errors
///
/// [`EmbedError::NotRunnable`] when the manifest or its `Main-Class` is
/// missing, [`EmbedError::ArchiveIo`] when it cannot be parsed.
pub fn parse_runnable(bytes: Option<&[u8]>) -> Result<Manifest, EmbedError> {
    let bytes = bytes.ok_or_else(|| EmbedError::NotRunnable {
        reason: format!("missing manifest file '{MANIFEST_PATH}'"),
    })?;
    let manifest = Manifest::parse(bytes)
        .map_err(|e| EmbedError::archive_io(format!("cannot parse {MANIFEST_PATH}"), e))?;
    match manifest.main().get(MAIN_CLASS) {
        Some(main_class) if !main_class.trim().is_empty() => Ok(manifest),
        _ => Err(EmbedError::NotRunnable {
            reason: format!("missing manifest attribute '{MAIN_CLASS}'"),
        }),
    }
}

/// Point `Launcher-Agent-Class` at `class_name`.
///
/// Returns the replaced value when a different bootstrap class was already
/// registered. Re-registering the same class is a no-op.
pub fn register_bootstrap(manifest: &mut Manifest, class_name: &str) -> Option<ManifestConflict> {
    let previous = manifest.main_mut().set(LAUNCHER_AGENT_CLASS, class_name)?;
    (previous != class_name).then(|| ManifestConflict {
        attribute: LAUNCHER_AGENT_CLASS.to_string(),
        previous,
        replacement: class_name.to_string(),
    })
}

/// Replace the agent group with `agents`, in activation order.
///
/// # Errors
///
/// [`EmbedError::InvalidAttributeValue`] when a class name or argument string
/// contains CR, LF or NUL. The manifest is left unchanged in that case.
pub fn register_agents(manifest: &mut Manifest, agents: &[AgentEntry]) -> Result<(), EmbedError> {
    for (i, agent) in agents.iter().enumerate() {
        let index = i + 1;
        if !is_representable(&agent.agent_class) {
            return Err(EmbedError::InvalidAttributeValue {
                name: format!("{AGENT_CLASS_PREFIX}{index}"),
            });
        }
        if let Some(args) = &agent.agent_args
            && !is_representable(args)
        {
            return Err(EmbedError::InvalidAttributeValue {
                name: format!("{AGENT_ARGS_PREFIX}{index}"),
            });
        }
    }
    write_group(manifest, agents);
    Ok(())
}

/// The agent class declared by an agent archive's own manifest.
#[must_use]
pub fn discover_agent_class(manifest: &Manifest) -> Option<&str> {
    AGENT_CLASS_ATTRIBUTES
        .iter()
        .filter_map(|name| manifest.main().get(name))
        .map(str::trim)
        .find(|class| !class.is_empty())
}

/// Explicit class first, then the one discovered in the agent's manifest.
#[must_use]
pub fn resolve_agent_class(explicit: Option<&str>, agent_manifest: Option<&Manifest>) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|class| !class.is_empty())
        .or_else(|| agent_manifest.and_then(discover_agent_class))
        .map(str::to_string)
}

fn is_representable(value: &str) -> bool {
    !value.contains(['\r', '\n', '\0'])
}
