//! Application service — read-only inspection of a processed bundle.

use std::path::{Path, PathBuf};

use agent_launcher::{
    AgentEntry, LAUNCHER_AGENT_CLASS, LAUNCHER_CLASS, MAIN_CLASS, StubDescriptor, read_group,
    resource_path,
};
use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{ArchiveFs, ArchiveOpener, HostFs};
use crate::application::services::manifest::load_manifest;
use crate::application::services::with_archive;
use crate::domain::error::EmbedError;

/// What a bundle's manifest and launcher resource say.
#[derive(Debug, Clone, Serialize)]
pub struct BundleInspection {
    pub archive: PathBuf,
    pub sha256: String,
    pub entries: usize,
    pub main_class: Option<String>,
    pub bootstrap_class: Option<String>,
    pub agents: Vec<AgentEntry>,
    /// Why the agent group could not be read, if it is present but broken
    /// or absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_group_error: Option<String>,
    pub stub: Option<StubDescriptor>,
    /// The stub layout matches the launcher linked into this binary.
    pub stub_compatible: bool,
}

impl BundleInspection {
    /// `Launcher-Agent-Class` names our launcher and its stub is usable.
    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.bootstrap_class.as_deref() == Some(LAUNCHER_CLASS) && self.stub_compatible
    }
}

/// Describe the bundle at `path` without modifying it.
///
/// # Errors
///
/// [`EmbedError::ArtifactMissing`] when `path` does not exist, or the error
/// of reading the archive.
pub fn inspect_bundle(
    opener: &impl ArchiveOpener,
    host: &impl HostFs,
    path: &Path,
) -> Result<BundleInspection> {
    if !host.exists(path) {
        return Err(EmbedError::ArtifactMissing {
            path: path.to_path_buf(),
        }
        .into());
    }
    let sha256 = host
        .sha256(path)
        .with_context(|| format!("cannot hash {}", path.display()))?;

    let inspection = with_archive(opener, path, false, |archive| {
        describe(archive, path.to_path_buf(), sha256)
    })?;
    inspection.ok_or_else(|| {
        EmbedError::ArtifactMissing {
            path: path.to_path_buf(),
        }
        .into()
    })
}

fn describe(archive: &impl ArchiveFs, path: PathBuf, sha256: String) -> Result<BundleInspection> {
    let manifest = load_manifest(archive)?;
    let attribute = |name: &str| {
        manifest
            .as_ref()
            .and_then(|m| m.main().get(name))
            .map(str::to_string)
    };

    let (agents, agent_group_error) = match manifest.as_ref().map(read_group) {
        Some(Ok(agents)) => (agents, None),
        Some(Err(e)) => (Vec::new(), Some(e.to_string())),
        None => (Vec::new(), Some("archive has no manifest".to_string())),
    };

    let stub = match archive.entry(&resource_path(LAUNCHER_CLASS)) {
        Some(entry) => Some(
            StubDescriptor::from_bytes(&entry.data)
                .map_err(|e| EmbedError::archive_io("cannot parse launcher stub", e))?,
        ),
        None => None,
    };

    Ok(BundleInspection {
        archive: path,
        sha256,
        entries: archive.entry_names().len(),
        main_class: attribute(MAIN_CLASS),
        bootstrap_class: attribute(LAUNCHER_AGENT_CLASS),
        agents,
        agent_group_error,
        stub_compatible: stub.as_ref().is_some_and(StubDescriptor::is_compatible),
        stub,
    })
}
