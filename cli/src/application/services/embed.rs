//! Application service — embedding agents into an executable archive.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use agent_launcher::{AgentEntry, LAUNCHER_CLASS, StubDescriptor, resource_path};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::application::ports::{
    ArchiveFs, ArchiveOpener, DependencyResolver, HostFs, ProgressReporter,
};
use crate::application::services::manifest::{load_manifest, load_runnable_manifest, persist};
use crate::application::services::merge::{
    MergeStats, locate_embedded_copy, merge_into, remove_embedded_copy,
};
use crate::domain::archive::ArchiveEntry;
use crate::domain::config::{AgentDescriptor, EmbedConfig, SourcePrecedence};
use crate::domain::error::{ConfigError, EmbedError};
use crate::domain::manifest::{
    ManifestConflict, register_agents, register_bootstrap, resolve_agent_class,
};

/// Where an agent's files were read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "kebab-case")]
pub enum AgentSource {
    /// An archive on the host filesystem.
    External(PathBuf),
    /// An archive nested inside the primary archive.
    Embedded(String),
}

/// Outcome for one embedded agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub index: usize,
    pub agent_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_args: Option<String>,
    pub source: AgentSource,
    pub entries: MergeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_duplicate: Option<String>,
}

/// Outcome of the `embed_agents` use-case.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedReport {
    pub artifact: PathBuf,
    /// No agents were configured; the artifact was not opened.
    pub skipped: bool,
    pub bootstrap_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ManifestConflict>,
    pub agents: Vec<AgentReport>,
}

/// Ports the embed use-case runs against.
pub struct EmbedPorts<'a, O, R, H, P> {
    pub opener: &'a O,
    pub resolver: &'a R,
    pub host: &'a H,
    pub reporter: &'a P,
}

/// Embed every configured agent into the configured artifact.
///
/// Either every agent is embedded and registered and the artifact is
/// committed, or the call fails and the artifact is left as it was.
///
/// # Errors
///
/// Returns an [`EmbedError`] (wrapped in `anyhow`) for every fatal
/// condition; see its variants.
pub fn embed_agents<O, R, H, P>(
    ports: &EmbedPorts<'_, O, R, H, P>,
    config: &EmbedConfig,
) -> Result<EmbedReport>
where
    O: ArchiveOpener,
    R: DependencyResolver,
    H: HostFs,
    P: ProgressReporter,
{
    let mut report = EmbedReport {
        artifact: config.artifact.clone().unwrap_or_default(),
        skipped: false,
        bootstrap_class: LAUNCHER_CLASS.to_string(),
        conflict: None,
        agents: Vec::new(),
    };
    if config.agents.is_empty() {
        ports
            .reporter
            .warn("List of agents to embed is empty, skipping execution");
        report.skipped = true;
        return Ok(report);
    }

    let artifact = config
        .artifact
        .clone()
        .ok_or(ConfigError::MissingArtifact)?;
    config.validate()?;

    let Some(mut primary) = ports.opener.open(&artifact, false)? else {
        return Err(EmbedError::ArtifactMissing { path: artifact }.into());
    };
    ports
        .reporter
        .step(&format!("Embedding agents into {}", artifact.display()));

    match embed_into(ports, config, &mut primary, &mut report) {
        Ok(()) => {
            primary
                .close()
                .with_context(|| format!("cannot save {}", artifact.display()))?;
            ports.reporter.success(&format!(
                "Embedded {} agent(s) into {}",
                report.agents.len(),
                artifact.display()
            ));
            Ok(report)
        }
        Err(e) => {
            primary.discard();
            Err(e)
        }
    }
}

fn embed_into<O, R, H, P>(
    ports: &EmbedPorts<'_, O, R, H, P>,
    config: &EmbedConfig,
    primary: &mut O::Archive,
    report: &mut EmbedReport,
) -> Result<()>
where
    O: ArchiveOpener,
    R: DependencyResolver,
    H: HostFs,
    P: ProgressReporter,
{
    let mut manifest = load_runnable_manifest(primary)?;
    embed_launcher_stub(primary)?;

    let mut registered = Vec::with_capacity(config.agents.len());
    for (i, agent) in config.agents.iter().enumerate() {
        let agent_report = embed_agent(ports, config, primary, agent, i + 1)?;
        registered.push(AgentEntry::new(
            agent_report.agent_class.clone(),
            agent_report.agent_args.clone(),
        ));
        report.agents.push(agent_report);
    }

    if let Some(conflict) = register_bootstrap(&mut manifest, LAUNCHER_CLASS) {
        ports.reporter.warn(&conflict.to_string());
        report.conflict = Some(conflict);
    }
    register_agents(&mut manifest, &registered)?;
    persist(&manifest, primary)?;
    Ok(())
}

fn embed_agent<O, R, H, P>(
    ports: &EmbedPorts<'_, O, R, H, P>,
    config: &EmbedConfig,
    primary: &mut O::Archive,
    agent: &AgentDescriptor,
    index: usize,
) -> Result<AgentReport>
where
    O: ArchiveOpener,
    R: DependencyResolver,
    H: HostFs,
    P: ProgressReporter,
{
    let not_found = || EmbedError::AgentNotFound {
        agent: agent.to_string(),
    };
    let location = ports
        .resolver
        .resolve(agent)
        .map(|path| path.to_string_lossy().into_owned())
        .or_else(|| agent.agent_path.clone())
        .ok_or_else(not_found)?;
    ports.reporter.step(&format!("Processing agent {location}"));

    let host_path = to_host_path(&location);
    let external_found = ports.host.exists(&host_path);
    let embedded = if config.remove_embedded_agents
        || !external_found
        || config.source_precedence == SourcePrecedence::Embedded
    {
        locate_embedded_copy(primary, &location)
    } else {
        None
    };

    let source = match (config.source_precedence, external_found, &embedded) {
        (SourcePrecedence::Embedded, _, Some(path)) | (_, false, Some(path)) => {
            AgentSource::Embedded(path.clone())
        }
        (_, true, _) => AgentSource::External(host_path),
        (_, false, None) => return Err(not_found().into()),
    };

    let agent_archive = match &source {
        AgentSource::External(path) => ports.opener.open(path, false)?,
        AgentSource::Embedded(path) => primary.open_nested(path)?,
    }
    .ok_or_else(not_found)?;

    let merged = unpack_agent(primary, &agent_archive, agent);
    agent_archive.discard();
    let (agent_class, entries) = merged?;

    info!(
        index,
        agent_class = %agent_class,
        copied = entries.copied,
        skipped = entries.skipped,
        "Embedded agent"
    );

    let mut removed_duplicate = None;
    if config.remove_embedded_agents
        && let Some(path) = embedded
        && remove_embedded_copy(primary, &path)
    {
        ports
            .reporter
            .step(&format!("Removing embedded agent: {path}"));
        removed_duplicate = Some(path);
    }

    Ok(AgentReport {
        index,
        agent_class,
        agent_args: agent.agent_args.clone().filter(|args| !args.is_empty()),
        source,
        entries,
        removed_duplicate,
    })
}

/// Resolve the agent class, then copy the agent's entries into `primary`.
fn unpack_agent<A: ArchiveFs>(
    primary: &mut A,
    agent_archive: &A,
    agent: &AgentDescriptor,
) -> Result<(String, MergeStats)> {
    let agent_class = match agent.agent_class.as_deref() {
        Some(explicit) => resolve_agent_class(Some(explicit), None),
        None => resolve_agent_class(None, load_manifest(agent_archive)?.as_ref()),
    }
    .ok_or_else(|| EmbedError::AgentClassUnresolved {
        agent: agent.to_string(),
    })?;
    let stats = merge_into(primary, agent_archive)?;
    Ok((agent_class, stats))
}

/// Store the launcher stub resource, creating its parent directories.
fn embed_launcher_stub(primary: &mut impl ArchiveFs) -> Result<(), EmbedError> {
    let resource = resource_path(LAUNCHER_CLASS);
    for (end, _) in resource.match_indices('/') {
        let dir = &resource[..=end];
        if !primary.contains(dir) {
            primary
                .put(dir, ArchiveEntry::directory())
                .map_err(|e| EmbedError::archive_io(format!("cannot create '{dir}'"), e))?;
        }
    }
    let bytes = StubDescriptor::current()
        .to_bytes()
        .map_err(|e| EmbedError::archive_io("cannot render launcher stub", e))?;
    primary
        .put(&resource, ArchiveEntry::file(bytes))
        .map_err(|e| EmbedError::archive_io(format!("cannot write '{resource}'"), e))
}

/// Convert separators of a build-tool supplied path to the host's.
fn to_host_path(location: &str) -> PathBuf {
    let foreign = if MAIN_SEPARATOR == '/' { '\\' } else { '/' };
    Path::new(&location.replace(foreign, &MAIN_SEPARATOR.to_string())).to_path_buf()
}
