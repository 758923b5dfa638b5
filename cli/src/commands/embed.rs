//! `agent-embedder embed` — embed agents into an executable archive.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::embed::{EmbedPorts, embed_agents};
use crate::domain::config::{ArchiveStrategyChoice, EmbedOverrides};
use crate::infra::archive::HostArchiveOpener;
use crate::infra::config::YamlConfigStore;
use crate::infra::fs::LocalFs;
use crate::infra::resolver::ConfiguredDependencies;
use crate::output::Renderer;

/// Arguments for the embed command.
#[derive(Args, Default)]
pub struct EmbedArgs {
    /// Configuration file [default: ./agent-embedder.yaml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Executable archive to modify in place
    #[arg(long, value_name = "PATH")]
    pub artifact: Option<PathBuf>,

    /// Agent archive to embed, optionally with its argument string
    #[arg(long = "agent", value_name = "PATH[=ARGS]")]
    pub agents: Vec<String>,

    /// Agent class for the --agent at the same position
    #[arg(long = "agent-class", value_name = "CLASS")]
    pub agent_classes: Vec<String>,

    /// Delete nested copies of agent archives after unpacking them
    #[arg(long)]
    pub remove_embedded_agents: bool,

    /// Read an agent from its nested copy when it also exists on disk
    #[arg(long)]
    pub prefer_embedded: bool,

    /// How the artifact is opened for writing: auto, in-place or copy-out
    #[arg(long, value_name = "STRATEGY")]
    pub strategy: Option<ArchiveStrategyChoice>,
}

impl EmbedArgs {
    fn overrides(&self) -> EmbedOverrides {
        EmbedOverrides {
            artifact: self.artifact.clone(),
            agents: self.agents.clone(),
            agent_classes: self.agent_classes.clone(),
            remove_embedded_agents: self.remove_embedded_agents,
            prefer_embedded: self.prefer_embedded,
            strategy: self.strategy,
        }
    }
}

/// Run `agent-embedder embed`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or embedding fails. The
/// artifact is left unchanged in that case.
pub async fn run(args: &EmbedArgs, app: &AppContext) -> Result<()> {
    let store = YamlConfigStore::resolve(args.config.clone());
    let config = store.load()?.with_overrides(args.overrides())?;
    debug!(
        config = %store.path().display(),
        agents = config.agents.len(),
        "Loaded embed configuration"
    );

    let worker = app.clone();
    let report = tokio::task::spawn_blocking(move || {
        let opener = HostArchiveOpener::new(config.strategy);
        let resolver = ConfiguredDependencies::new(config.dependencies.clone());
        let reporter = worker.reporter();
        let ports = EmbedPorts {
            opener: &opener,
            resolver: &resolver,
            host: &LocalFs,
            reporter: &reporter,
        };
        embed_agents(&ports, &config)
    })
    .await
    .context("spawn_blocking for embed_agents")??;

    match app.renderer() {
        Renderer::Human(r) => r.render_embed_report(&report),
        Renderer::Json(r) => r.render(&report)?,
    }
    Ok(())
}
