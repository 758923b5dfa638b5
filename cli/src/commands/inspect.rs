//! `agent-embedder inspect` — show what a processed bundle will activate.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::services::inspect::inspect_bundle;
use crate::domain::config::ArchiveStrategyChoice;
use crate::infra::archive::HostArchiveOpener;
use crate::infra::fs::LocalFs;
use crate::output::{Renderer, progress};

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Bundle to inspect
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,
}

/// Run `agent-embedder inspect`. Never modifies the archive.
///
/// # Errors
///
/// Returns an error if the archive does not exist or cannot be read.
pub async fn run(args: &InspectArgs, app: &AppContext) -> Result<()> {
    let spinner = (app.output.show_progress() && !app.is_json())
        .then(|| progress::spinner(&format!("Reading {}...", args.archive.display())));

    let path = args.archive.clone();
    // Read-only: an unmodified archive is never written back.
    let result = tokio::task::spawn_blocking(move || {
        let opener = HostArchiveOpener::new(ArchiveStrategyChoice::InPlace);
        inspect_bundle(&opener, &LocalFs, &path)
    })
    .await
    .context("spawn_blocking for inspect_bundle");

    if let Some(pb) = &spinner {
        progress::finish_clear(pb);
    }
    let inspection = result??;

    match app.renderer() {
        Renderer::Human(r) => r.render_inspection(&inspection),
        Renderer::Json(r) => r.render(&inspection)?,
    }
    Ok(())
}
