//! Version command

use anyhow::Result;
use agent_launcher::StubDescriptor;

use crate::app::AppContext;
use crate::output::Renderer;

/// Run the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(app: &AppContext) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let launcher = StubDescriptor::current().version;

    match app.renderer() {
        Renderer::Human(r) => r.render_version(version, &launcher),
        Renderer::Json(r) => r.render(&serde_json::json!({
            "version": version,
            "launcher": launcher,
        }))?,
    }
    Ok(())
}
