//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::application::services::embed::{AgentSource, EmbedReport};
use crate::application::services::inspect::BundleInspection;
use crate::output::OutputContext;

/// Renders use-case results as human-readable terminal output using
/// `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str, launcher_version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("agent-embedder {version} (launcher stub {launcher_version})");
    }

    /// Render the outcome of an embed run.
    pub fn render_embed_report(&self, report: &EmbedReport) {
        if self.ctx.quiet || report.skipped {
            return;
        }
        println!();
        self.ctx.header(&format!("Agents in {}", report.artifact.display()));
        for agent in &report.agents {
            let source = match &agent.source {
                AgentSource::External(path) => path.display().to_string(),
                AgentSource::Embedded(entry) => format!("{entry} (embedded)"),
            };
            println!(
                "  {:>3}  {}",
                format!("#{}", agent.index).style(self.ctx.styles.dim),
                agent.agent_class.style(self.ctx.styles.bold)
            );
            if let Some(args) = &agent.agent_args {
                self.ctx.kv("    arguments:", args);
            }
            self.ctx.kv("    source:", &source);
            self.ctx.kv(
                "    entries:",
                &format!(
                    "{} copied, {} already present",
                    agent.entries.copied, agent.entries.skipped
                ),
            );
            if let Some(removed) = &agent.removed_duplicate {
                self.ctx.kv("    removed:", removed);
            }
        }
        println!();
        self.ctx.kv("Launcher-Agent-Class:", &report.bootstrap_class);
    }

    /// Render what a bundle's manifest declares.
    pub fn render_inspection(&self, inspection: &BundleInspection) {
        if self.ctx.quiet {
            return;
        }
        let none = || "(none)".to_string();
        println!();
        self.ctx
            .header(&format!("Bundle {}", inspection.archive.display()));
        self.ctx.kv("SHA-256:", &inspection.sha256);
        self.ctx.kv("Entries:", &inspection.entries.to_string());
        self.ctx.kv(
            "Main-Class:",
            &inspection.main_class.clone().unwrap_or_else(none),
        );
        self.ctx.kv(
            "Launcher-Agent-Class:",
            &inspection.bootstrap_class.clone().unwrap_or_else(none),
        );
        match &inspection.stub {
            Some(stub) => self
                .ctx
                .kv("Launcher stub:", &format!("version {}", stub.version)),
            None => self.ctx.kv("Launcher stub:", "(missing)"),
        }

        println!();
        if inspection.agents.is_empty() {
            if let Some(reason) = &inspection.agent_group_error {
                self.ctx.info(&format!("No embedded agents: {reason}"));
            } else {
                self.ctx.info("No embedded agents");
            }
        } else {
            self.ctx.header("Agents:");
            for (i, agent) in inspection.agents.iter().enumerate() {
                let args = agent
                    .agent_args
                    .as_deref()
                    .map(|a| format!(" {}", a.style(self.ctx.styles.dim)))
                    .unwrap_or_default();
                println!("  {:>3}  {}{args}", i + 1, agent.agent_class);
            }
        }

        println!();
        if inspection.is_processed() {
            self.ctx
                .success("Agents are activated by the embedded launcher at startup");
        } else if inspection.stub.is_some() && !inspection.stub_compatible {
            self.ctx
                .warn("Launcher stub layout does not match this version of agent-embedder");
        } else {
            self.ctx.warn("Bundle has not been processed by agent-embedder");
        }
    }
}
