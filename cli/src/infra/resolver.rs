//! Infrastructure implementation of the `DependencyResolver` port.

use std::path::PathBuf;

use tracing::debug;

use crate::application::ports::DependencyResolver;
use crate::domain::config::{AgentDescriptor, ResolvedDependency};

/// Resolves agents against the dependency list handed over by the build tool.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredDependencies {
    dependencies: Vec<ResolvedDependency>,
}

impl ConfiguredDependencies {
    #[must_use]
    pub fn new(dependencies: Vec<ResolvedDependency>) -> Self {
        Self { dependencies }
    }
}

impl DependencyResolver for ConfiguredDependencies {
    /// First dependency whose coordinates match; later matches are ignored.
    fn resolve(&self, agent: &AgentDescriptor) -> Option<PathBuf> {
        let found = self.dependencies.iter().find(|d| agent.matches(d))?;
        debug!(agent = %agent, path = %found.path.display(), "Resolved agent dependency");
        Some(found.path.clone())
    }
}
