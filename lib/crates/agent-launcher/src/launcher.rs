//! Runtime launcher: activates every agent registered in the bundle manifest.
//!
//! The launcher is the bundle's single bootstrap agent. At startup it reads
//! the agent group and calls each agent's startup hook in registration order,
//! handing over the process's instrumentation context and the agent's own
//! argument string. The first failing agent aborts startup; later agents are
//! never called.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::bundle::ManifestSource;
use crate::group::{AgentEntry, AgentGroup, GroupError};
use crate::manifest::ManifestError;

/// Error returned by an agent's startup hook.
pub type AgentFailure = Box<dyn std::error::Error + Send + Sync>;

/// An instrumentation agent with the standard two-argument startup hook.
///
/// `C` is the instrumentation context the host process hands to agents; the
/// launcher never looks inside it.
pub trait Agent<C: ?Sized> {
    fn premain(&self, args: Option<&str>, ctx: &C) -> Result<(), AgentFailure>;
}

impl<C: ?Sized, F> Agent<C> for F
where
    F: Fn(Option<&str>, &C) -> Result<(), AgentFailure>,
{
    fn premain(&self, args: Option<&str>, ctx: &C) -> Result<(), AgentFailure> {
        self(args, ctx)
    }
}

/// Maps agent class names, as written to the manifest, to implementations.
pub struct AgentRegistry<C: ?Sized> {
    agents: HashMap<String, Box<dyn Agent<C>>>,
}

impl<C: ?Sized> Default for AgentRegistry<C> {
    fn default() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }
}

impl<C: ?Sized> AgentRegistry<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `agent` under `class_name`, replacing any earlier registration.
    pub fn register(
        &mut self,
        class_name: impl Into<String>,
        agent: impl Agent<C> + 'static,
    ) -> &mut Self {
        self.agents.insert(class_name.into(), Box::new(agent));
        self
    }

    #[must_use]
    pub fn contains(&self, class_name: &str) -> bool {
        self.agents.contains_key(class_name)
    }

    fn get(&self, class_name: &str) -> Option<&dyn Agent<C>> {
        self.agents.get(class_name).map(Box::as_ref)
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("cannot read bundle {}: {source}", path.display())]
    Bundle {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bundle {} has no manifest", .0.display())]
    MissingManifest(PathBuf),

    #[error("cannot read bundle archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("cannot parse launcher stub resource: {0}")]
    Stub(#[from] serde_yaml::Error),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("bundle is inconsistent, agent embedding did not complete: {0}")]
    Group(#[from] GroupError),

    #[error("agent class '{0}' is not registered with the launcher")]
    UnknownAgent(String),

    #[error("agent '{agent_class}' failed to start: {source}")]
    AgentFailed {
        agent_class: String,
        #[source]
        source: AgentFailure,
    },

    #[error("launcher has already run")]
    AlreadyRan,
}

/// Launcher lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherState {
    /// Not yet invoked.
    Idle,
    /// Calling agent `index` (1-based) of `count`.
    Dispatching { index: usize, count: usize },
    /// Finished; `activated` agents returned successfully.
    Terminal { activated: usize, failed: bool },
}

pub struct Launcher<C: ?Sized> {
    registry: AgentRegistry<C>,
    state: LauncherState,
}

impl<C: ?Sized> Launcher<C> {
    #[must_use]
    pub fn new(registry: AgentRegistry<C>) -> Self {
        Self {
            registry,
            state: LauncherState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> LauncherState {
        self.state
    }

    /// Launch-time entry point. Returns the number of agents activated.
    pub fn bootstrap<S>(&mut self, source: &S, ctx: &C) -> Result<usize, LaunchError>
    where
        S: ManifestSource + ?Sized,
    {
        if self.state != LauncherState::Idle {
            return Err(LaunchError::AlreadyRan);
        }

        let manifest = match source.read_manifest() {
            Ok(manifest) => manifest,
            Err(e) => return Err(self.fail(0, e)),
        };
        let group = match AgentGroup::open(&manifest) {
            Ok(group) => group,
            Err(e) => return Err(self.fail(0, e.into())),
        };

        let count = group.len();
        for index in 1..=count {
            self.state = LauncherState::Dispatching { index, count };
            let started = group
                .agent(index)
                .map_err(LaunchError::from)
                .and_then(|agent| self.start(&agent, ctx));
            if let Err(e) = started {
                return Err(self.fail(index - 1, e));
            }
        }

        self.state = LauncherState::Terminal {
            activated: count,
            failed: false,
        };
        Ok(count)
    }

    fn start(&self, agent: &AgentEntry, ctx: &C) -> Result<(), LaunchError> {
        info!(
            agent_class = %agent.agent_class,
            agent_args = agent.agent_args.as_deref().unwrap_or(""),
            "Starting agent"
        );
        let hook = self
            .registry
            .get(&agent.agent_class)
            .ok_or_else(|| LaunchError::UnknownAgent(agent.agent_class.clone()))?;
        hook.premain(agent.agent_args.as_deref(), ctx)
            .map_err(|source| LaunchError::AgentFailed {
                agent_class: agent.agent_class.clone(),
                source,
            })
    }

    fn fail(&mut self, activated: usize, error: LaunchError) -> LaunchError {
        self.state = LauncherState::Terminal {
            activated,
            failed: true,
        };
        error
    }

    /// Attach-time entry point. The attach argument string is ignored: every
    /// agent already has its own arguments in the manifest.
    pub fn agentmain<S>(&mut self, _args: Option<&str>, source: &S, ctx: &C) -> Result<usize, LaunchError>
    where
        S: ManifestSource + ?Sized,
    {
        self.bootstrap(source, ctx)
    }
}
