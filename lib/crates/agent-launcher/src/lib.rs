//! Shared pieces of the agent embedder: the jar manifest codec, the agent
//! attribute group, the launcher stub resource and the runtime launcher that
//! activates every registered agent at process startup.

pub mod bundle;
pub mod group;
pub mod launcher;
pub mod manifest;
pub mod stub;

pub use bundle::{BundleManifest, ManifestSource};
pub use group::{
    AGENT_ARGS_PREFIX, AGENT_ATTRIBUTES_GROUP, AGENT_CLASS_PREFIX, AGENT_COUNT, AgentEntry, AgentGroup,
    GroupError, LAUNCHER_AGENT_CLASS, MAIN_CLASS, read_group, write_group,
};
pub use launcher::{Agent, AgentFailure, AgentRegistry, LaunchError, Launcher, LauncherState};
pub use manifest::{Attributes, MANIFEST_PATH, Manifest, ManifestError};
pub use stub::{LAUNCHER_CLASS, StubDescriptor, resource_path};
