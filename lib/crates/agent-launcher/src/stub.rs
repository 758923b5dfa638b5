//! The launcher stub resource embedded into every processed bundle.
//!
//! The bundle's `Launcher-Agent-Class` names [`LAUNCHER_CLASS`]; the resource
//! stored at [`resource_path`] of that class describes which attribute group
//! layout the launcher expects, so a bundle can be checked against the
//! launcher version linked into the host process.

use serde::{Deserialize, Serialize};

use crate::group::{AGENT_ARGS_PREFIX, AGENT_ATTRIBUTES_GROUP, AGENT_CLASS_PREFIX, AGENT_COUNT};

/// Bootstrap class registered as the bundle's single launcher agent.
pub const LAUNCHER_CLASS: &str = "dev.agent_embedder.launcher.AgentLauncher";

const RESOURCE_SUFFIX: &str = ".stub";

/// Resource path of a class inside a bundle, e.g.
/// `dev.agent_embedder.launcher.AgentLauncher` →
/// `dev/agent_embedder/launcher/AgentLauncher.stub`.
#[must_use]
pub fn resource_path(class_name: &str) -> String {
    format!("{}{RESOURCE_SUFFIX}", class_name.replace('.', "/"))
}

/// Contents of the stub resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubDescriptor {
    pub launcher_class: String,
    pub version: String,
    pub attribute_group: String,
    pub count_attribute: String,
    pub class_prefix: String,
    pub args_prefix: String,
}

impl StubDescriptor {
    /// Descriptor for the launcher compiled into this crate.
    #[must_use]
    pub fn current() -> Self {
        Self {
            launcher_class: LAUNCHER_CLASS.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            attribute_group: AGENT_ATTRIBUTES_GROUP.to_string(),
            count_attribute: AGENT_COUNT.to_string(),
            class_prefix: AGENT_CLASS_PREFIX.to_string(),
            args_prefix: AGENT_ARGS_PREFIX.to_string(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_yaml::Error> {
        serde_yaml::to_string(self).map(String::into_bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice(bytes)
    }

    /// Whether a bundle written with this descriptor can be dispatched by
    /// the launcher in this crate. Versions may differ; the layout may not.
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        let current = Self::current();
        self.launcher_class == current.launcher_class
            && self.attribute_group == current.attribute_group
            && self.count_attribute == current.count_attribute
            && self.class_prefix == current.class_prefix
            && self.args_prefix == current.args_prefix
    }
}
