//! Plugin subsystem.
//!
//! Plugins extend the generation pipeline at three well-defined capability
//! seams:
//!
//! - **Component**: owns custom component group names (e.g. `FIREWALLS`),
//!   normalizes their records during loading and renders their
//!   instantiation statements.
//! - **Topology**: mutates or enriches the loaded model before code
//!   generation.
//! - **Codegen**: contributes generated-code fragments at four ordered
//!   insertion points (imports, pre-network, post-network, post-start).
//!
//! A plugin declares its capability set by overriding the corresponding
//! `as_*` view on the base [`Plugin`] trait; one plugin may implement
//! several capabilities at once. Discovery and lookup live in
//! [`registry`]; the units shipped with the binary live in [`builtin`].

pub mod builtin;
pub mod registry;

pub use registry::PluginRegistry;

use crate::topology::{Component, FieldMap, Topology};
use color_eyre::Result;
use std::fmt;

/// One of the three extension capabilities a plugin may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Recognizes custom component groups.
    Component,
    /// Transforms the loaded topology.
    Topology,
    /// Contributes generated-code fragments.
    Codegen,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Component => write!(f, "component"),
            Capability::Topology => write!(f, "topology"),
            Capability::Codegen => write!(f, "codegen"),
        }
    }
}

/// Base contract every plugin satisfies.
///
/// The `as_*` views express capability-set membership explicitly: a
/// capability is implemented exactly when the matching view returns `Some`.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    fn description(&self) -> &str;

    fn as_component(&self) -> Option<&dyn ComponentPlugin> {
        None
    }

    fn as_topology(&self) -> Option<&dyn TopologyPlugin> {
        None
    }

    fn as_codegen(&self) -> Option<&dyn CodegenPlugin> {
        None
    }
}

/// Component-capable plugins own custom group names and handle their
/// records end to end: normalization during loading, statement rendering
/// during generation.
pub trait ComponentPlugin: Plugin {
    /// Group names under `COMPONENTS` this plugin owns (e.g. `OVSSWITCHES`).
    fn owned_groups(&self) -> Vec<String>;

    /// Normalize one raw record (including its `ID`) into a component.
    /// Failures surface as structural validation errors naming the record.
    fn build(&self, group: &str, record: &FieldMap) -> Result<Component>;

    /// Render the instantiation statements for one built component.
    fn render(&self, component: &Component) -> Vec<String>;
}

/// Topology-capable plugins mutate the model between loading and
/// generation. Invoked once per matching plugin invocation, in input order.
pub trait TopologyPlugin: Plugin {
    fn apply(&self, topology: &mut Topology, params: &FieldMap) -> Result<()>;
}

/// Codegen-capable plugins contribute source lines at the four ordered
/// insertion points of the script skeleton.
pub trait CodegenPlugin: Plugin {
    /// Additional import statements, emitted once per referenced plugin.
    fn imports(&self) -> Vec<String>;

    /// Lines inserted after network construction, before instantiation.
    fn pre_network(&self, topology: &Topology, params: &FieldMap) -> Result<Vec<String>>;

    /// Lines inserted after all instantiation and link statements.
    fn post_network(&self, topology: &Topology, params: &FieldMap) -> Result<Vec<String>>;

    /// Lines inserted after the network start statement.
    fn post_start(&self, topology: &Topology, params: &FieldMap) -> Result<Vec<String>>;
}

/// Immutable description of a registered plugin, constructed once at
/// registration and reusable across generation runs.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub version: String,
    pub description: String,
    pub capabilities: Vec<Capability>,
}

impl PluginDescriptor {
    /// Derive the descriptor for a plugin from its capability views.
    pub fn for_plugin(plugin: &dyn Plugin) -> Self {
        let mut capabilities = Vec::new();
        if plugin.as_component().is_some() {
            capabilities.push(Capability::Component);
        }
        if plugin.as_topology().is_some() {
            capabilities.push(Capability::Topology);
        }
        if plugin.as_codegen().is_some() {
            capabilities.push(Capability::Codegen);
        }
        Self {
            name: plugin.name().to_string(),
            version: plugin.version().to_string(),
            description: plugin.description().to_string(),
            capabilities,
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Comma-separated capability list for display.
    pub fn capabilities_label(&self) -> String {
        self.capabilities
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
