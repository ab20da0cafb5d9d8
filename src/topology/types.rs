//! Topology model type definitions.
//!
//! Pure data: the in-memory representation of a declarative network as
//! parsed from a topology JSON file. Construction and validation live in
//! the loader; mutation happens only during the transform stage, after
//! which the model is treated as read-only by the generator.

use serde_json::Value;

/// Field map used for component fields, connection parameters and plugin
/// parameters. `serde_json::Map` iterates in sorted key order, which keeps
/// emission deterministic.
pub type FieldMap = serde_json::Map<String, Value>;

/// The three component groups every topology may use without plugins.
pub const BUILTIN_GROUPS: [&str; 3] = ["HOSTS", "SWITCHES", "CONTROLLERS"];

/// A single network component (host, switch, controller, or a member of a
/// custom plugin-owned group).
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Unique ID across the whole topology; doubles as the variable name in
    /// the generated script.
    pub id: String,
    /// Group the component was declared under (e.g. `HOSTS`).
    pub group: String,
    /// Every record field other than `ID`, verbatim.
    pub fields: FieldMap,
}

impl Component {
    pub fn new(id: impl Into<String>, group: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            fields,
        }
    }
}

/// A link between exactly two components. Endpoint order is significant.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub endpoints: [String; 2],
    /// Traffic-shaping parameters (BANDWIDTH, DELAY, LOSS, QUEUE_SIZE,
    /// JITTER, ...), opaque to the core and passed through to the script.
    pub params: FieldMap,
}

/// A plugin listed under `PLUGINS`: a registry lookup key plus parameters
/// handed to every hook of that plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginInvocation {
    pub name: String,
    pub params: FieldMap,
}

/// An ordered custom component group owned by a component-capable plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomGroup {
    pub name: String,
    pub components: Vec<Component>,
}

/// The in-memory representation of a declarative network.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Optional topology ID, lowercased on load.
    pub id: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub hosts: Vec<Component>,
    pub switches: Vec<Component>,
    pub controllers: Vec<Component>,
    /// Custom groups in deterministic (sorted key) order.
    pub custom: Vec<CustomGroup>,
    pub connections: Vec<Connection>,
    pub invocations: Vec<PluginInvocation>,
}

impl Topology {
    /// Topology ID used in generated names, with the original's fallback.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("unknown_topology")
    }

    /// Name of the topology function in the generated script.
    pub fn function_name(&self) -> String {
        format!("{}_topology", self.display_id())
    }

    /// Iterate all components in emission order: hosts, switches,
    /// controllers, then custom groups.
    pub fn all_components(&self) -> impl Iterator<Item = &Component> {
        self.hosts
            .iter()
            .chain(self.switches.iter())
            .chain(self.controllers.iter())
            .chain(self.custom.iter().flat_map(|g| g.components.iter()))
    }

    /// Whether any component in any group carries the given ID.
    pub fn contains_id(&self, id: &str) -> bool {
        self.all_components().any(|c| c.id == id)
    }

    /// Total number of components across all groups.
    pub fn component_count(&self) -> usize {
        self.all_components().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(id: &str, group: &str) -> Component {
        Component::new(id, group, FieldMap::new())
    }

    #[test]
    fn test_function_name_defaults() {
        let topology = Topology::default();
        assert_eq!(topology.function_name(), "unknown_topology_topology");

        let named = Topology {
            id: Some("simple_star".to_string()),
            ..Topology::default()
        };
        assert_eq!(named.function_name(), "simple_star_topology");
    }

    #[test]
    fn test_all_components_order() {
        let topology = Topology {
            hosts: vec![component("h1", "HOSTS"), component("h2", "HOSTS")],
            switches: vec![component("s1", "SWITCHES")],
            controllers: vec![component("c0", "CONTROLLERS")],
            custom: vec![CustomGroup {
                name: "OVSSWITCHES".to_string(),
                components: vec![component("ovs1", "OVSSWITCHES")],
            }],
            ..Topology::default()
        };

        let ids: Vec<&str> = topology.all_components().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["h1", "h2", "s1", "c0", "ovs1"]);
        assert_eq!(topology.component_count(), 5);
        assert!(topology.contains_id("ovs1"));
        assert!(!topology.contains_id("h3"));
    }
}
