//! Topology loading and structural validation.
//!
//! Turns a parsed topology document into a validated [`Topology`]. All
//! violations are collected into one [`ValidationFailure`] so a topology
//! file can be fixed in a single pass. Custom component groups are handed
//! to their owning component-capable plugin for normalization; a group
//! without an owner, like a `PLUGINS` entry without a registered plugin,
//! is a validation error.

use crate::plugin::PluginRegistry;
use crate::topology::types::{
    Component, Connection, CustomGroup, FieldMap, PluginInvocation, Topology, BUILTIN_GROUPS,
};
use crate::utils::ident::is_valid_identifier;
use color_eyre::eyre::WrapErr;
use log::info;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// A single structural violation found while loading a topology.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("topology document must be a JSON object")]
    DocumentNotObject,
    #[error("'{section}' section is missing")]
    MissingSection { section: String },
    #[error("'{section}' must be {expected}")]
    SectionWrongType { section: String, expected: String },
    #[error("topology ID '{id}' is not a valid identifier")]
    InvalidTopologyId { id: String },
    #[error("record {index} in group '{group}' is not an object")]
    RecordNotObject { group: String, index: usize },
    #[error("record {index} in group '{group}' is missing a non-empty ID")]
    MissingId { group: String, index: usize },
    #[error("component ID '{id}' in group '{group}' is not a valid identifier")]
    InvalidId { group: String, id: String },
    #[error("duplicate component ID '{id}' (first seen in group '{first_group}', again in '{second_group}')")]
    DuplicateId {
        id: String,
        first_group: String,
        second_group: String,
    },
    #[error("component group '{group}' has no registered component plugin")]
    UnknownGroup { group: String },
    #[error("plugin '{plugin}' rejected record {index} in group '{group}': {message}")]
    ComponentBuild {
        plugin: String,
        group: String,
        index: usize,
        message: String,
    },
    #[error("connection {index} is not an object")]
    ConnectionNotObject { index: usize },
    #[error("connection {index}: ENDPOINTS must be a two-element array of component IDs")]
    MalformedEndpoints { index: usize },
    #[error("connection {index}: endpoint '{endpoint}' does not match any component ID")]
    DanglingEndpoint { index: usize, endpoint: String },
    #[error("connection {index}: PARAMS must be an object")]
    ConnectionParamsNotObject { index: usize },
    #[error("plugin invocation {index} is missing a 'name'")]
    MissingPluginName { index: usize },
    #[error("plugin invocation {index}: 'params' must be an object")]
    PluginParamsNotObject { index: usize },
    #[error("plugin '{name}' is not present in the registry")]
    UnresolvedPlugin { name: String },
}

/// Aggregate of every violation found in one loading pass.
#[derive(Debug)]
pub struct ValidationFailure {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "topology validation failed with {} issue(s):", self.issues.len())?;
        for issue in &self.issues {
            writeln!(f, "  - {}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Load and validate a topology from a file path.
pub fn load_topology_file(path: &Path, registry: &PluginRegistry) -> color_eyre::Result<Topology> {
    info!("Loading topology from: {:?}", path);
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read topology file '{}'", path.display()))?;
    let document: Value = serde_json::from_str(&content)
        .wrap_err_with(|| format!("Topology file '{}' is not valid JSON", path.display()))?;
    let topology = load_topology(&document, registry)?;
    Ok(topology)
}

/// Load and validate a topology from a parsed JSON document.
pub fn load_topology(
    document: &Value,
    registry: &PluginRegistry,
) -> Result<Topology, ValidationFailure> {
    let mut issues = Vec::new();

    let Some(root) = document.as_object() else {
        return Err(ValidationFailure {
            issues: vec![ValidationIssue::DocumentNotObject],
        });
    };

    let mut topology = Topology {
        id: optional_string(root, "ID").map(|id| id.to_lowercase()),
        version: optional_string(root, "VERSION"),
        description: optional_string(root, "DESCRIPTION"),
        ..Topology::default()
    };

    if let Some(id) = &topology.id {
        if !is_valid_identifier(id) {
            issues.push(ValidationIssue::InvalidTopologyId { id: id.clone() });
        }
    }

    parse_components(root, registry, &mut topology, &mut issues);
    check_unique_ids(&topology, &mut issues);

    let mut connections = Vec::new();
    parse_connections(root, &topology, &mut connections, &mut issues);
    topology.connections = connections;

    parse_invocations(root, registry, &mut topology.invocations, &mut issues);

    if !issues.is_empty() {
        return Err(ValidationFailure { issues });
    }

    info!(
        "Loaded topology '{}' ({} components, {} connections, {} plugin invocations)",
        topology.display_id(),
        topology.component_count(),
        topology.connections.len(),
        topology.invocations.len()
    );
    Ok(topology)
}

fn optional_string(root: &FieldMap, key: &str) -> Option<String> {
    root.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn parse_components(
    root: &FieldMap,
    registry: &PluginRegistry,
    topology: &mut Topology,
    issues: &mut Vec<ValidationIssue>,
) {
    let components = match root.get("COMPONENTS") {
        None => {
            issues.push(ValidationIssue::MissingSection {
                section: "COMPONENTS".to_string(),
            });
            return;
        }
        Some(value) => match value.as_object() {
            Some(map) => map,
            None => {
                issues.push(ValidationIssue::SectionWrongType {
                    section: "COMPONENTS".to_string(),
                    expected: "an object".to_string(),
                });
                return;
            }
        },
    };

    for group in BUILTIN_GROUPS {
        if let Some(records) = components.get(group) {
            let parsed = parse_builtin_group(group, records, issues);
            match group {
                "HOSTS" => topology.hosts = parsed,
                "SWITCHES" => topology.switches = parsed,
                _ => topology.controllers = parsed,
            }
        }
    }

    // serde_json::Map iterates in sorted key order, so custom group order
    // is stable across runs.
    for (group, records) in components {
        if BUILTIN_GROUPS.contains(&group.as_str()) {
            continue;
        }
        let Some(owner) = registry.component_owner(group) else {
            issues.push(ValidationIssue::UnknownGroup { group: group.clone() });
            continue;
        };
        let Some(component_plugin) = owner.as_component() else {
            issues.push(ValidationIssue::UnknownGroup { group: group.clone() });
            continue;
        };

        let Some(records) = expect_group_array(group, records, issues) else {
            continue;
        };

        let mut built = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let Some(record) = expect_record(group, index, record, issues) else {
                continue;
            };
            match component_plugin.build(group, record) {
                Ok(component) => built.push(component),
                Err(error) => issues.push(ValidationIssue::ComponentBuild {
                    plugin: owner.name().to_string(),
                    group: group.clone(),
                    index,
                    message: error.to_string(),
                }),
            }
        }
        topology.custom.push(CustomGroup {
            name: group.clone(),
            components: built,
        });
    }
}

fn parse_builtin_group(
    group: &str,
    records: &Value,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<Component> {
    let Some(records) = expect_group_array(group, records, issues) else {
        return Vec::new();
    };

    let mut components = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let Some(record) = expect_record(group, index, record, issues) else {
            continue;
        };
        let mut fields = record.clone();
        fields.remove("ID");
        // expect_record already validated the ID
        let id = record.get("ID").and_then(|v| v.as_str()).unwrap_or_default();
        components.push(Component::new(id, group, fields));
    }
    components
}

/// Validate the common record shape: an object with a non-empty,
/// identifier-safe `ID`. Pushes issues and returns `None` on failure.
fn expect_record<'a>(
    group: &str,
    index: usize,
    record: &'a Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<&'a FieldMap> {
    let Some(map) = record.as_object() else {
        issues.push(ValidationIssue::RecordNotObject {
            group: group.to_string(),
            index,
        });
        return None;
    };
    match map.get("ID").and_then(|v| v.as_str()) {
        None | Some("") => {
            issues.push(ValidationIssue::MissingId {
                group: group.to_string(),
                index,
            });
            None
        }
        Some(id) if !is_valid_identifier(id) => {
            issues.push(ValidationIssue::InvalidId {
                group: group.to_string(),
                id: id.to_string(),
            });
            None
        }
        Some(_) => Some(map),
    }
}

fn expect_group_array<'a>(
    group: &str,
    records: &'a Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<&'a Vec<Value>> {
    match records.as_array() {
        Some(array) => Some(array),
        None => {
            issues.push(ValidationIssue::SectionWrongType {
                section: group.to_string(),
                expected: "an array of records".to_string(),
            });
            None
        }
    }
}

fn check_unique_ids(topology: &Topology, issues: &mut Vec<ValidationIssue>) {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for component in topology.all_components() {
        match seen.get(component.id.as_str()) {
            Some(first_group) => issues.push(ValidationIssue::DuplicateId {
                id: component.id.clone(),
                first_group: first_group.to_string(),
                second_group: component.group.clone(),
            }),
            None => {
                seen.insert(&component.id, &component.group);
            }
        }
    }
}

fn parse_connections(
    root: &FieldMap,
    topology: &Topology,
    connections: &mut Vec<Connection>,
    issues: &mut Vec<ValidationIssue>,
) {
    let entries = match root.get("CONNECTIONS") {
        None => {
            issues.push(ValidationIssue::MissingSection {
                section: "CONNECTIONS".to_string(),
            });
            return;
        }
        Some(value) => match value.as_array() {
            Some(array) => array,
            None => {
                issues.push(ValidationIssue::SectionWrongType {
                    section: "CONNECTIONS".to_string(),
                    expected: "an array".to_string(),
                });
                return;
            }
        },
    };

    for (index, entry) in entries.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            issues.push(ValidationIssue::ConnectionNotObject { index });
            continue;
        };

        let endpoints = entry
            .get("ENDPOINTS")
            .and_then(|v| v.as_array())
            .filter(|pair| pair.len() == 2)
            .and_then(|pair| Some([pair[0].as_str()?.to_string(), pair[1].as_str()?.to_string()]));
        let Some(endpoints) = endpoints else {
            issues.push(ValidationIssue::MalformedEndpoints { index });
            continue;
        };

        let mut resolved = true;
        for endpoint in &endpoints {
            if !topology.contains_id(endpoint) {
                issues.push(ValidationIssue::DanglingEndpoint {
                    index,
                    endpoint: endpoint.clone(),
                });
                resolved = false;
            }
        }

        let params = match entry.get("PARAMS") {
            None => FieldMap::new(),
            Some(value) => match value.as_object() {
                Some(map) => map.clone(),
                None => {
                    issues.push(ValidationIssue::ConnectionParamsNotObject { index });
                    continue;
                }
            },
        };

        if resolved {
            connections.push(Connection { endpoints, params });
        }
    }
}

fn parse_invocations(
    root: &FieldMap,
    registry: &PluginRegistry,
    invocations: &mut Vec<PluginInvocation>,
    issues: &mut Vec<ValidationIssue>,
) {
    let entries = match root.get("PLUGINS") {
        None => return,
        Some(value) => match value.as_array() {
            Some(array) => array,
            None => {
                issues.push(ValidationIssue::SectionWrongType {
                    section: "PLUGINS".to_string(),
                    expected: "an array".to_string(),
                });
                return;
            }
        },
    };

    for (index, entry) in entries.iter().enumerate() {
        let Some(name) = entry.get("name").and_then(|v| v.as_str()).filter(|n| !n.is_empty())
        else {
            issues.push(ValidationIssue::MissingPluginName { index });
            continue;
        };

        if registry.lookup_by_name(name).is_none() {
            issues.push(ValidationIssue::UnresolvedPlugin {
                name: name.to_string(),
            });
            continue;
        }

        let params = match entry.get("params") {
            None => FieldMap::new(),
            Some(value) => match value.as_object() {
                Some(map) => map.clone(),
                None => {
                    issues.push(ValidationIssue::PluginParamsNotObject { index });
                    continue;
                }
            },
        };

        invocations.push(PluginInvocation {
            name: name.to_string(),
            params,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry_with_builtins() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register_unit("monitoring").unwrap();
        registry.register_unit("ovs_switches").unwrap();
        registry.register_unit("link_jitter").unwrap();
        registry
    }

    fn issues_of(document: serde_json::Value, registry: &PluginRegistry) -> Vec<ValidationIssue> {
        load_topology(&document, registry).unwrap_err().issues
    }

    #[test]
    fn test_load_full_topology() {
        let registry = registry_with_builtins();
        let document = json!({
            "ID": "Simple_Star",
            "VERSION": "1.0",
            "DESCRIPTION": "Star with one switch",
            "COMPONENTS": {
                "HOSTS": [
                    {"ID": "h1", "IP": "10.0.0.1/24"},
                    {"ID": "h2", "IP": "10.0.0.2/24"}
                ],
                "SWITCHES": [{"ID": "s1"}],
                "CONTROLLERS": [{"ID": "c0"}],
                "OVSSWITCHES": [{"ID": "ovs1", "STP": true}]
            },
            "CONNECTIONS": [
                {"ENDPOINTS": ["h1", "s1"], "PARAMS": {"BANDWIDTH": 10}},
                {"ENDPOINTS": ["h2", "s1"]}
            ],
            "PLUGINS": [{"name": "NetworkMonitoring", "params": {"interval": 5}}]
        });

        let topology = load_topology(&document, &registry).unwrap();
        assert_eq!(topology.id.as_deref(), Some("simple_star"));
        assert_eq!(topology.version.as_deref(), Some("1.0"));
        assert_eq!(topology.hosts.len(), 2);
        assert_eq!(topology.switches.len(), 1);
        assert_eq!(topology.controllers.len(), 1);
        assert_eq!(topology.custom.len(), 1);
        assert_eq!(topology.custom[0].name, "OVSSWITCHES");
        assert_eq!(topology.connections.len(), 2);
        assert_eq!(topology.connections[0].endpoints, ["h1", "s1"]);
        assert_eq!(topology.invocations.len(), 1);
        assert_eq!(topology.invocations[0].name, "NetworkMonitoring");

        // ID is stripped from the field map; the rest passes through.
        assert!(!topology.hosts[0].fields.contains_key("ID"));
        assert_eq!(topology.hosts[0].fields.get("IP"), Some(&json!("10.0.0.1/24")));
    }

    #[test]
    fn test_duplicate_ids_across_groups() {
        let registry = registry_with_builtins();
        let issues = issues_of(
            json!({
                "COMPONENTS": {
                    "HOSTS": [{"ID": "n1"}],
                    "SWITCHES": [{"ID": "n1"}]
                },
                "CONNECTIONS": []
            }),
            &registry,
        );

        assert!(issues.contains(&ValidationIssue::DuplicateId {
            id: "n1".to_string(),
            first_group: "HOSTS".to_string(),
            second_group: "SWITCHES".to_string(),
        }));
    }

    #[test]
    fn test_dangling_endpoint_names_connection_index() {
        let registry = registry_with_builtins();
        let issues = issues_of(
            json!({
                "COMPONENTS": {"HOSTS": [{"ID": "h1"}], "SWITCHES": [{"ID": "s1"}]},
                "CONNECTIONS": [
                    {"ENDPOINTS": ["h1", "s1"]},
                    {"ENDPOINTS": ["h1", "ghost"]}
                ]
            }),
            &registry,
        );

        assert_eq!(
            issues,
            vec![ValidationIssue::DanglingEndpoint {
                index: 1,
                endpoint: "ghost".to_string(),
            }]
        );
    }

    #[test]
    fn test_malformed_endpoints() {
        let registry = registry_with_builtins();
        let issues = issues_of(
            json!({
                "COMPONENTS": {"HOSTS": [{"ID": "h1"}]},
                "CONNECTIONS": [{"ENDPOINTS": ["h1"]}]
            }),
            &registry,
        );
        assert_eq!(issues, vec![ValidationIssue::MalformedEndpoints { index: 0 }]);
    }

    #[test]
    fn test_unknown_custom_group() {
        let registry = PluginRegistry::new();
        let issues = issues_of(
            json!({
                "COMPONENTS": {"FIREWALLS": [{"ID": "fw1"}]},
                "CONNECTIONS": []
            }),
            &registry,
        );
        assert_eq!(
            issues,
            vec![ValidationIssue::UnknownGroup {
                group: "FIREWALLS".to_string()
            }]
        );
    }

    #[test]
    fn test_unresolved_plugin_name() {
        let registry = PluginRegistry::new();
        let issues = issues_of(
            json!({
                "COMPONENTS": {"HOSTS": [{"ID": "h1"}]},
                "CONNECTIONS": [],
                "PLUGINS": [{"name": "NoSuchPlugin"}]
            }),
            &registry,
        );
        assert_eq!(
            issues,
            vec![ValidationIssue::UnresolvedPlugin {
                name: "NoSuchPlugin".to_string()
            }]
        );
    }

    #[test]
    fn test_all_issues_collected_in_one_pass() {
        let registry = PluginRegistry::new();
        let issues = issues_of(
            json!({
                "COMPONENTS": {
                    "HOSTS": [{"ID": "h1"}, {"IP": "10.0.0.2"}, {"ID": "h1"}],
                    "FIREWALLS": [{"ID": "fw1"}]
                },
                "CONNECTIONS": [{"ENDPOINTS": ["h1", "missing"]}],
                "PLUGINS": [{"name": "NoSuchPlugin"}]
            }),
            &registry,
        );

        // One pass reports the missing ID, the duplicate, the unowned
        // group, the dangling endpoint and the unresolved plugin together.
        assert_eq!(issues.len(), 5);
    }

    #[test]
    fn test_invalid_identifier_ids() {
        let registry = registry_with_builtins();
        let issues = issues_of(
            json!({
                "ID": "bad topology name",
                "COMPONENTS": {"HOSTS": [{"ID": "h-1"}]},
                "CONNECTIONS": []
            }),
            &registry,
        );

        assert!(issues.contains(&ValidationIssue::InvalidTopologyId {
            id: "bad topology name".to_string()
        }));
        assert!(issues.contains(&ValidationIssue::InvalidId {
            group: "HOSTS".to_string(),
            id: "h-1".to_string()
        }));
    }

    #[test]
    fn test_component_build_failure_is_collected() {
        let registry = registry_with_builtins();
        let issues = issues_of(
            json!({
                "COMPONENTS": {"OVSSWITCHES": [{"ID": "ovs1", "STP": "yes"}]},
                "CONNECTIONS": []
            }),
            &registry,
        );

        assert_eq!(issues.len(), 1);
        match &issues[0] {
            ValidationIssue::ComponentBuild { plugin, group, index, .. } => {
                assert_eq!(plugin, "OvsSwitch");
                assert_eq!(group, "OVSSWITCHES");
                assert_eq!(*index, 0);
            }
            other => panic!("unexpected issue: {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_sections() {
        let registry = PluginRegistry::new();
        let issues = issues_of(json!({}), &registry);
        assert!(issues.contains(&ValidationIssue::MissingSection {
            section: "COMPONENTS".to_string()
        }));
        assert!(issues.contains(&ValidationIssue::MissingSection {
            section: "CONNECTIONS".to_string()
        }));
    }

    #[test]
    fn test_failure_display_lists_every_issue() {
        let failure = ValidationFailure {
            issues: vec![
                ValidationIssue::MissingId {
                    group: "HOSTS".to_string(),
                    index: 0,
                },
                ValidationIssue::UnresolvedPlugin {
                    name: "Ghost".to_string(),
                },
            ],
        };
        let rendered = failure.to_string();
        assert!(rendered.contains("2 issue(s)"));
        assert!(rendered.contains("missing a non-empty ID"));
        assert!(rendered.contains("Ghost"));
    }
}
