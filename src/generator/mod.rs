//! Mininet script generation.
//!
//! Assembles the final script from a validated (and transformed) topology
//! plus the code fragments contributed by codegen-capable plugins. The
//! skeleton is fixed: header, imports, network construction, pre-network
//! fragments, host/switch/controller/custom instantiation, links,
//! post-network fragments, start, post-start fragments, teardown. Given the
//! same topology and registry contents the output is byte-identical across
//! runs; nothing here iterates an unordered collection into the script.

pub mod builder;

pub use builder::{ScriptBuilder, Section};

use crate::plugin::{CodegenPlugin, PluginRegistry};
use crate::topology::{FieldMap, Topology};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::warn;
use serde_json::Value;
use std::collections::HashSet;

/// The topology-taking codegen insertion points, used for dispatch and
/// error context. Imports are handled separately alongside the baseline.
#[derive(Debug, Clone, Copy)]
enum Hook {
    PreNetwork,
    PostNetwork,
    PostStart,
}

impl Hook {
    fn name(self) -> &'static str {
        match self {
            Hook::PreNetwork => "pre_network",
            Hook::PostNetwork => "post_network",
            Hook::PostStart => "post_start",
        }
    }

    fn section(self) -> Section {
        match self {
            Hook::PreNetwork => Section::PreNetwork,
            Hook::PostNetwork => Section::PostNetwork,
            Hook::PostStart => Section::PostStart,
        }
    }

    fn run(
        self,
        plugin: &dyn CodegenPlugin,
        topology: &Topology,
        params: &FieldMap,
    ) -> Result<Vec<String>> {
        match self {
            Hook::PreNetwork => plugin.pre_network(topology, params),
            Hook::PostNetwork => plugin.post_network(topology, params),
            Hook::PostStart => plugin.post_start(topology, params),
        }
    }
}

/// Generates Mininet scripts from topologies.
pub struct ScriptGenerator<'a> {
    registry: &'a PluginRegistry,
}

impl<'a> ScriptGenerator<'a> {
    pub fn new(registry: &'a PluginRegistry) -> Self {
        Self { registry }
    }

    /// Produce the full script text for a topology.
    pub fn generate(&self, topology: &Topology) -> Result<String> {
        let mut builder = ScriptBuilder::new();

        self.write_header(&mut builder, topology);
        self.write_imports(&mut builder, topology);
        self.write_network_init(&mut builder, topology);
        self.write_hook(&mut builder, Hook::PreNetwork, topology)?;
        self.write_hosts(&mut builder, topology);
        self.write_switches(&mut builder, topology);
        self.write_controllers(&mut builder, topology);
        self.write_custom_components(&mut builder, topology);
        self.write_links(&mut builder, topology);
        self.write_hook(&mut builder, Hook::PostNetwork, topology)?;
        self.write_start(&mut builder);
        self.write_hook(&mut builder, Hook::PostStart, topology)?;
        self.write_teardown(&mut builder, topology);

        Ok(builder.render())
    }

    fn write_header(&self, builder: &mut ScriptBuilder, topology: &Topology) {
        builder.push(Section::Header, "\"\"\"");
        builder.push(Section::Header, "Mininet script generated automatically.");
        builder.push(
            Section::Header,
            format!("Topology: {}", capitalize(topology.display_id())),
        );
        builder.push(
            Section::Header,
            format!("Version: {}", topology.version.as_deref().unwrap_or("N/A")),
        );
        builder.push(
            Section::Header,
            format!(
                "Description: {}",
                topology
                    .description
                    .as_deref()
                    .unwrap_or("No description provided.")
            ),
        );
        builder.push(Section::Header, "\"\"\"");
    }

    fn write_imports(&self, builder: &mut ScriptBuilder, topology: &Topology) {
        builder.push(Section::Imports, "from mininet.net import Mininet");
        builder.push(
            Section::Imports,
            "from mininet.node import Controller, RemoteController, OVSKernelSwitch, UserSwitch",
        );
        builder.push(Section::Imports, "from mininet.cli import CLI");
        builder.push(Section::Imports, "from mininet.log import setLogLevel, info");
        builder.push(Section::Imports, "from mininet.link import TCLink");

        // Plugin imports follow the registry's discovery order, restricted
        // to codegen plugins actually referenced by the topology.
        let invoked: HashSet<&str> = topology.invocations.iter().map(|i| i.name.as_str()).collect();
        for plugin in self.registry.iter() {
            if !invoked.contains(plugin.name()) {
                continue;
            }
            if let Some(codegen) = plugin.as_codegen() {
                builder.extend(Section::Imports, codegen.imports());
            }
        }
        builder.push(Section::Imports, "");
    }

    fn write_network_init(&self, builder: &mut ScriptBuilder, topology: &Topology) {
        let has_controllers = !topology.controllers.is_empty();
        let controller_param = if has_controllers { "Controller" } else { "None" };
        let wait_connected = if has_controllers { "True" } else { "False" };

        builder.push(Section::NetworkInit, format!("def {}():", topology.function_name()));
        builder.push(Section::NetworkInit, "");
        builder.push(
            Section::NetworkInit,
            "\t'Creates and configures the network topology.'",
        );
        builder.push(
            Section::NetworkInit,
            format!(
                "\tnet = Mininet(controller={}, switch=OVSKernelSwitch, link=TCLink, waitConnected={})",
                controller_param, wait_connected
            ),
        );
        builder.push(Section::NetworkInit, "");
    }

    fn write_hook(&self, builder: &mut ScriptBuilder, hook: Hook, topology: &Topology) -> Result<()> {
        let section = hook.section();
        for invocation in &topology.invocations {
            let Some(plugin) = self.registry.get(&invocation.name) else {
                continue;
            };
            let Some(codegen) = plugin.as_codegen() else {
                continue;
            };
            let lines = hook
                .run(codegen, topology, &invocation.params)
                .wrap_err_with(|| {
                    format!("plugin '{}' failed in {} hook", invocation.name, hook.name())
                })?;
            if !lines.is_empty() {
                builder.extend(section, lines.into_iter().map(|line| format!("\t{}", line)));
                builder.push(section, "");
            }
        }
        Ok(())
    }

    fn write_hosts(&self, builder: &mut ScriptBuilder, topology: &Topology) {
        builder.push(
            Section::Hosts,
            format!("\tinfo('*** Adding {} hosts\\n')", topology.hosts.len()),
        );
        for host in &topology.hosts {
            let mut args = vec![format!("'{}'", host.id)];
            if let Some(ip) = host.fields.get("IP") {
                args.push(format!("ip={}", py_literal(ip)));
            }
            if let Some(mac) = host.fields.get("MAC") {
                args.push(format!("mac={}", py_literal(mac)));
            }
            args.extend(keyword_args(&host.fields, &["IP", "MAC"]));
            builder.push(
                Section::Hosts,
                format!("\t{} = net.addHost({})", host.id, args.join(", ")),
            );
        }
        builder.push(Section::Hosts, "");
    }

    fn write_switches(&self, builder: &mut ScriptBuilder, topology: &Topology) {
        builder.push(
            Section::Switches,
            format!("\tinfo('*** Adding {} switches\\n')", topology.switches.len()),
        );
        for switch in &topology.switches {
            let mut args = vec![format!("'{}'", switch.id)];
            args.extend(keyword_args(&switch.fields, &[]));
            builder.push(
                Section::Switches,
                format!("\t{} = net.addSwitch({})", switch.id, args.join(", ")),
            );
        }
        builder.push(Section::Switches, "");
    }

    fn write_controllers(&self, builder: &mut ScriptBuilder, topology: &Topology) {
        if topology.controllers.is_empty() {
            builder.push(
                Section::Controllers,
                "\tinfo('*** No controller defined. OVS will be configured for standalone mode.\\n')",
            );
            builder.push(Section::Controllers, "");
            return;
        }

        builder.push(
            Section::Controllers,
            format!("\tinfo('*** Adding {} controllers\\n')", topology.controllers.len()),
        );
        for controller in &topology.controllers {
            let line = if controller.fields.get("TYPE").and_then(|v| v.as_str())
                == Some("RemoteController")
            {
                let params = controller
                    .fields
                    .get("PARAMS")
                    .and_then(|v| v.as_object())
                    .cloned()
                    .unwrap_or_default();
                let ip = params.get("IP").and_then(|v| v.as_str()).unwrap_or("127.0.0.1");
                let port = params.get("PORT").and_then(|v| v.as_u64()).unwrap_or(6653);
                format!(
                    "\t{} = net.addController('{}', controller=RemoteController, ip='{}', port={})",
                    controller.id, controller.id, ip, port
                )
            } else {
                let mut args = vec![format!("'{}'", controller.id)];
                args.extend(keyword_args(&controller.fields, &["TYPE", "PARAMS"]));
                format!("\t{} = net.addController({})", controller.id, args.join(", "))
            };
            builder.push(Section::Controllers, line);
        }
        builder.push(Section::Controllers, "");
    }

    fn write_custom_components(&self, builder: &mut ScriptBuilder, topology: &Topology) {
        for group in &topology.custom {
            let Some(owner) = self
                .registry
                .component_owner(&group.name)
                .and_then(|plugin| plugin.as_component())
            else {
                // The loader guarantees an owner; a registry swap between
                // loading and generation is the only way to get here.
                warn!("No component plugin owns group '{}', skipping", group.name);
                continue;
            };

            builder.push(
                Section::CustomComponents,
                format!(
                    "\tinfo('*** Adding {} {}\\n')",
                    group.components.len(),
                    group.name
                ),
            );
            for component in &group.components {
                builder.extend(
                    Section::CustomComponents,
                    owner
                        .render(component)
                        .into_iter()
                        .map(|line| format!("\t{}", line)),
                );
            }
            builder.push(Section::CustomComponents, "");
        }
    }

    fn write_links(&self, builder: &mut ScriptBuilder, topology: &Topology) {
        builder.push(
            Section::Links,
            format!("\tinfo('*** Creating {} links\\n')", topology.connections.len()),
        );
        for connection in &topology.connections {
            let params: Vec<String> = connection
                .params
                .iter()
                .map(|(key, value)| format!("{}={}", link_param_name(key), py_literal(value)))
                .collect();
            let suffix = if params.is_empty() {
                String::new()
            } else {
                format!(", {}", params.join(", "))
            };
            builder.push(
                Section::Links,
                format!(
                    "\tnet.addLink({}, {}{})",
                    connection.endpoints[0], connection.endpoints[1], suffix
                ),
            );
        }
        builder.push(Section::Links, "");
    }

    fn write_start(&self, builder: &mut ScriptBuilder) {
        builder.push(Section::Start, "\tinfo('*** Starting network\\n')");
        builder.push(Section::Start, "\tnet.start()");
        builder.push(Section::Start, "");
    }

    fn write_teardown(&self, builder: &mut ScriptBuilder, topology: &Topology) {
        if topology.controllers.is_empty() && !topology.switches.is_empty() {
            builder.push(
                Section::Teardown,
                "\tinfo('*** Configuring switches for standalone mode\\n')",
            );
            for switch in &topology.switches {
                builder.push(
                    Section::Teardown,
                    format!(
                        "\tnet.get('{}').cmd('ovs-ofctl add-flow {} \"priority=0,actions=normal\"')",
                        switch.id, switch.id
                    ),
                );
            }
            builder.push(Section::Teardown, "");
        }

        builder.push(Section::Teardown, "\tinfo('*** Running CLI\\n')");
        builder.push(Section::Teardown, "\tCLI(net)");
        builder.push(Section::Teardown, "");
        builder.push(Section::Teardown, "\tinfo('*** Stopping network\\n')");
        builder.push(Section::Teardown, "\tnet.stop()");
        builder.push(Section::Teardown, "");
        builder.push(Section::Teardown, "if __name__ == '__main__':");
        builder.push(Section::Teardown, "\tsetLogLevel('info')");
        builder.push(Section::Teardown, format!("\t{}()", topology.function_name()));
    }
}

/// Render pass-through record fields as keyword arguments, lowercasing the
/// key as the original generator does. `skip` lists keys already handled.
fn keyword_args(fields: &FieldMap, skip: &[&str]) -> Vec<String> {
    fields
        .iter()
        .filter(|(key, _)| !skip.contains(&key.as_str()))
        .map(|(key, value)| format!("{}={}", key.to_lowercase(), py_literal(value)))
        .collect()
}

/// Translate a link parameter name into its TCLink keyword.
fn link_param_name(key: &str) -> String {
    match key.to_lowercase().as_str() {
        "bandwidth" => "bw".to_string(),
        "queue_size" => "max_queue_size".to_string(),
        other => other.to_string(),
    }
}

/// Render a JSON value as a Python literal. Object keys come out in sorted
/// order because `serde_json::Map` iterates sorted.
pub(crate) fn py_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => format!("'{}'", py_escape(text)),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(py_literal).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Object(map) => {
            let rendered: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("'{}': {}", py_escape(key), py_literal(value)))
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
    }
}

fn py_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{load_topology, Component, CustomGroup, PluginInvocation};
    use serde_json::json;

    fn registry_with_builtins() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register_unit("monitoring").unwrap();
        registry.register_unit("ovs_switches").unwrap();
        registry.register_unit("link_jitter").unwrap();
        registry
    }

    fn example_topology(registry: &PluginRegistry) -> Topology {
        let document = json!({
            "ID": "example",
            "COMPONENTS": {
                "HOSTS": [
                    {"ID": "h1", "IP": "10.0.0.1/24"},
                    {"ID": "h2", "IP": "10.0.0.2/24"}
                ],
                "SWITCHES": [{"ID": "s1"}]
            },
            "CONNECTIONS": [
                {"ENDPOINTS": ["h1", "s1"], "PARAMS": {"BANDWIDTH": 10}}
            ]
        });
        load_topology(&document, registry).unwrap()
    }

    #[test]
    fn test_py_literal() {
        assert_eq!(py_literal(&json!(null)), "None");
        assert_eq!(py_literal(&json!(true)), "True");
        assert_eq!(py_literal(&json!(false)), "False");
        assert_eq!(py_literal(&json!(10)), "10");
        assert_eq!(py_literal(&json!(0.5)), "0.5");
        assert_eq!(py_literal(&json!("5ms")), "'5ms'");
        assert_eq!(py_literal(&json!("it's")), "'it\\'s'");
        assert_eq!(py_literal(&json!([1, "a"])), "[1, 'a']");
        assert_eq!(py_literal(&json!({"b": 1, "a": 2})), "{'a': 2, 'b': 1}");
    }

    #[test]
    fn test_example_topology_output() {
        let registry = registry_with_builtins();
        let topology = example_topology(&registry);
        let script = ScriptGenerator::new(&registry).generate(&topology).unwrap();

        let h1 = script.find("h1 = net.addHost('h1', ip='10.0.0.1/24')").unwrap();
        let h2 = script.find("h2 = net.addHost('h2', ip='10.0.0.2/24')").unwrap();
        let s1 = script.find("s1 = net.addSwitch('s1')").unwrap();
        let link = script.find("net.addLink(h1, s1, bw=10)").unwrap();

        // Instantiation order: hosts in input order, then switches, and
        // every endpoint before its link.
        assert!(h1 < h2);
        assert!(h2 < s1);
        assert!(s1 < link);
    }

    #[test]
    fn test_standalone_mode_without_controllers() {
        let registry = registry_with_builtins();
        let topology = example_topology(&registry);
        let script = ScriptGenerator::new(&registry).generate(&topology).unwrap();

        assert!(script.contains("net = Mininet(controller=None, switch=OVSKernelSwitch, link=TCLink, waitConnected=False)"));
        assert!(script.contains("ovs-ofctl add-flow s1"));
        assert!(script.contains("*** No controller defined."));
    }

    #[test]
    fn test_controllers_enable_wait_connected() {
        let registry = registry_with_builtins();
        let document = json!({
            "COMPONENTS": {
                "HOSTS": [{"ID": "h1"}],
                "CONTROLLERS": [
                    {"ID": "c0"},
                    {"ID": "c1", "TYPE": "RemoteController", "PARAMS": {"IP": "10.0.0.100", "PORT": 6653}}
                ]
            },
            "CONNECTIONS": []
        });
        let topology = load_topology(&document, &registry).unwrap();
        let script = ScriptGenerator::new(&registry).generate(&topology).unwrap();

        assert!(script.contains("net = Mininet(controller=Controller, switch=OVSKernelSwitch, link=TCLink, waitConnected=True)"));
        assert!(script.contains("c0 = net.addController('c0')"));
        assert!(script.contains(
            "c1 = net.addController('c1', controller=RemoteController, ip='10.0.0.100', port=6653)"
        ));
        assert!(!script.contains("ovs-ofctl"));
    }

    #[test]
    fn test_unrecognized_fields_pass_through() {
        let registry = registry_with_builtins();
        let document = json!({
            "COMPONENTS": {
                "HOSTS": [{"ID": "h1", "IP": "10.0.0.1", "CPU": 0.5, "INNAMESPACE": true}]
            },
            "CONNECTIONS": []
        });
        let topology = load_topology(&document, &registry).unwrap();
        let script = ScriptGenerator::new(&registry).generate(&topology).unwrap();

        assert!(script.contains("h1 = net.addHost('h1', ip='10.0.0.1', cpu=0.5, innamespace=True)"));
    }

    #[test]
    fn test_link_param_translation() {
        let registry = registry_with_builtins();
        let document = json!({
            "COMPONENTS": {"HOSTS": [{"ID": "h1"}], "SWITCHES": [{"ID": "s1"}]},
            "CONNECTIONS": [{
                "ENDPOINTS": ["h1", "s1"],
                "PARAMS": {"BANDWIDTH": 100, "DELAY": "3ms", "LOSS": 0.5, "QUEUE_SIZE": 1000, "JITTER": "1ms"}
            }]
        });
        let topology = load_topology(&document, &registry).unwrap();
        let script = ScriptGenerator::new(&registry).generate(&topology).unwrap();

        assert!(script.contains(
            "net.addLink(h1, s1, bw=100, delay='3ms', jitter='1ms', loss=0.5, max_queue_size=1000)"
        ));
    }

    #[test]
    fn test_custom_components_render_via_plugin() {
        let registry = registry_with_builtins();
        let document = json!({
            "COMPONENTS": {
                "HOSTS": [{"ID": "h1"}],
                "OVSSWITCHES": [{"ID": "ovs1", "STP": true}]
            },
            "CONNECTIONS": [{"ENDPOINTS": ["h1", "ovs1"]}]
        });
        let topology = load_topology(&document, &registry).unwrap();
        let script = ScriptGenerator::new(&registry).generate(&topology).unwrap();

        let ovs = script
            .find("ovs1 = net.addSwitch('ovs1', cls=OVSKernelSwitch, stp=True)")
            .unwrap();
        let link = script.find("net.addLink(h1, ovs1)").unwrap();
        assert!(script.contains("info('*** Adding 1 OVSSWITCHES\\n')"));
        assert!(ovs < link);
    }

    #[test]
    fn test_plugin_imports_only_for_invoked_plugins() {
        let registry = registry_with_builtins();

        let mut topology = example_topology(&registry);
        let without = ScriptGenerator::new(&registry).generate(&topology).unwrap();
        assert!(!without.contains("import threading"));

        topology.invocations.push(PluginInvocation {
            name: "NetworkMonitoring".to_string(),
            params: FieldMap::new(),
        });
        let with = ScriptGenerator::new(&registry).generate(&topology).unwrap();
        assert!(with.contains("import threading"));
        // Plugin imports land inside the import block, before the function.
        assert!(with.find("import threading").unwrap() < with.find("def example_topology").unwrap());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let registry = registry_with_builtins();
        let mut topology = example_topology(&registry);
        topology.invocations.push(PluginInvocation {
            name: "NetworkMonitoring".to_string(),
            params: FieldMap::new(),
        });
        topology.custom.push(CustomGroup {
            name: "OVSSWITCHES".to_string(),
            components: vec![Component::new("ovs1", "OVSSWITCHES", FieldMap::new())],
        });

        let generator = ScriptGenerator::new(&registry);
        let first = generator.generate(&topology).unwrap();
        let second = generator.generate(&topology).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_endpoints_precede_links_everywhere() {
        let registry = registry_with_builtins();
        let document = json!({
            "COMPONENTS": {
                "HOSTS": [{"ID": "h1"}, {"ID": "h2"}],
                "SWITCHES": [{"ID": "s1"}, {"ID": "s2"}],
                "CONTROLLERS": [{"ID": "c0"}]
            },
            "CONNECTIONS": [
                {"ENDPOINTS": ["h1", "s1"]},
                {"ENDPOINTS": ["s1", "s2"]},
                {"ENDPOINTS": ["h2", "s2"]}
            ]
        });
        let topology = load_topology(&document, &registry).unwrap();
        let script = ScriptGenerator::new(&registry).generate(&topology).unwrap();

        let first_link = script.find("net.addLink(").unwrap();
        for statement in [
            "h1 = net.addHost",
            "h2 = net.addHost",
            "s1 = net.addSwitch",
            "s2 = net.addSwitch",
            "c0 = net.addController",
        ] {
            assert!(script.find(statement).unwrap() < first_link, "{} after a link", statement);
        }
    }
}
