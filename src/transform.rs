//! Topology transform stage.
//!
//! Runs topology-capable plugins against the loaded model, once per plugin
//! invocation, in the order the invocations appear in the input. Hooks run
//! strictly sequentially, so a mutation made by one plugin is visible to
//! every later one. A failing hook aborts the run; a partially transformed
//! topology must never reach the generator.

use crate::plugin::PluginRegistry;
use crate::topology::Topology;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{debug, info};

/// Apply every topology-capable plugin named by the topology's invocations.
pub fn apply_topology_plugins(topology: &mut Topology, registry: &PluginRegistry) -> Result<()> {
    let invocations = topology.invocations.clone();
    for invocation in &invocations {
        // The loader resolved every invocation name against the registry
        let Some(plugin) = registry.get(&invocation.name) else {
            return Err(eyre!("plugin '{}' disappeared from the registry", invocation.name));
        };

        match plugin.as_topology() {
            Some(topology_plugin) => {
                info!("Applying topology plugin '{}'", invocation.name);
                topology_plugin
                    .apply(topology, &invocation.params)
                    .wrap_err_with(|| {
                        format!("plugin '{}' failed in apply hook", invocation.name)
                    })?;
            }
            None => debug!(
                "Plugin '{}' has no topology capability, skipping transform",
                invocation.name
            ),
        }
    }
    Ok(())
}
