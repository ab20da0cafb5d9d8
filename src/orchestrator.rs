//! Generation pipeline orchestrator.
//!
//! Coordinates a full run: load and validate the topology, apply topology
//! plugins, assemble the script, emit it. The pipeline is synchronous and
//! runs to completion; any stage failing aborts the run before output is
//! written.

use crate::emitter;
use crate::generator::ScriptGenerator;
use crate::plugin::PluginRegistry;
use crate::topology::{self, Topology};
use crate::transform;
use color_eyre::Result;
use log::info;
use std::path::{Path, PathBuf};

/// Generate a Mininet script from a topology file using an already
/// populated registry. Returns the path of the emitted script.
pub fn generate_script(
    topology_path: &Path,
    registry: &PluginRegistry,
    output: Option<&Path>,
) -> Result<PathBuf> {
    let mut topology = topology::load_topology_file(topology_path, registry)?;

    transform::apply_topology_plugins(&mut topology, registry)?;

    let script = ScriptGenerator::new(registry).generate(&topology)?;

    let output_path = match output {
        Some(path) => path.to_path_buf(),
        None => default_output_path(&topology, topology_path),
    };
    emitter::emit_script(&output_path, &script)?;

    info!(
        "Generated script for topology '{}' ({} components, {} links)",
        topology.display_id(),
        topology.component_count(),
        topology.connections.len()
    );
    Ok(output_path)
}

/// Derive the output file name from the topology ID, falling back to the
/// input file stem when the topology carries no ID.
fn default_output_path(topology: &Topology, input: &Path) -> PathBuf {
    let stem = match &topology.id {
        Some(id) => id.clone(),
        None => input
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "topology".to_string()),
    };
    PathBuf::from(format!("{}_net.py", stem))
}
