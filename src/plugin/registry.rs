//! Plugin discovery and lookup.
//!
//! The registry holds every registered plugin in discovery order together
//! with its immutable [`PluginDescriptor`]. Discovery scans a directory of
//! unit manifests (small YAML files naming a registration entry point) and
//! resolves each entry against the built-in unit table. A manifest that
//! fails to parse, or names an unknown entry, is logged and skipped;
//! discovery never aborts the run for one bad unit.

use crate::plugin::builtin;
use crate::plugin::{Capability, Plugin, PluginDescriptor};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A plugin unit manifest: `entry` names a registration entry point in the
/// unit table. Extra keys are tolerated for forward compatibility.
#[derive(Debug, Deserialize)]
struct PluginManifest {
    entry: String,
}

/// Registry of discovered plugins, indexed by name, capability and owned
/// custom-group name.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
    descriptors: Vec<PluginDescriptor>,
    by_name: HashMap<String, usize>,
    group_owners: HashMap<String, usize>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin instance. The first registration of a name wins;
    /// later ones are dropped with a warning so discovery order stays
    /// deterministic.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let descriptor = PluginDescriptor::for_plugin(plugin.as_ref());
        if self.by_name.contains_key(&descriptor.name) {
            warn!("Plugin '{}' is already registered, ignoring duplicate", descriptor.name);
            return;
        }

        let index = self.plugins.len();
        if let Some(component) = plugin.as_component() {
            for group in component.owned_groups() {
                match self.group_owners.get(&group) {
                    Some(owner) => warn!(
                        "Component group '{}' is already owned by plugin '{}', ignoring claim by '{}'",
                        group, self.descriptors[*owner].name, descriptor.name
                    ),
                    None => {
                        self.group_owners.insert(group, index);
                    }
                }
            }
        }

        info!(
            "Registered plugin: {} v{} [{}]",
            descriptor.name,
            descriptor.version,
            descriptor.capabilities_label()
        );
        self.by_name.insert(descriptor.name.clone(), index);
        self.descriptors.push(descriptor);
        self.plugins.push(plugin);
    }

    /// Register every plugin of a built-in unit by entry name.
    pub fn register_unit(&mut self, entry: &str) -> Result<()> {
        let ctor = builtin::find_unit(entry)
            .ok_or_else(|| color_eyre::eyre::eyre!("Unknown plugin unit '{}'", entry))?;
        for plugin in ctor() {
            self.register(plugin);
        }
        Ok(())
    }

    /// Discover plugin units from a directory of manifests.
    ///
    /// Manifests are ordered lexically by file name before registration so
    /// discovery order is stable across runs; parsing itself happens in
    /// parallel. Returns the number of plugins registered.
    pub fn discover(&mut self, directory: &Path) -> Result<usize> {
        if !directory.exists() {
            info!("Plugin directory {:?} does not exist, skipping discovery", directory);
            return Ok(0);
        }

        let mut unit_files: Vec<PathBuf> = fs::read_dir(directory)
            .wrap_err_with(|| format!("Failed to read plugin directory '{}'", directory.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && matches!(
                        path.extension().and_then(|e| e.to_str()),
                        Some("yaml") | Some("yml")
                    )
            })
            .collect();
        unit_files.sort();

        let parsed: Vec<(PathBuf, Result<PluginManifest, String>)> = unit_files
            .par_iter()
            .map(|path| {
                let manifest = fs::read_to_string(path)
                    .map_err(|e| e.to_string())
                    .and_then(|content| {
                        serde_yaml::from_str::<PluginManifest>(&content).map_err(|e| e.to_string())
                    });
                (path.clone(), manifest)
            })
            .collect();

        let mut registered = 0;
        for (path, manifest) in parsed {
            let manifest = match manifest {
                Ok(manifest) => manifest,
                Err(error) => {
                    warn!("Failed to load plugin unit {:?}: {}", path, error);
                    continue;
                }
            };
            match builtin::find_unit(&manifest.entry) {
                Some(ctor) => {
                    for plugin in ctor() {
                        self.register(plugin);
                        registered += 1;
                    }
                }
                None => {
                    warn!(
                        "Plugin unit {:?} names unknown entry '{}', skipping",
                        path, manifest.entry
                    );
                }
            }
        }

        info!("Discovered {} plugin(s) from {:?}", registered, directory);
        Ok(registered)
    }

    /// Look up a plugin's descriptor by name.
    pub fn lookup_by_name(&self, name: &str) -> Option<&PluginDescriptor> {
        self.by_name.get(name).map(|&index| &self.descriptors[index])
    }

    /// Descriptors of every plugin implementing a capability, in discovery
    /// order.
    pub fn lookup_by_capability(&self, capability: Capability) -> Vec<&PluginDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| d.has_capability(capability))
            .collect()
    }

    /// Fetch a plugin instance by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.by_name.get(name).map(|&index| &self.plugins[index])
    }

    /// The plugin owning a custom component group, if any.
    pub fn component_owner(&self, group: &str) -> Option<&Arc<dyn Plugin>> {
        self.group_owners.get(group).map(|&index| &self.plugins[index])
    }

    /// All plugins in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Plugin>> {
        self.plugins.iter()
    }

    /// All descriptors in discovery order.
    pub fn descriptors(&self) -> &[PluginDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
