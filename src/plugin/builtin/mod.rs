//! Built-in plugin units.
//!
//! Each unit exposes a fixed registration entry point returning its plugin
//! instances. Discovery resolves the `entry` name of a manifest in the
//! plugin directory against this table, so dropping a manifest file into
//! the directory activates a unit without any symbol introspection.
//! Third-party code bypasses the table and hands instances straight to
//! [`crate::plugin::PluginRegistry::register`].

pub mod link_jitter;
pub mod monitoring;
pub mod ovs_switches;

use crate::plugin::Plugin;
use std::sync::Arc;

/// Registration entry point signature for a plugin unit.
pub type UnitConstructor = fn() -> Vec<Arc<dyn Plugin>>;

/// Registration table mapping unit entry names to their constructors.
pub fn unit_constructors() -> &'static [(&'static str, UnitConstructor)] {
    &[
        ("link_jitter", link_jitter::register),
        ("monitoring", monitoring::register),
        ("ovs_switches", ovs_switches::register),
    ]
}

/// Resolve a manifest entry name to its unit constructor.
pub fn find_unit(entry: &str) -> Option<UnitConstructor> {
    unit_constructors()
        .iter()
        .find(|(name, _)| *name == entry)
        .map(|(_, ctor)| *ctor)
}
