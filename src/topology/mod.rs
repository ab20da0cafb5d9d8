//! Network topology model and loading.
//!
//! `types` holds the pure data model; `loader` turns parsed JSON into a
//! validated [`Topology`], collecting every structural violation instead of
//! stopping at the first.

pub mod loader;
pub mod types;

pub use loader::{load_topology, load_topology_file, ValidationFailure, ValidationIssue};
pub use types::{
    Component, Connection, CustomGroup, FieldMap, PluginInvocation, Topology, BUILTIN_GROUPS,
};
