//! # Topogen - Topology compiler for Mininet network emulations
//!
//! This library turns a declarative JSON description of an emulated network
//! (hosts, switches, controllers, links, and plugin-defined custom
//! components) into a standalone Mininet Python script that builds and
//! runs that network.
//!
//! ## Overview
//!
//! Topogen separates the description of a network from the code that
//! realizes it. A topology file lists components and connections; plugins
//! extend the vocabulary with new component kinds, topology transforms and
//! generated-code fragments; the generator assembles everything into one
//! deterministic script.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `topology`: the in-memory topology model, loading and validation
//! - `plugin`: capability contracts, plugin registry and built-in units
//! - `transform`: the topology transform stage run before generation
//! - `generator`: the section builder and the Mininet script generator
//! - `emitter`: atomic output emission
//! - `orchestrator`: high-level coordination of a generation run
//! - `utils`: utility functions and helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use topogen::orchestrator;
//! use topogen::plugin::PluginRegistry;
//!
//! let mut registry = PluginRegistry::new();
//! registry.discover(Path::new("plugins"))?;
//!
//! let output = orchestrator::generate_script(
//!     Path::new("topologies/simple_star.json"),
//!     &registry,
//!     None,
//! )?;
//! println!("generated {}", output.display());
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Topology Format
//!
//! Topologies are JSON documents:
//!
//! ```json
//! {
//!   "ID": "simple_star",
//!   "COMPONENTS": {
//!     "HOSTS": [{"ID": "h1", "IP": "10.0.0.1/24"}],
//!     "SWITCHES": [{"ID": "s1"}],
//!     "CONTROLLERS": [{"ID": "c0"}]
//!   },
//!   "CONNECTIONS": [
//!     {"ENDPOINTS": ["h1", "s1"], "PARAMS": {"BANDWIDTH": 10}}
//!   ],
//!   "PLUGINS": [{"name": "NetworkMonitoring", "params": {"interval": 5}}]
//! }
//! ```
//!
//! Records require a unique `ID`; other fields pass through to the
//! generated constructor calls, so plugins and newer Mininet keywords work
//! without core changes.
//!
//! ## Error Handling
//!
//! Structural problems in a topology are collected exhaustively and
//! reported together, so a file can be fixed in one pass. The library uses
//! `color_eyre` for error reporting with context; loading produces a typed
//! `ValidationFailure` enumerating every violation.

pub mod emitter;
pub mod generator;
pub mod orchestrator;
pub mod plugin;
pub mod topology;
pub mod transform;
pub mod utils;
