//! Link jitter plugin.
//!
//! Dual-capability unit: as a topology plugin it stamps a `JITTER`
//! parameter onto connections (all of them, or only the pairs listed in
//! the `links` parameter); as a codegen plugin it reports the resulting
//! jitter profile in the generated script. Parameters:
//!
//! - `value`: jitter value to apply (default `"1ms"`)
//! - `links`: optional list of `[a, b]` endpoint pairs to restrict to

use crate::plugin::{CodegenPlugin, Plugin, TopologyPlugin};
use crate::topology::{Connection, FieldMap, Topology};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

/// Registration entry point for the `link_jitter` unit.
pub fn register() -> Vec<Arc<dyn Plugin>> {
    vec![Arc::new(LinkJitter)]
}

pub struct LinkJitter;

impl LinkJitter {
    /// Parse the optional `links` parameter into an endpoint-pair set.
    /// Pairs match regardless of endpoint order.
    fn target_pairs(params: &FieldMap) -> Result<Option<HashSet<(String, String)>>> {
        let Some(links) = params.get("links") else {
            return Ok(None);
        };
        let entries = links
            .as_array()
            .ok_or_else(|| eyre!("'links' must be an array of [a, b] endpoint pairs"))?;

        let mut pairs = HashSet::new();
        for entry in entries {
            let pair = entry
                .as_array()
                .filter(|p| p.len() == 2)
                .and_then(|p| Some((p[0].as_str()?, p[1].as_str()?)))
                .ok_or_else(|| {
                    eyre!("'links' entries must be two-element arrays of component IDs")
                })?;
            pairs.insert(Self::normalize(pair.0, pair.1));
        }
        Ok(Some(pairs))
    }

    fn normalize(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    fn is_target(pairs: &Option<HashSet<(String, String)>>, connection: &Connection) -> bool {
        match pairs {
            None => true,
            Some(set) => set.contains(&Self::normalize(
                &connection.endpoints[0],
                &connection.endpoints[1],
            )),
        }
    }

    fn jittered_count(topology: &Topology) -> usize {
        topology
            .connections
            .iter()
            .filter(|c| c.params.contains_key("JITTER"))
            .count()
    }
}

impl Plugin for LinkJitter {
    fn name(&self) -> &str {
        "LinkJitter"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn description(&self) -> &str {
        "Applies a jitter attribute to link parameters and reports the profile"
    }

    fn as_topology(&self) -> Option<&dyn TopologyPlugin> {
        Some(self)
    }

    fn as_codegen(&self) -> Option<&dyn CodegenPlugin> {
        Some(self)
    }
}

impl TopologyPlugin for LinkJitter {
    fn apply(&self, topology: &mut Topology, params: &FieldMap) -> Result<()> {
        let value = params.get("value").cloned().unwrap_or_else(|| json!("1ms"));
        let pairs = Self::target_pairs(params)?;

        for connection in &mut topology.connections {
            if Self::is_target(&pairs, connection) && !connection.params.contains_key("JITTER") {
                connection.params.insert("JITTER".to_string(), value.clone());
            }
        }
        Ok(())
    }
}

impl CodegenPlugin for LinkJitter {
    fn imports(&self) -> Vec<String> {
        vec![]
    }

    fn pre_network(&self, _topology: &Topology, _params: &FieldMap) -> Result<Vec<String>> {
        Ok(vec![])
    }

    fn post_network(&self, topology: &Topology, _params: &FieldMap) -> Result<Vec<String>> {
        Ok(vec![format!(
            "info('*** Jitter applied to {} links\\n')",
            Self::jittered_count(topology)
        )])
    }

    fn post_start(&self, _topology: &Topology, _params: &FieldMap) -> Result<Vec<String>> {
        Ok(vec![])
    }
}
