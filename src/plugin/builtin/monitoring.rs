//! Network monitoring plugin.
//!
//! Adds monitoring and statistics collection to the generated script: a
//! shared `monitoring_data` dictionary before the network is built, and a
//! daemonized collection loop once it is started. Parameters:
//!
//! - `enable_monitoring` (bool, default `true`)
//! - `interval` (seconds, default `30`)

use crate::plugin::{CodegenPlugin, Plugin};
use crate::topology::{FieldMap, Topology};
use color_eyre::Result;
use std::sync::Arc;

/// Registration entry point for the `monitoring` unit.
pub fn register() -> Vec<Arc<dyn Plugin>> {
    vec![Arc::new(NetworkMonitoring)]
}

pub struct NetworkMonitoring;

impl NetworkMonitoring {
    fn enabled(params: &FieldMap) -> bool {
        params
            .get("enable_monitoring")
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }

    fn interval(params: &FieldMap) -> u64 {
        params.get("interval").and_then(|v| v.as_u64()).unwrap_or(30)
    }
}

impl Plugin for NetworkMonitoring {
    fn name(&self) -> &str {
        "NetworkMonitoring"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn description(&self) -> &str {
        "Adds network monitoring and statistics collection capabilities"
    }

    fn as_codegen(&self) -> Option<&dyn CodegenPlugin> {
        Some(self)
    }
}

impl CodegenPlugin for NetworkMonitoring {
    fn imports(&self) -> Vec<String> {
        vec![
            "import threading".to_string(),
            "import time".to_string(),
            "from datetime import datetime".to_string(),
        ]
    }

    fn pre_network(&self, _topology: &Topology, params: &FieldMap) -> Result<Vec<String>> {
        if !Self::enabled(params) {
            return Ok(vec![]);
        }
        Ok(vec![
            "# Network Monitoring Plugin: Setup".to_string(),
            "monitoring_data = {'start_time': None, 'stats': {}}".to_string(),
        ])
    }

    fn post_network(&self, topology: &Topology, params: &FieldMap) -> Result<Vec<String>> {
        if !Self::enabled(params) {
            return Ok(vec![]);
        }
        Ok(vec![
            "monitoring_data['start_time'] = datetime.now()".to_string(),
            format!(
                "info('*** Monitoring {} hosts every {}s\\n')",
                topology.hosts.len(),
                Self::interval(params)
            ),
        ])
    }

    fn post_start(&self, _topology: &Topology, params: &FieldMap) -> Result<Vec<String>> {
        if !Self::enabled(params) {
            return Ok(vec![]);
        }
        Ok(vec![
            "def _monitor_loop():".to_string(),
            "\twhile True:".to_string(),
            "\t\tfor host in net.hosts:".to_string(),
            "\t\t\tmonitoring_data['stats'][host.name] = host.cmd('cat /proc/loadavg').strip()"
                .to_string(),
            format!("\t\ttime.sleep({})", Self::interval(params)),
            "monitor_thread = threading.Thread(target=_monitor_loop, daemon=True)".to_string(),
            "monitor_thread.start()".to_string(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: serde_json::Value) -> FieldMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_imports() {
        let plugin = NetworkMonitoring;
        assert_eq!(
            plugin.imports(),
            vec!["import threading", "import time", "from datetime import datetime"]
        );
    }

    #[test]
    fn test_disabled_produces_no_lines() {
        let plugin = NetworkMonitoring;
        let topology = Topology::default();
        let params = params(json!({"enable_monitoring": false}));

        assert!(plugin.pre_network(&topology, &params).unwrap().is_empty());
        assert!(plugin.post_network(&topology, &params).unwrap().is_empty());
        assert!(plugin.post_start(&topology, &params).unwrap().is_empty());
    }

    #[test]
    fn test_interval_parameter() {
        let plugin = NetworkMonitoring;
        let topology = Topology::default();
        let params = params(json!({"interval": 5}));

        let lines = plugin.post_start(&topology, &params).unwrap();
        assert!(lines.iter().any(|l| l.contains("time.sleep(5)")));
    }

    #[test]
    fn test_capability_set() {
        let plugin = NetworkMonitoring;
        assert!(plugin.as_codegen().is_some());
        assert!(plugin.as_component().is_none());
        assert!(plugin.as_topology().is_none());
    }
}
