//! Open vSwitch component plugin.
//!
//! Owns the `OVSSWITCHES` custom group. Records carry an `ID` plus
//! optional `STP`, `PROTOCOLS` and `DPID` fields and render as explicit
//! `OVSKernelSwitch` instantiations.

use crate::plugin::{ComponentPlugin, Plugin};
use crate::topology::{Component, FieldMap};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::Arc;

/// Registration entry point for the `ovs_switches` unit.
pub fn register() -> Vec<Arc<dyn Plugin>> {
    vec![Arc::new(OvsSwitch)]
}

pub struct OvsSwitch;

impl Plugin for OvsSwitch {
    fn name(&self) -> &str {
        "OvsSwitch"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn description(&self) -> &str {
        "Custom OVSSWITCHES component group rendered as OVSKernelSwitch instances"
    }

    fn as_component(&self) -> Option<&dyn ComponentPlugin> {
        Some(self)
    }
}

impl ComponentPlugin for OvsSwitch {
    fn owned_groups(&self) -> Vec<String> {
        vec!["OVSSWITCHES".to_string()]
    }

    fn build(&self, group: &str, record: &FieldMap) -> Result<Component> {
        let id = record
            .get("ID")
            .and_then(|v| v.as_str())
            .ok_or_else(|| eyre!("OVS switch record is missing an ID"))?;

        if let Some(stp) = record.get("STP") {
            if !stp.is_boolean() {
                return Err(eyre!("STP must be a boolean, got {}", stp));
            }
        }

        let mut fields = record.clone();
        fields.remove("ID");
        Ok(Component::new(id, group, fields))
    }

    fn render(&self, component: &Component) -> Vec<String> {
        let mut args = vec![format!("'{}'", component.id), "cls=OVSKernelSwitch".to_string()];
        if component.fields.get("STP").and_then(|v| v.as_bool()) == Some(true) {
            args.push("stp=True".to_string());
        }
        if let Some(protocols) = component.fields.get("PROTOCOLS").and_then(|v| v.as_str()) {
            args.push(format!("protocols='{}'", protocols));
        }
        if let Some(dpid) = component.fields.get("DPID").and_then(|v| v.as_str()) {
            args.push(format!("dpid='{}'", dpid));
        }
        vec![format!("{} = net.addSwitch({})", component.id, args.join(", "))]
    }
}
