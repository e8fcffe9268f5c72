//! The Ansible dynamic inventory document for the homelab k3s cluster. The topology is fixed: one
//! control plane node and one worker, each addressed by an IP exported as a tofu output.
//!
//! Given outputs from `tofu output -json`, the document can be built and printed with:
//!
//! ```rust
//! use tofu_inventory::inventory::build_inventory;
//! use tofu_inventory::state::QueryOutput;
//!
//! let outputs: QueryOutput = serde_json::from_str(
//!     r#"{"control_plane_ip": {"value": "10.0.0.5"}, "worker_ip": {"value": "10.0.0.6"}}"#,
//! )
//! .unwrap();
//! let inv = build_inventory(&outputs).unwrap();
//! println!("{}", serde_json::to_string_pretty(&inv).unwrap());
//! ```

use crate::error::{InventoryError, InventoryResult};
use crate::state::QueryOutput;
use log::debug;
use serde_derive::Serialize;
use std::collections::BTreeMap;

pub const CONTROL_PLANE_HOST: &str = "k3s-cp-01";
pub const WORKER_HOST: &str = "k3s-worker-01";
pub const CONTROL_PLANE_IP_OUTPUT: &str = "control_plane_ip";
pub const WORKER_IP_OUTPUT: &str = "worker_ip";

/// A named group of hosts.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Default)]
pub struct InventoryGroup {
    pub hosts: Vec<String>,
}

impl InventoryGroup {
    fn single(host: &str) -> Self {
        Self {
            hosts: vec![host.to_string()],
        }
    }
}

/// Connection variables for a single host.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct HostVars {
    /// Address Ansible connects to. Passed through from the tofu output as-is.
    pub ansible_host: serde_json::Value,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Default)]
pub struct InventoryMeta {
    pub hostvars: BTreeMap<String, HostVars>,
}

/// The full `--list` response. Field order here is the order keys are emitted in.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Default)]
pub struct InventoryDocument {
    pub control_plane: InventoryGroup,
    pub workers: InventoryGroup,
    #[serde(rename = "_meta")]
    pub meta: InventoryMeta,
}

fn required_value(outputs: &QueryOutput, key: &str) -> InventoryResult<serde_json::Value> {
    let output = outputs
        .get(key)
        .ok_or_else(|| InventoryError::missing_output(key))?;
    // The inventory is printed in the clear, whatever tofu thinks of the value.
    if output.sensitive {
        debug!("tofu output '{}' is marked sensitive; emitting it as a hostvar", key);
    }
    Ok(output.value.clone())
}

/// Project the two node addresses out of the tofu outputs into the inventory document.
pub fn build_inventory(outputs: &QueryOutput) -> InventoryResult<InventoryDocument> {
    let cp_ip = required_value(outputs, CONTROL_PLANE_IP_OUTPUT)?;
    let worker_ip = required_value(outputs, WORKER_IP_OUTPUT)?;

    let mut hostvars = BTreeMap::new();
    hostvars.insert(
        CONTROL_PLANE_HOST.to_string(),
        HostVars {
            ansible_host: cp_ip,
        },
    );
    hostvars.insert(
        WORKER_HOST.to_string(),
        HostVars {
            ansible_host: worker_ip,
        },
    );

    Ok(InventoryDocument {
        control_plane: InventoryGroup::single(CONTROL_PLANE_HOST),
        workers: InventoryGroup::single(WORKER_HOST),
        meta: InventoryMeta { hostvars },
    })
}
