//! Hierarchical addressing from serial numbers
//!
//! Every addressable observation lands under
//! `hub_serial.device_serial.message_type` (or `device_serial.message_type`
//! for hub-originated messages). Device nodes are announced to the host so
//! it can register them before values arrive underneath.

use crate::schema::device_kind;
use crate::types::{Observation, StatePath};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("observation carries no serial number; its fields cannot be addressed")]
pub struct UnaddressablePath;

/// A device node to register, with its display descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub path: StatePath,
    pub descriptor: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Channel path all of this observation's fields are written under
    pub channel: StatePath,
    /// Device nodes to ensure, outermost first
    pub device_nodes: Vec<NodeSpec>,
}

fn node(path: StatePath, serial: &str) -> NodeSpec {
    NodeSpec {
        descriptor: format!("{}: {}", device_kind(serial), serial),
        path,
    }
}

pub fn resolve(observation: &Observation) -> Result<ResolvedIdentity, UnaddressablePath> {
    let serial = observation
        .serial_number
        .as_deref()
        .ok_or(UnaddressablePath)?;

    let mut device_nodes = Vec::with_capacity(2);
    let device_path = match observation.hub_serial.as_deref() {
        Some(hub) => {
            let hub_path = StatePath::new(hub);
            device_nodes.push(node(hub_path.clone(), hub));
            let device_path = hub_path.child(serial);
            device_nodes.push(node(device_path.clone(), serial));
            device_path
        }
        None => {
            let device_path = StatePath::new(serial);
            device_nodes.push(node(device_path.clone(), serial));
            device_path
        }
    };

    Ok(ResolvedIdentity {
        channel: device_path.child(&observation.message_type),
        device_nodes,
    })
}
