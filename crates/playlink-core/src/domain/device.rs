//! Device descriptors produced by discovery.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::protocol::version::DiscoveryVersion;

/// Power state reported by a console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceStatus {
    Standby,
    Awake,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceStatus::Standby => "Standby",
            DeviceStatus::Awake => "Awake",
        })
    }
}

/// A console that answered a discovery probe.
///
/// One descriptor is produced per inbound datagram; the same console
/// answering twice yields two equal descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Source IP of the response.
    pub address: IpAddr,
    /// Discovery version of the network that received the response.
    pub discovery_version: DiscoveryVersion,
    /// Console host id.  Empty until response parsing is implemented.
    pub id: String,
    /// Console power state.  Always [`DeviceStatus::Standby`] until response
    /// parsing is implemented.
    pub status: DeviceStatus,
}

impl DeviceDescriptor {
    /// Builds the minimal descriptor for a datagram received from `source`.
    pub fn from_datagram(source: SocketAddr, discovery_version: DiscoveryVersion) -> Self {
        Self {
            address: source.ip(),
            discovery_version,
            id: String::new(),
            status: DeviceStatus::Standby,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
