//! Text encoding of discovery (DDP) messages.
//!
//! Wire format, one header per line, newline-terminated:
//! ```text
//! SRCH * HTTP/1.1
//! [key:value]*
//! device-discovery-protocol-version:00020020
//! ```
//! Messages are sent as a single UDP datagram.  The console answers a `SRCH`
//! with an HTTP-like status block; parsing that block is the caller's job.

use std::net::Ipv4Addr;

use crate::protocol::version::DiscoveryVersion;

/// Limited broadcast address probes are sent to.
pub const BROADCAST_ADDRESS: Ipv4Addr = Ipv4Addr::BROADCAST;

const VERSION_HEADER: &str = "device-discovery-protocol-version";

/// Request line verb of a discovery message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Probe for consoles on the LAN.
    Search,
    /// Wake a console in standby.
    Wakeup,
    /// Ask a console to start a remote-play listener.
    Launch,
}

impl MessageKind {
    pub fn token(self) -> &'static str {
        match self {
            MessageKind::Search => "SRCH",
            MessageKind::Wakeup => "WAKEUP",
            MessageKind::Launch => "LAUNCH",
        }
    }
}

/// A discovery message prior to encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryMessage {
    pub kind: MessageKind,
    pub version: DiscoveryVersion,
    /// Extra `key:value` headers, emitted in insertion order.
    pub fields: Vec<(String, String)>,
}

impl DiscoveryMessage {
    /// The `SRCH` probe broadcast by a discovery network.
    pub fn search(version: DiscoveryVersion) -> Self {
        Self {
            kind: MessageKind::Search,
            version,
            fields: Vec::new(),
        }
    }

    /// Appends a header line.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }
}

/// Encodes `msg` into the bytes of one datagram.
///
/// # Examples
///
/// ```rust
/// use playlink_core::{format_discovery_message, DiscoveryMessage, DiscoveryVersion};
///
/// let bytes = format_discovery_message(&DiscoveryMessage::search(DiscoveryVersion::Ps4));
/// assert_eq!(
///     bytes,
///     b"SRCH * HTTP/1.1\ndevice-discovery-protocol-version:00020020\n".to_vec()
/// );
/// ```
pub fn format_discovery_message(msg: &DiscoveryMessage) -> Vec<u8> {
    let mut out = String::with_capacity(64);
    out.push_str(msg.kind.token());
    out.push_str(" * HTTP/1.1\n");

    for (key, value) in &msg.fields {
        out.push_str(key);
        out.push(':');
        out.push_str(value);
        out.push('\n');
    }

    out.push_str(VERSION_HEADER);
    out.push(':');
    out.push_str(msg.version.as_str());
    out.push('\n');

    out.into_bytes()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
