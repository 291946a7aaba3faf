//! Protocol version identifiers.
//!
//! Two independent versions are negotiated with a console:
//!
//! - The **discovery** version is carried as an 8-digit string in every
//!   probe (`device-discovery-protocol-version:00020020`).  It also selects
//!   the UDP port the console listens on.
//! - The **remote-play** version selects the handshake IV derivation used by
//!   the encrypted control session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known discovery port of PS4-generation consoles.
pub const PS4_DISCOVERY_PORT: u16 = 987;

/// Well-known discovery port of PS5-generation consoles.
pub const PS5_DISCOVERY_PORT: u16 = 9302;

/// Error returned when a version string is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} version: {value:?}")]
pub struct VersionParseError {
    kind: &'static str,
    value: String,
}

// ── Discovery version ─────────────────────────────────────────────────────────

/// Discovery protocol version advertised in probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryVersion {
    Ps4,
    Ps5,
}

impl DiscoveryVersion {
    /// The wire representation sent in `device-discovery-protocol-version`.
    pub fn as_str(self) -> &'static str {
        match self {
            DiscoveryVersion::Ps4 => "00020020",
            DiscoveryVersion::Ps5 => "00030010",
        }
    }

    /// The UDP port consoles of this generation listen on for probes.
    pub fn default_port(self) -> u16 {
        match self {
            DiscoveryVersion::Ps4 => PS4_DISCOVERY_PORT,
            DiscoveryVersion::Ps5 => PS5_DISCOVERY_PORT,
        }
    }
}

impl fmt::Display for DiscoveryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscoveryVersion {
    type Err = VersionParseError;

    /// Accepts either the wire string (`"00020020"`) or the short name (`"ps4"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "00020020" | "ps4" => Ok(DiscoveryVersion::Ps4),
            "00030010" | "ps5" => Ok(DiscoveryVersion::Ps5),
            _ => Err(VersionParseError {
                kind: "discovery",
                value: s.to_string(),
            }),
        }
    }
}

// ── Remote-play version ───────────────────────────────────────────────────────

/// Remote-play protocol version used during the session handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemotePlayVersion {
    #[serde(rename = "ps4-v8")]
    Ps4V8,
    #[serde(rename = "ps4-v9")]
    Ps4V9,
    #[serde(rename = "ps4-v10")]
    Ps4V10,
    #[serde(rename = "ps5-v1")]
    Ps5V1,
}

impl RemotePlayVersion {
    /// Returns `true` for versions spoken by PS5-generation consoles.
    pub fn is_ps5(self) -> bool {
        matches!(self, RemotePlayVersion::Ps5V1)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RemotePlayVersion::Ps4V8 => "ps4-v8",
            RemotePlayVersion::Ps4V9 => "ps4-v9",
            RemotePlayVersion::Ps4V10 => "ps4-v10",
            RemotePlayVersion::Ps5V1 => "ps5-v1",
        }
    }
}

impl fmt::Display for RemotePlayVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemotePlayVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ps4-v8" => Ok(RemotePlayVersion::Ps4V8),
            "ps4-v9" => Ok(RemotePlayVersion::Ps4V9),
            "ps4-v10" => Ok(RemotePlayVersion::Ps4V10),
            "ps5-v1" => Ok(RemotePlayVersion::Ps5V1),
            _ => Err(VersionParseError {
                kind: "remote-play",
                value: s.to_string(),
            }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_version_wire_strings() {
        assert_eq!(DiscoveryVersion::Ps4.as_str(), "00020020");
        assert_eq!(DiscoveryVersion::Ps5.as_str(), "00030010");
    }

    #[test]
    fn test_discovery_version_default_ports() {
        assert_eq!(DiscoveryVersion::Ps4.default_port(), 987);
        assert_eq!(DiscoveryVersion::Ps5.default_port(), 9302);
    }

    #[test]
    fn test_discovery_version_parses_wire_string_and_short_name() {
        // Arrange / Act / Assert
        assert_eq!("00020020".parse(), Ok(DiscoveryVersion::Ps4));
        assert_eq!("PS5".parse(), Ok(DiscoveryVersion::Ps5));
    }

    #[test]
    fn test_discovery_version_rejects_unknown_string() {
        let result = "00010010".parse::<DiscoveryVersion>();
        assert!(result.is_err());
    }

    #[test]
    fn test_discovery_version_display_matches_wire_string() {
        assert_eq!(DiscoveryVersion::Ps5.to_string(), "00030010");
    }

    #[test]
    fn test_remote_play_version_round_trips_through_display() {
        for v in [
            RemotePlayVersion::Ps4V8,
            RemotePlayVersion::Ps4V9,
            RemotePlayVersion::Ps4V10,
            RemotePlayVersion::Ps5V1,
        ] {
            assert_eq!(v.to_string().parse::<RemotePlayVersion>(), Ok(v));
        }
    }

    #[test]
    fn test_remote_play_version_is_ps5_only_for_ps5_variant() {
        assert!(RemotePlayVersion::Ps5V1.is_ps5());
        assert!(!RemotePlayVersion::Ps4V10.is_ps5());
    }
}
