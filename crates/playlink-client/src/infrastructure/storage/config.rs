//! TOML-based configuration for the discovery client.
//!
//! The default location is the platform config directory:
//! - Windows:  `%APPDATA%\Playlink\config.toml`
//! - Linux:    `~/.config/playlink/config.toml`
//! - macOS:    `~/Library/Application Support/Playlink/config.toml`
//!
//! Example:
//!
//! ```toml
//! [discovery]
//! version = "ps5"
//! local_bind_port = 0
//! local_bind_address = "0.0.0.0"
//!
//! [remote_play]
//! version = "ps5-v1"
//!
//! [logging]
//! log_level = "debug"
//! ```
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration.  `target_port` may be omitted; it then follows the
//! discovery version (987 for PS4, 9302 for PS5).

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use playlink_core::{DiscoveryVersion, RemotePlayVersion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::network::NetworkConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub remote_play: RemotePlaySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where discovery probes are sent from and to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoverySettings {
    /// Console generation to probe for.
    #[serde(default = "default_discovery_version")]
    pub version: DiscoveryVersion,
    /// Destination port for probes.  Defaults to the version's port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u16>,
    /// Local port to bind; absent or 0 lets the OS choose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_bind_port: Option<u16>,
    /// Local address to bind; absent binds all interfaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_bind_address: Option<IpAddr>,
}

/// Handshake settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemotePlaySettings {
    #[serde(default = "default_remote_play_version")]
    pub version: RemotePlayVersion,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    /// `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_discovery_version() -> DiscoveryVersion {
    DiscoveryVersion::Ps4
}
fn default_remote_play_version() -> RemotePlayVersion {
    RemotePlayVersion::Ps4V10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            version: default_discovery_version(),
            target_port: None,
            local_bind_port: None,
            local_bind_address: None,
        }
    }
}

impl Default for RemotePlaySettings {
    fn default() -> Self {
        Self {
            version: default_remote_play_version(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed or a value has
    /// the wrong type (for example an unknown discovery version).
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Bind settings for [`crate::UdpDiscoveryNetworkFactory::create`].
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            local_bind_port: self.discovery.local_bind_port,
            local_bind_address: self.discovery.local_bind_address,
        }
    }

    /// The explicit target port, or the discovery version's well-known port.
    pub fn discovery_target_port(&self) -> u16 {
        self.discovery
            .target_port
            .unwrap_or_else(|| self.discovery.version.default_port())
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the platform-appropriate path of `config.toml`.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads a [`ClientConfig`] from `path`, returning the defaults if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => ClientConfig::from_toml_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &ClientConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Playlink"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("playlink"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Playlink")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
