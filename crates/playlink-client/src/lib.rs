//! playlink-client library entry point.
//!
//! Socket-facing half of Playlink: the shared-socket registry, the UDP
//! discovery network, TOML configuration, and tracing bootstrap.  Pure
//! protocol and crypto types live in `playlink-core`.
//!
//! # Architecture
//!
//! ```text
//! UdpDiscoveryNetworkFactory::create(config, on_device)
//!  └─ SocketRegistry::acquire(bind_port)      -- shared, ref-counted socket
//!       └─ InboundFanout::subscribe(handler)  -- one handler per network
//! UdpDiscoveryNetwork::ping()                 -- SRCH broadcast
//! UdpDiscoveryNetwork::close()                -- unsubscribe + release
//! ```

pub mod infrastructure;
pub mod logging;

pub use infrastructure::network::{
    DiscoveryNetwork, DiscoveryNetworkFactory, NetworkConfig, NetworkError, OnDeviceDiscovered,
    SocketRegistry, UdpDiscoveryNetwork, UdpDiscoveryNetworkFactory,
};
pub use infrastructure::storage::config::{
    config_file_path, load_config, save_config, ClientConfig, ConfigError,
};
pub use logging::{init_tracing, LoggingError};
