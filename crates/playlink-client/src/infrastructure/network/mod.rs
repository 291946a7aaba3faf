//! Network infrastructure for console discovery.
//!
//! # Sub-modules
//!
//! - **`socket`** – The [`DiscoverySocket`] seam and its tokio-backed UDP
//!   implementation.  Sockets are created unbound and bound on first use.
//!
//! - **`fanout`** – Per-socket subscriber list.  Every datagram received on a
//!   shared socket is delivered to every subscribed handler.
//!
//! - **`registry`** – Reference-counted sockets keyed by requested bind port.
//!
//! - **`discovery`** – The discovery network (`ping` / `close`) and the
//!   factory that wires a network to a registry socket.

pub mod discovery;
pub mod fanout;
pub mod registry;
pub mod socket;

use std::net::SocketAddr;

use thiserror::Error;

pub use discovery::{
    DiscoveryNetwork, DiscoveryNetworkFactory, NetworkConfig, OnDeviceDiscovered,
    UdpDiscoveryNetwork, UdpDiscoveryNetworkFactory,
};
pub use fanout::{DatagramHandler, InboundFanout, SubscriptionId};
pub use registry::{AcquiredSocket, SocketRegistry};
pub use socket::{DiscoverySocket, SocketFactory, UdpDiscoverySocket, UdpSocketFactory};

/// Error type for discovery transport operations.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// `release` was called for a port with no registered socket.
    #[error("unbalanced release of discovery socket for port {port}")]
    UnbalancedRelease { port: u16 },

    /// The OS refused to create a UDP socket.
    #[error("failed to create UDP socket: {0}")]
    SocketCreate(#[source] std::io::Error),

    /// The socket could not be bound.
    #[error("failed to bind discovery socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// `SO_BROADCAST` could not be enabled.
    #[error("failed to enable broadcast: {0}")]
    Broadcast(#[source] std::io::Error),

    /// A datagram could not be handed to the OS.
    #[error("failed to send to {target}: {source}")]
    SendFailed {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The bound address could not be read back from the OS.
    #[error("failed to read local socket address: {0}")]
    LocalAddr(#[source] std::io::Error),

    /// The socket has not been bound yet.
    #[error("discovery socket is not bound")]
    NotBound,

    /// `bind` was called on a socket that is already bound.
    #[error("discovery socket is already bound")]
    AlreadyBound,

    /// The socket stopped receiving or could not be registered with the
    /// reactor.  It stays unusable until its last holder releases it.
    #[error("discovery socket failed: {0}")]
    SocketFailed(String),

    /// The socket was closed by its last holder.
    #[error("discovery socket is closed")]
    Closed,

    /// Binding needs a Tokio runtime to drive the receive loop.
    #[error("no Tokio runtime available to drive the receive loop")]
    NoRuntime,

    /// A thread panicked while holding a socket or registry lock.
    #[error("discovery lock poisoned")]
    LockPoisoned,
}
