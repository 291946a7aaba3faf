//! UDP discovery networks.
//!
//! A [`UdpDiscoveryNetwork`] is a capability over a registry-managed socket:
//! it can broadcast `SRCH` probes with [`DiscoveryNetwork::ping`] and it owns
//! exactly one registry reference, given back by [`DiscoveryNetwork::close`].
//!
//! # How discovery works (for beginners)
//!
//! 1. The application builds a [`UdpDiscoveryNetworkFactory`] over a shared
//!    [`SocketRegistry`] and calls `create` with a bind configuration and an
//!    `on_device` callback.
//! 2. The factory acquires the socket for the requested bind port and
//!    subscribes a handler to that socket's fan-out.  If the socket is new it
//!    is bound and `SO_BROADCAST` is enabled before any other network can
//!    share it; a concurrent `create` on the same port waits for that.
//! 3. The application calls `ping()` on a timer.  Each call sends one probe to
//!    `255.255.255.255:<target_port>` without waiting.
//! 4. Every datagram that arrives on the socket becomes a
//!    [`DeviceDescriptor`] and is passed to `on_device`.  Networks that share
//!    a socket each get their own copy.
//! 5. `close()` unsubscribes the handler and releases the reference.  The
//!    socket itself closes when its last holder releases it.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use playlink_core::protocol::discovery::BROADCAST_ADDRESS;
use playlink_core::{format_discovery_message, DeviceDescriptor, DiscoveryMessage, DiscoveryVersion};
use tracing::{debug, warn};

use super::fanout::{DatagramHandler, InboundFanout, SubscriptionId};
use super::registry::SocketRegistry;
use super::socket::DiscoverySocket;
use super::NetworkError;

/// Callback receiving one descriptor per inbound datagram.
pub type OnDeviceDiscovered = Arc<dyn Fn(DeviceDescriptor) + Send + Sync>;

/// Local bind configuration for a discovery network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Port to bind; `None` lets the OS choose.
    pub local_bind_port: Option<u16>,
    /// Address to bind; `None` binds all IPv4 interfaces.
    pub local_bind_address: Option<IpAddr>,
}

impl NetworkConfig {
    /// The bind port, 0 meaning OS-assigned.  Also the registry key.
    pub fn bind_port(&self) -> u16 {
        self.local_bind_port.unwrap_or(0)
    }

    pub fn bind_addr(&self) -> IpAddr {
        self.local_bind_address
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }

    pub fn bind_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr(), self.bind_port())
    }
}

/// One active discovery session.
pub trait DiscoveryNetwork: Send {
    /// Sends one discovery probe.  Fire-and-forget: no retry, no
    /// acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::SendFailed`] if the OS rejects the datagram.
    fn ping(&self) -> Result<(), NetworkError>;

    /// Stops delivery to this network and releases its socket reference.
    ///
    /// # Errors
    ///
    /// Propagates registry errors from the release.
    fn close(self) -> Result<(), NetworkError>
    where
        Self: Sized;
}

/// Builds discovery networks wired to a device callback.
pub trait DiscoveryNetworkFactory {
    type Network: DiscoveryNetwork;

    /// Creates a network for `config` that reports responses to `on_device`.
    ///
    /// # Errors
    ///
    /// Returns the socket creation, bind, or broadcast error.  On error no
    /// registry reference is held.
    fn create(
        &self,
        config: &NetworkConfig,
        on_device: OnDeviceDiscovered,
    ) -> Result<Self::Network, NetworkError>;
}

// ── Network ───────────────────────────────────────────────────────────────────

/// Discovery network backed by a shared UDP socket.
pub struct UdpDiscoveryNetwork {
    registry: Arc<SocketRegistry>,
    bound_port: u16,
    socket: Arc<dyn DiscoverySocket>,
    inbound: Arc<InboundFanout>,
    subscription: SubscriptionId,
    target: SocketAddr,
    version: DiscoveryVersion,
    released: bool,
}

impl UdpDiscoveryNetwork {
    /// Requested bind port; the key this network releases on close.
    pub fn bound_port(&self) -> u16 {
        self.bound_port
    }

    /// Address probes are sent to.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn version(&self) -> DiscoveryVersion {
        self.version
    }

    /// Address of the underlying socket, including the OS-assigned port.
    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        self.socket.local_addr()
    }

    fn release_reference(&mut self) -> Result<(), NetworkError> {
        self.released = true;
        self.inbound.unsubscribe(self.subscription);
        self.registry.release(self.bound_port)
    }
}

impl DiscoveryNetwork for UdpDiscoveryNetwork {
    fn ping(&self) -> Result<(), NetworkError> {
        let probe = format_discovery_message(&DiscoveryMessage::search(self.version));
        debug!("ping {} -> {}", self.version, self.target);
        self.socket.send_to(&probe, self.target)?;
        Ok(())
    }

    fn close(mut self) -> Result<(), NetworkError> {
        debug!("closing discovery network on bind port {}", self.bound_port);
        self.release_reference()
    }
}

impl Drop for UdpDiscoveryNetwork {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!(
            "discovery network on bind port {} dropped without close",
            self.bound_port
        );
        if let Err(e) = self.release_reference() {
            warn!("release on drop failed: {e}");
        }
    }
}

impl std::fmt::Debug for UdpDiscoveryNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpDiscoveryNetwork")
            .field("bound_port", &self.bound_port)
            .field("target", &self.target)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

// ── Factory ───────────────────────────────────────────────────────────────────

/// Creates [`UdpDiscoveryNetwork`]s over a shared registry.
#[derive(Debug, Clone)]
pub struct UdpDiscoveryNetworkFactory {
    registry: Arc<SocketRegistry>,
    target_address: IpAddr,
    target_port: u16,
    version: DiscoveryVersion,
}

impl UdpDiscoveryNetworkFactory {
    /// Networks built by this factory broadcast `version` probes to
    /// `target_port`.
    pub fn new(registry: Arc<SocketRegistry>, target_port: u16, version: DiscoveryVersion) -> Self {
        Self {
            registry,
            target_address: IpAddr::V4(BROADCAST_ADDRESS),
            target_port,
            version,
        }
    }

    /// Uses the well-known discovery port of `version`.
    pub fn for_version(registry: Arc<SocketRegistry>, version: DiscoveryVersion) -> Self {
        Self::new(registry, version.default_port(), version)
    }

    /// Directs probes at a single host instead of broadcasting.
    pub fn with_target_address(mut self, address: IpAddr) -> Self {
        self.target_address = address;
        self
    }

    pub fn registry(&self) -> &Arc<SocketRegistry> {
        &self.registry
    }
}

impl DiscoveryNetworkFactory for UdpDiscoveryNetworkFactory {
    type Network = UdpDiscoveryNetwork;

    fn create(
        &self,
        config: &NetworkConfig,
        on_device: OnDeviceDiscovered,
    ) -> Result<UdpDiscoveryNetwork, NetworkError> {
        let bound_port = config.bind_port();
        let bind_addr = config.bind_socket_addr();
        let acquired = self.registry.acquire_with(bound_port, |socket, inbound| {
            socket.bind(bind_addr, Arc::clone(inbound))?;
            socket.set_broadcast(true)
        })?;

        let version = self.version;
        let handler: DatagramHandler = Arc::new(move |_payload, source| {
            on_device(DeviceDescriptor::from_datagram(source, version));
        });
        let subscription = acquired.inbound.subscribe(handler);

        let target = SocketAddr::new(self.target_address, self.target_port);
        debug!(
            "discovery network on bind port {bound_port} -> {target} (new socket: {})",
            acquired.is_new
        );

        Ok(UdpDiscoveryNetwork {
            registry: Arc::clone(&self.registry),
            bound_port,
            socket: acquired.socket,
            inbound: acquired.inbound,
            subscription,
            target,
            version,
            released: false,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
