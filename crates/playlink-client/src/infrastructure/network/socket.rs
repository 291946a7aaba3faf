//! UDP socket abstraction used by the registry.
//!
//! A [`UdpDiscoverySocket`] goes through three states:
//!
//! ```text
//! Unbound ──bind()──► Bound ──close()──► Closed
//!    └──────────────close()─────────────────┘
//! ```
//!
//! It is created unbound (via `socket2`) so the registry can hand it out
//! before anyone has decided where it lives; the first network that acquires
//! it binds it.  Binding converts it into a `tokio::net::UdpSocket` and spawns
//! a receive loop that forwards every datagram to the socket's
//! [`InboundFanout`].
//!
//! Sends go straight to the non-blocking OS socket through
//! [`socket2::SockRef`], bypassing Tokio's readiness cache, so a send issued
//! right after `bind()` (before the reactor has polled the socket) still
//! transmits.  A full send buffer is reported as [`NetworkError::SendFailed`]
//! rather than waited on.
//!
//! If the receive loop hits a non-transient error, or the socket cannot be
//! registered with the reactor, the failure is recorded and every later
//! operation reports [`NetworkError::SocketFailed`].

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use socket2::{Domain, Protocol, SockRef, Socket, Type};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::fanout::InboundFanout;
use super::NetworkError;

/// Largest datagram the receive loop accepts.
const MAX_DATAGRAM_SIZE: usize = 4096;

/// Operations the discovery layer needs from a datagram socket.
#[cfg_attr(test, mockall::automock)]
pub trait DiscoverySocket: Send + Sync {
    /// Binds to `addr` and starts delivering inbound datagrams to `inbound`.
    fn bind(&self, addr: SocketAddr, inbound: Arc<InboundFanout>) -> Result<(), NetworkError>;

    /// Enables or disables `SO_BROADCAST`.
    fn set_broadcast(&self, enabled: bool) -> Result<(), NetworkError>;

    /// Hands one datagram to the OS without waiting.
    fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<usize, NetworkError>;

    /// Address the socket is bound to, including the OS-assigned port.
    fn local_addr(&self) -> Result<SocketAddr, NetworkError>;

    /// Stops the receive loop and releases the OS socket.  Idempotent.
    fn close(&self);
}

/// Creates new, unbound sockets for the registry.
#[cfg_attr(test, mockall::automock)]
pub trait SocketFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn DiscoverySocket>, NetworkError>;
}

/// Production factory producing [`UdpDiscoverySocket`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpSocketFactory;

impl SocketFactory for UdpSocketFactory {
    fn create(&self) -> Result<Arc<dyn DiscoverySocket>, NetworkError> {
        Ok(Arc::new(UdpDiscoverySocket::new()?))
    }
}

enum SocketState {
    Unbound(Socket),
    Bound {
        socket: Arc<UdpSocket>,
        receiver: JoinHandle<()>,
    },
    Closed,
}

/// IPv4 UDP socket driven by the Tokio reactor once bound.
pub struct UdpDiscoverySocket {
    state: Mutex<SocketState>,
    failure: Arc<OnceLock<String>>,
}

impl UdpDiscoverySocket {
    /// Creates an unbound, non-blocking IPv4 UDP socket.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::SocketCreate`] if the OS refuses the socket.
    pub fn new() -> Result<Self, NetworkError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(NetworkError::SocketCreate)?;
        socket
            .set_nonblocking(true)
            .map_err(NetworkError::SocketCreate)?;
        Ok(Self {
            state: Mutex::new(SocketState::Unbound(socket)),
            failure: Arc::new(OnceLock::new()),
        })
    }

    /// Locks the state, reporting a recorded failure first.
    fn state(&self) -> Result<MutexGuard<'_, SocketState>, NetworkError> {
        if let Some(reason) = self.failure.get() {
            return Err(NetworkError::SocketFailed(reason.clone()));
        }
        self.state.lock().map_err(|_| NetworkError::LockPoisoned)
    }
}

impl DiscoverySocket for UdpDiscoverySocket {
    /// Binds the socket and spawns its receive loop on the current runtime,
    /// which must have I/O enabled.
    fn bind(&self, addr: SocketAddr, inbound: Arc<InboundFanout>) -> Result<(), NetworkError> {
        let mut state = self.state()?;
        let raw = match std::mem::replace(&mut *state, SocketState::Closed) {
            SocketState::Unbound(raw) => raw,
            bound @ SocketState::Bound { .. } => {
                *state = bound;
                return Err(NetworkError::AlreadyBound);
            }
            SocketState::Closed => return Err(NetworkError::Closed),
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            *state = SocketState::Unbound(raw);
            return Err(NetworkError::NoRuntime);
        };
        if let Err(source) = raw.bind(&addr.into()) {
            *state = SocketState::Unbound(raw);
            return Err(NetworkError::BindFailed { addr, source });
        }

        // `raw` is consumed here, so a registration failure is permanent.
        let std_socket: std::net::UdpSocket = raw.into();
        let socket = match UdpSocket::from_std(std_socket) {
            Ok(socket) => Arc::new(socket),
            Err(source) => {
                record_failure(&self.failure, "reactor registration", &source);
                return Err(NetworkError::BindFailed { addr, source });
            }
        };
        if let Ok(local) = socket.local_addr() {
            info!("discovery socket listening on {local}");
        }

        let receiver = runtime.spawn(receive_loop(
            Arc::clone(&socket),
            inbound,
            Arc::clone(&self.failure),
        ));
        *state = SocketState::Bound { socket, receiver };
        Ok(())
    }

    fn set_broadcast(&self, enabled: bool) -> Result<(), NetworkError> {
        let result = match &*self.state()? {
            SocketState::Unbound(raw) => raw.set_broadcast(enabled),
            SocketState::Bound { socket, .. } => socket.set_broadcast(enabled),
            SocketState::Closed => return Err(NetworkError::Closed),
        };
        result.map_err(NetworkError::Broadcast)
    }

    fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<usize, NetworkError> {
        match &*self.state()? {
            SocketState::Bound { socket, .. } => SockRef::from(socket.as_ref())
                .send_to(payload, &target.into())
                .map_err(|source| NetworkError::SendFailed { target, source }),
            SocketState::Unbound(_) => Err(NetworkError::NotBound),
            SocketState::Closed => Err(NetworkError::Closed),
        }
    }

    fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        match &*self.state()? {
            SocketState::Bound { socket, .. } => {
                socket.local_addr().map_err(NetworkError::LocalAddr)
            }
            SocketState::Unbound(_) => Err(NetworkError::NotBound),
            SocketState::Closed => Err(NetworkError::Closed),
        }
    }

    fn close(&self) {
        let previous = match self.state.lock() {
            Ok(mut state) => std::mem::replace(&mut *state, SocketState::Closed),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), SocketState::Closed),
        };
        if let SocketState::Bound { receiver, .. } = previous {
            receiver.abort();
            debug!("discovery socket closed");
        }
    }
}

impl Drop for UdpDiscoverySocket {
    fn drop(&mut self) {
        self.close();
    }
}

/// Forwards every received datagram to `inbound` until the socket fails or
/// the task is aborted.
async fn receive_loop(
    socket: Arc<UdpSocket>,
    inbound: Arc<InboundFanout>,
    failure: Arc<OnceLock<String>>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        let (len, source) = match socket.recv_from(&mut buf).await {
            Ok(pair) => pair,
            Err(e) if is_transient_recv_error(&e) => continue,
            Err(e) => {
                record_failure(&failure, "receive", &e);
                break;
            }
        };

        let delivered = inbound.dispatch(&buf[..len], source);
        trace!("datagram of {len} bytes from {source} delivered to {delivered} subscriber(s)");
    }
}

/// Keeps the first failure; later ones are only logged.
fn record_failure(failure: &OnceLock<String>, stage: &str, e: &std::io::Error) {
    warn!("discovery socket {stage} error: {e}");
    let _ = failure.set(format!("{stage} error: {e}"));
}

/// Returns `true` for receive errors that do not invalidate the socket.
///
/// `ConnectionReset` shows up on Windows when an earlier broadcast drew an
/// ICMP port-unreachable.
fn is_transient_recv_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::ConnectionReset
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn loopback_any_port() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[test]
    fn test_is_transient_recv_error_recognises_would_block_and_reset() {
        for kind in [
            std::io::ErrorKind::WouldBlock,
            std::io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted,
            std::io::ErrorKind::ConnectionReset,
        ] {
            assert!(is_transient_recv_error(&std::io::Error::new(kind, "x")));
        }
    }

    #[test]
    fn test_is_transient_recv_error_returns_false_for_other_errors() {
        let e = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!is_transient_recv_error(&e));
    }

    #[test]
    fn test_unbound_socket_rejects_send_and_local_addr() {
        // Arrange
        let socket = UdpDiscoverySocket::new().expect("create");

        // Act / Assert
        assert!(matches!(
            socket.send_to(b"x", "127.0.0.1:9".parse().unwrap()),
            Err(NetworkError::NotBound)
        ));
        assert!(matches!(socket.local_addr(), Err(NetworkError::NotBound)));
    }

    #[test]
    fn test_bind_without_runtime_fails_cleanly() {
        let socket = UdpDiscoverySocket::new().expect("create");
        let result = socket.bind(loopback_any_port(), Arc::new(InboundFanout::new()));
        assert!(matches!(result, Err(NetworkError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_bind_assigns_port_and_rejects_second_bind() {
        // Arrange
        let socket = UdpDiscoverySocket::new().expect("create");
        let inbound = Arc::new(InboundFanout::new());

        // Act
        socket.bind(loopback_any_port(), Arc::clone(&inbound)).expect("bind");

        // Assert
        assert_ne!(socket.local_addr().unwrap().port(), 0);
        assert!(matches!(
            socket.bind(loopback_any_port(), inbound),
            Err(NetworkError::AlreadyBound)
        ));
    }

    #[tokio::test]
    async fn test_bound_socket_forwards_datagrams_to_fanout() {
        // Arrange
        let socket = UdpDiscoverySocket::new().expect("create");
        let inbound = Arc::new(InboundFanout::new());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        inbound.subscribe(Arc::new(move |payload, from| {
            let _ = tx.send((payload.to_vec(), from));
        }));
        socket.bind(loopback_any_port(), Arc::clone(&inbound)).expect("bind");
        let target = socket.local_addr().unwrap();

        // Act
        let peer = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        peer.send_to(b"HTTP/1.1 620 Server Standby\n", target).unwrap();

        // Assert
        let (payload, from) = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("datagram must arrive")
            .expect("channel open");
        assert_eq!(payload, b"HTTP/1.1 620 Server Standby\n");
        assert_eq!(from, peer.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_send_to_delivers_datagram_to_peer() {
        let socket = UdpDiscoverySocket::new().expect("create");
        socket
            .bind(loopback_any_port(), Arc::new(InboundFanout::new()))
            .expect("bind");
        let peer = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let sent = socket.send_to(b"SRCH", peer.local_addr().unwrap()).unwrap();

        let mut buf = [0u8; 16];
        let (n, _) = tokio::time::timeout(Duration::from_secs(2), peer.recv_from(&mut buf))
            .await
            .expect("datagram must arrive")
            .unwrap();
        assert_eq!(sent, 4);
        assert_eq!(&buf[..n], b"SRCH");
    }

    #[test]
    fn test_send_right_after_bind_from_sync_code_transmits() {
        // Arrange: a runtime that is entered but never polled before the send.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = runtime.enter();
        let peer = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        peer.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let socket = UdpDiscoverySocket::new().expect("create");
        socket
            .bind(loopback_any_port(), Arc::new(InboundFanout::new()))
            .expect("bind");

        // Act
        let first = socket.send_to(b"SRCH", peer.local_addr().unwrap());
        let second = socket.send_to(b"SRCH", peer.local_addr().unwrap());

        // Assert
        assert_eq!(first.unwrap(), 4);
        assert_eq!(second.unwrap(), 4);
        let mut buf = [0u8; 16];
        let (n, from) = peer.recv_from(&mut buf).expect("datagram must arrive");
        assert_eq!(&buf[..n], b"SRCH");
        assert_eq!(from, socket.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_recorded_receive_failure_is_reported_by_later_calls() {
        // Arrange
        let socket = UdpDiscoverySocket::new().expect("create");
        socket
            .bind(loopback_any_port(), Arc::new(InboundFanout::new()))
            .expect("bind");
        let error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "interface gone");

        // Act
        record_failure(&socket.failure, "receive", &error);
        record_failure(&socket.failure, "receive", &std::io::Error::other("later"));

        // Assert
        match socket.send_to(b"x", "127.0.0.1:9".parse().unwrap()) {
            Err(NetworkError::SocketFailed(reason)) => {
                assert_eq!(reason, "receive error: interface gone");
            }
            other => panic!("expected SocketFailed, got {other:?}"),
        }
        assert!(matches!(socket.local_addr(), Err(NetworkError::SocketFailed(_))));
        assert!(matches!(socket.set_broadcast(true), Err(NetworkError::SocketFailed(_))));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_further_use() {
        let socket = UdpDiscoverySocket::new().expect("create");
        socket
            .bind(loopback_any_port(), Arc::new(InboundFanout::new()))
            .expect("bind");

        socket.close();
        socket.close();

        assert!(matches!(
            socket.send_to(b"x", "127.0.0.1:9".parse().unwrap()),
            Err(NetworkError::Closed)
        ));
        assert!(matches!(socket.set_broadcast(true), Err(NetworkError::Closed)));
    }

    #[tokio::test]
    async fn test_set_broadcast_on_bound_socket_succeeds() {
        let socket = UdpDiscoverySocket::new().expect("create");
        socket
            .bind(loopback_any_port(), Arc::new(InboundFanout::new()))
            .expect("bind");
        assert!(socket.set_broadcast(true).is_ok());
    }
}
