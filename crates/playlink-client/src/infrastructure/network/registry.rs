//! Reference-counted discovery sockets keyed by requested bind port.
//!
//! Every discovery network that asks for the same bind port shares one
//! socket.  The socket is created on the first [`SocketRegistry::acquire`]
//! and closed when the last holder calls [`SocketRegistry::release`].
//!
//! The key is the port the caller *requested*, not the port the OS assigned.
//! All callers requesting port 0 therefore share a single socket bound to
//! whichever ephemeral port the first caller received.
//!
//! # Initialisation
//!
//! [`SocketRegistry::acquire_with`] runs the caller's initialiser (bind,
//! enable broadcast) on a new socket while the registry lock is held, and
//! only registers the socket if it succeeds.  A concurrent `acquire` of the
//! same port waits for that to finish, so a sharer never receives a socket
//! that is still unbound or whose bind failed.
//!
//! # Ownership
//!
//! There is no process-wide registry.  Construct one, wrap it in an `Arc`,
//! and hand it to every [`super::UdpDiscoveryNetworkFactory`] that should
//! share sockets.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use super::fanout::InboundFanout;
use super::socket::{DiscoverySocket, SocketFactory, UdpSocketFactory};
use super::NetworkError;

struct ManagedSocket {
    socket: Arc<dyn DiscoverySocket>,
    inbound: Arc<InboundFanout>,
    references: usize,
}

/// A shared handle returned by [`SocketRegistry::acquire`].
#[derive(Clone)]
pub struct AcquiredSocket {
    pub socket: Arc<dyn DiscoverySocket>,
    /// Subscriber list fed by this socket's receive loop.
    pub inbound: Arc<InboundFanout>,
    /// `true` if this call created the socket.
    pub is_new: bool,
}

/// Owns the discovery sockets and their reference counts.
pub struct SocketRegistry {
    factory: Arc<dyn SocketFactory>,
    sockets: Mutex<HashMap<u16, ManagedSocket>>,
}

impl SocketRegistry {
    /// Creates an empty registry that builds sockets with `factory`.
    pub fn new(factory: Arc<dyn SocketFactory>) -> Self {
        Self {
            factory,
            sockets: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an empty registry backed by real UDP sockets.
    pub fn udp() -> Self {
        Self::new(Arc::new(UdpSocketFactory))
    }

    /// Returns the socket registered for `port`, creating it if needed.
    ///
    /// An existing entry has its reference count incremented and is returned
    /// with `is_new == false`.  Otherwise a new unbound socket is created and
    /// registered with a count of 1.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::SocketCreate`] if a new socket cannot be
    /// created; the registry is left unchanged.
    pub fn acquire(&self, port: u16) -> Result<AcquiredSocket, NetworkError> {
        self.acquire_with(port, |_, _| Ok(()))
    }

    /// Like [`acquire`](Self::acquire), but a newly created socket is passed
    /// to `init` before it is registered.  `init` is not called for an
    /// existing entry.
    ///
    /// `init` runs under the registry lock and must not call back into the
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns the creation error or the error from `init`.  On error the new
    /// socket is closed and the registry is left unchanged.
    pub fn acquire_with<F>(&self, port: u16, init: F) -> Result<AcquiredSocket, NetworkError>
    where
        F: FnOnce(&dyn DiscoverySocket, &Arc<InboundFanout>) -> Result<(), NetworkError>,
    {
        debug!("acquire @ {port}");
        let mut sockets = self.lock()?;

        if let Some(existing) = sockets.get_mut(&port) {
            existing.references += 1;
            return Ok(AcquiredSocket {
                socket: Arc::clone(&existing.socket),
                inbound: Arc::clone(&existing.inbound),
                is_new: false,
            });
        }

        let managed = ManagedSocket {
            socket: self.factory.create()?,
            inbound: Arc::new(InboundFanout::new()),
            references: 1,
        };
        if let Err(e) = init(managed.socket.as_ref(), &managed.inbound) {
            managed.socket.close();
            return Err(e);
        }
        let acquired = AcquiredSocket {
            socket: Arc::clone(&managed.socket),
            inbound: Arc::clone(&managed.inbound),
            is_new: true,
        };
        sockets.insert(port, managed);
        info!("created discovery socket for bind port {port}");
        Ok(acquired)
    }

    /// Drops one reference to the socket for `port`, closing it when the
    /// count reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnbalancedRelease`] if no socket is registered
    /// for `port`.  This always indicates a caller bug.
    pub fn release(&self, port: u16) -> Result<(), NetworkError> {
        debug!("release @ {port}");
        let closing = {
            let mut sockets = self.lock()?;
            let managed = sockets
                .get_mut(&port)
                .ok_or(NetworkError::UnbalancedRelease { port })?;

            managed.references -= 1;
            if managed.references == 0 {
                sockets.remove(&port)
            } else {
                None
            }
        };

        if let Some(managed) = closing {
            managed.socket.close();
            info!("closed discovery socket for bind port {port}");
        }
        Ok(())
    }

    /// Current reference count for `port`, or `None` if unregistered.
    pub fn reference_count(&self, port: u16) -> Option<usize> {
        self.lock().ok()?.get(&port).map(|m| m.references)
    }

    /// Number of live sockets.
    pub fn len(&self) -> usize {
        self.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<u16, ManagedSocket>>, NetworkError> {
        self.sockets.lock().map_err(|_| NetworkError::LockPoisoned)
    }
}

impl Default for SocketRegistry {
    fn default() -> Self {
        Self::udp()
    }
}

impl std::fmt::Debug for SocketRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ports: Vec<(u16, usize)> = self
            .lock()
            .map(|s| s.iter().map(|(p, m)| (*p, m.references)).collect())
            .unwrap_or_default();
        ports.sort_unstable();
        f.debug_struct("SocketRegistry").field("ports", &ports).finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
