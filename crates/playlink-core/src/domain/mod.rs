//! Domain entities for Playlink.
//!
//! Pure data types with no socket or OS dependencies.

/// Consoles found on the network.
pub mod device;
