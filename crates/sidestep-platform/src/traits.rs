//! Capture and injection traits
//!
//! The daemons never talk to a driver directly; they hold a handle
//! implementing [`PacketCapture`] and open further handles through
//! [`CaptureOpen`]. Engine tests substitute in-memory implementations.

use crate::Result;
use sidestep_core::Packet;
use std::time::Duration;

/// A captured packet: raw bytes plus the metadata needed to re-inject it
#[derive(Debug, Clone)]
pub struct CapturedPacket {
    /// Raw packet data, IP header first
    pub data: Vec<u8>,
    /// Reinjection metadata
    pub address: PacketAddress,
}

impl CapturedPacket {
    /// Parse the raw bytes into a structured packet
    pub fn parse(&self) -> sidestep_core::Result<Packet> {
        Packet::from_bytes(&self.data)
    }
}

/// Driver metadata for re-injecting a packet at the right point
#[derive(Debug, Clone, Default)]
pub struct PacketAddress {
    /// Packet was leaving the host
    pub outbound: bool,
    /// Packet was on the loopback path
    pub loopback: bool,
    /// Packet was itself injected
    pub impostor: bool,
    /// IPv6 packet
    pub ipv6: bool,
    /// Interface index
    pub interface_index: u32,
    /// Subinterface index
    pub subinterface_index: u32,
}

impl PacketAddress {
    /// Metadata for an outbound packet
    pub fn outbound() -> Self {
        Self {
            outbound: true,
            ..Self::default()
        }
    }

    /// Metadata for an inbound packet
    pub fn inbound() -> Self {
        Self::default()
    }
}

/// Packet capture and injection over one open filter.
///
/// `recv` blocks until a matching packet is diverted. `send` injects a
/// buffer with checksum recomputation requested, so callers may hand over
/// forged packets with stale or zeroed checksums. Handles are shared
/// between a capture loop and injection workers via `Arc`, hence the
/// `&self` receivers.
pub trait PacketCapture: Send + Sync {
    /// Receive the next diverted packet
    fn recv(&self) -> Result<CapturedPacket>;

    /// Receive with a deadline; `Ok(None)` means the timer fired first
    fn recv_timeout(&self, timeout: Duration) -> Result<Option<CapturedPacket>>;

    /// Inject a packet
    fn send(&self, data: &[u8], addr: &PacketAddress) -> Result<()>;

    /// Close the handle, releasing the filter slot
    fn close(&self) -> Result<()>;

    /// The filter expression this handle was opened with
    fn filter(&self) -> &str;
}

/// Opens capture handles.
///
/// The TLS orchestrator opens a fresh one-shot handle per intercepted
/// connection, so daemons take an opener rather than a fixed set of
/// handles.
pub trait CaptureOpen: Send + Sync {
    /// Handle type produced by this opener
    type Handle: PacketCapture + 'static;

    /// Open a capture for a filter expression
    fn open(&self, filter: &str) -> Result<Self::Handle>;
}
