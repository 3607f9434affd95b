//! DNS-over-TLS obstruction daemon
//!
//! Runs only when the engine tunnels DNS itself: external DoT resolvers
//! must fail so the tunneled upstream is the one that answers. Every
//! outbound TCP/53 data segment is replaced by the four-packet burst —
//! decoy, prefix, decoy, suffix — cut a fixed distance into the payload,
//! which corrupts the TLS stream for the far side while the on-path
//! inspector tracks the decoy.

use crate::Shared;
use sidestep_core::forge;
use sidestep_platform::{CapturedPacket, PacketCapture};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Bytes cut into the first real segment
pub const DOT_CUT_OFFSET: usize = 20;

/// The DoT obstruction capture loop
pub struct DotDaemon<C: PacketCapture + 'static> {
    shared: Arc<Shared>,
    handle: Arc<C>,
}

impl<C: PacketCapture + 'static> DotDaemon<C> {
    /// Create a daemon over an open handle
    pub fn new(shared: Arc<Shared>, handle: Arc<C>) -> Self {
        Self { shared, handle }
    }

    /// Run until the capture handle fails or an injection fails.
    ///
    /// Unlike the other daemons this one stops on a send failure: a burst
    /// that went out half-way leaves the flow in a state not worth
    /// compounding.
    pub fn run(&self) {
        loop {
            match self.handle.recv() {
                Ok(captured) => {
                    if !self.process(captured) {
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "DoT capture ended");
                    return;
                }
            }
        }
    }

    /// Replace one captured segment with the burst. Returns `false` when an
    /// injection failed and the loop should stop.
    pub fn process(&self, captured: CapturedPacket) -> bool {
        let packet = match captured.parse() {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "dropping unparseable segment");
                return true;
            }
        };

        if packet.payload_len() <= DOT_CUT_OFFSET {
            // Too short to split; not a TLS handshake worth breaking
            return match self.handle.send(&captured.data, &captured.address) {
                Ok(()) => true,
                Err(e) => {
                    error!(error = %e, "failed to re-inject short segment");
                    false
                }
            };
        }

        let decoy = forge::decoy(&packet, self.shared.settings.forged_ttl);
        let (prefix, suffix) = forge::split_segment(&packet, DOT_CUT_OFFSET);

        debug!(dst = %packet.dst_addr, "obstructing DoT segment");
        for part in [&decoy, &prefix, &decoy, &suffix] {
            if let Err(e) = self.handle.send(part, &captured.address) {
                error!(error = %e, "burst injection failed");
                return false;
            }
        }

        true
    }
}
