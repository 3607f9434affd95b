//! HTTP decoy daemon
//!
//! Outbound plaintext requests to destinations the DNS daemons flagged at
//! level 2 or above get two decoys fired ahead of them. The inspector
//! locks onto the decoy's payload; the real request follows a beat later,
//! unfragmented.

use crate::Shared;
use sidestep_core::forge;
use sidestep_platform::{CapturedPacket, PacketCapture};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Pause between the decoys and the real segment
const DECOY_SETTLE: Duration = Duration::from_micros(10);

/// The HTTP decoy capture loop
pub struct HttpDaemon<C: PacketCapture + 'static> {
    shared: Arc<Shared>,
    handle: Arc<C>,
}

impl<C: PacketCapture + 'static> HttpDaemon<C> {
    /// Create a daemon over an open handle
    pub fn new(shared: Arc<Shared>, handle: Arc<C>) -> Self {
        Self { shared, handle }
    }

    /// Run until the capture handle fails
    pub fn run(&self) {
        loop {
            match self.handle.recv() {
                Ok(captured) => self.process(captured),
                Err(e) => {
                    warn!(error = %e, "HTTP capture ended");
                    return;
                }
            }
        }
    }

    /// Fire decoys for flagged destinations, then pass the request on
    pub fn process(&self, captured: CapturedPacket) {
        if let Ok(packet) = captured.parse() {
            let flagged = self
                .shared
                .ips
                .level_of(&packet.dst_addr)
                .is_some_and(|level| level > 1);

            if flagged {
                debug!(dst = %packet.dst_addr, "firing HTTP decoys");
                let decoy = forge::decoy(&packet, self.shared.settings.forged_ttl);
                for _ in 0..2 {
                    if let Err(e) = self.handle.send(&decoy, &captured.address) {
                        warn!(error = %e, "decoy injection failed");
                    }
                }
                std::thread::sleep(DECOY_SETTLE);
            }
        }

        if let Err(e) = self.handle.send(&captured.data, &captured.address) {
            warn!(error = %e, "failed to re-inject request");
        }
    }
}
