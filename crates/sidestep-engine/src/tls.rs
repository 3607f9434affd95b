//! TLS interception
//!
//! The orchestrator watches outbound TCP/443 SYNs. When the destination is
//! in the IP table it rewrites the SYN's MSS at level 3 and, at level 2 or
//! above, dedicates a one-shot worker to the connection's ephemeral source
//! port. The worker catches the first data segment — the ClientHello —
//! and splits it in the middle of the SNI host name, wrapped in decoys,
//! so substring matchers on the path never see the name in one piece.

use crate::Shared;
use sidestep_core::{forge, tls};
use sidestep_platform::{filters, CaptureOpen, CapturedPacket, PacketCapture};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long a worker waits for the ClientHello before giving up
pub const HELLO_TIMEOUT: Duration = Duration::from_secs(32);

/// The SYN-watching orchestrator
pub struct TlsInterceptor<O: CaptureOpen + 'static> {
    shared: Arc<Shared>,
    opener: Arc<O>,
}

impl<O: CaptureOpen + 'static> TlsInterceptor<O> {
    /// Create an orchestrator; it opens its own SYN capture in [`run`](Self::run)
    pub fn new(shared: Arc<Shared>, opener: Arc<O>) -> Self {
        Self { shared, opener }
    }

    /// Open the SYN capture and run until it fails
    pub fn run(&self) -> sidestep_platform::Result<()> {
        let handle = Arc::new(self.opener.open(filters::TLS_SYN)?);

        loop {
            match handle.recv() {
                Ok(captured) => {
                    // Workers detach; each owns its one-shot handle
                    let _ = self.process(&handle, captured);
                }
                Err(e) => {
                    error!(error = %e, "TLS SYN capture ended");
                    return Ok(());
                }
            }
        }
    }

    /// Handle one captured SYN. Returns the ClientHello worker, if one was
    /// spawned, so callers can wait on it.
    pub fn process(&self, handle: &Arc<O::Handle>, captured: CapturedPacket) -> Option<JoinHandle<()>> {
        let mut packet = match captured.parse() {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "dropping unparseable SYN");
                return None;
            }
        };

        let Some(level) = self.shared.ips.level_of(&packet.dst_addr) else {
            self.inject(handle, &captured.data, &captured);
            return None;
        };

        if level > 2 && packet.set_mss_option(self.shared.settings.forged_mss) {
            debug!(dst = %packet.dst_addr, mss = self.shared.settings.forged_mss, "rewrote SYN MSS");
        }

        let worker = if level > 1 {
            info!(dst = %packet.dst_addr, level, src_port = packet.src_port, "watching for ClientHello");
            let opener = Arc::clone(&self.opener);
            let src_port = packet.src_port;
            let ttl = self.shared.settings.forged_ttl;
            Some(std::thread::spawn(move || {
                hello_worker(&*opener, src_port, ttl, HELLO_TIMEOUT);
            }))
        } else {
            None
        };

        self.inject(handle, packet.as_bytes(), &captured);
        worker
    }

    fn inject(&self, handle: &Arc<O::Handle>, data: &[u8], captured: &CapturedPacket) {
        if let Err(e) = handle.send(data, &captured.address) {
            warn!(error = %e, "failed to re-inject SYN");
        }
    }
}

/// One-shot ClientHello fragmenter for a single connection.
///
/// Opens a capture keyed on the source port, waits up to `timeout` for the
/// first data segment, and replaces it with the decoy/prefix/decoy/suffix
/// burst cut in the middle of the SNI host name. A segment without a
/// recognizable SNI is re-injected untouched. The handle closes on return,
/// freeing the filter slot; on timeout nothing was captured and the
/// connection proceeds unmodified.
pub fn hello_worker<O: CaptureOpen>(opener: &O, src_port: u16, ttl: u8, timeout: Duration) {
    let filter = filters::client_hello(src_port);
    let handle = match opener.open(&filter) {
        Ok(h) => h,
        Err(e) => {
            warn!(error = %e, src_port, "could not open ClientHello capture");
            return;
        }
    };

    let captured = match handle.recv_timeout(timeout) {
        Ok(Some(c)) => c,
        Ok(None) => {
            debug!(src_port, "no ClientHello before timeout");
            let _ = handle.close();
            return;
        }
        Err(e) => {
            debug!(error = %e, src_port, "ClientHello capture failed");
            let _ = handle.close();
            return;
        }
    };

    fragment_hello(&handle, captured, ttl);
    let _ = handle.close();
}

/// Split one captured ClientHello around its SNI
fn fragment_hello<C: PacketCapture>(handle: &C, captured: CapturedPacket, ttl: u8) {
    let packet = match captured.parse() {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "dropping unparseable segment");
            return;
        }
    };

    let cut = match tls::locate_sni(packet.payload()) {
        Some((sni_offset, sni_length)) if sni_length > 0 => sni_offset + sni_length / 2,
        _ => {
            // No SNI to hide; let the segment through as captured
            if let Err(e) = handle.send(&captured.data, &captured.address) {
                warn!(error = %e, "failed to re-inject segment");
            }
            return;
        }
    };

    let decoy = forge::decoy(&packet, ttl);
    let (prefix, suffix) = forge::split_segment(&packet, cut);

    debug!(dst = %packet.dst_addr, cut, "fragmenting ClientHello");
    for part in [&decoy, &prefix, &decoy, &suffix] {
        if let Err(e) = handle.send(part, &captured.address) {
            warn!(error = %e, "burst injection failed");
            return;
        }
    }
}
