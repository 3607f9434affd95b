//! WinDivert driver wrapper
//!
//! Safe wrapper around WinDivert using the `windivert` crate. One handle
//! per filter; the driver diverts matching packets to `recv` and puts
//! injected buffers back into the stack with checksums recomputed.

use crate::error::{PlatformError, Result};
use crate::traits::{CaptureOpen, CapturedPacket, PacketAddress, PacketCapture};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use windivert::error::WinDivertError;
use windivert::layer::NetworkLayer;
use windivert::prelude::*;
use windivert_sys::ChecksumFlags;

/// Largest packet the capture loops expect to see
const RECV_BUFFER_SIZE: usize = 65535;

/// An open WinDivert handle bound to one filter
pub struct WinDivertHandle {
    handle: WinDivert<NetworkLayer>,
    filter: String,
    recv_buffer: Mutex<Vec<u8>>,
}

// The WinDivert handle is a kernel object usable from any thread.
unsafe impl Send for WinDivertHandle {}
unsafe impl Sync for WinDivertHandle {}

impl WinDivertHandle {
    /// Open a handle for a filter expression
    pub fn open(filter: &str) -> Result<Self> {
        if filter.is_empty() {
            return Err(PlatformError::InvalidFilter("empty filter".into()));
        }

        info!(filter, "opening divert handle");
        let handle = WinDivert::network(filter, 0, WinDivertFlags::new())
            .map_err(|e| PlatformError::open_failed(filter, format!("{e:?}")))?;

        Ok(Self {
            handle,
            filter: filter.to_string(),
            recv_buffer: Mutex::new(vec![0u8; RECV_BUFFER_SIZE]),
        })
    }

    fn captured_from(&self, data: Vec<u8>, addr: &WinDivertAddress<NetworkLayer>) -> CapturedPacket {
        CapturedPacket {
            data,
            address: PacketAddress {
                outbound: addr.outbound(),
                loopback: addr.loopback(),
                impostor: addr.impostor(),
                ipv6: addr.ipv6(),
                interface_index: addr.interface_index(),
                subinterface_index: addr.subinterface_index(),
            },
        }
    }
}

impl PacketCapture for WinDivertHandle {
    fn recv(&self) -> Result<CapturedPacket> {
        let mut buffer = self.recv_buffer.lock();
        let packet = self
            .handle
            .recv(Some(&mut buffer[..]))
            .map_err(|e| PlatformError::CaptureFailed(format!("{e:?}")))?;

        let data = packet.data.to_vec();
        Ok(self.captured_from(data, &packet.address))
    }

    fn recv_timeout(&self, timeout: Duration) -> Result<Option<CapturedPacket>> {
        let mut buffer = self.recv_buffer.lock();
        match self
            .handle
            .recv_wait(Some(&mut buffer[..]), timeout.as_millis() as u32)
        {
            Ok(packet) => {
                let data = packet.data.to_vec();
                Ok(Some(self.captured_from(data, &packet.address)))
            }
            Err(WinDivertError::Timeout) => Ok(None),
            Err(e) => Err(PlatformError::CaptureFailed(format!("{e:?}"))),
        }
    }

    fn send(&self, data: &[u8], addr: &PacketAddress) -> Result<()> {
        // SAFETY: every field is filled in before the send
        let mut wd_addr = unsafe { WinDivertAddress::<NetworkLayer>::new() };
        wd_addr.set_outbound(addr.outbound);
        wd_addr.set_loopback(addr.loopback);
        wd_addr.set_impostor(addr.impostor);
        wd_addr.set_interface_index(addr.interface_index);
        wd_addr.set_subinterface_index(addr.subinterface_index);
        // Forged buffers carry stale checksums; have the helper redo them
        wd_addr.set_ip_checksum(false);
        wd_addr.set_tcp_checksum(false);
        wd_addr.set_udp_checksum(false);

        let mut packet = WinDivertPacket::<NetworkLayer> {
            address: wd_addr,
            data: data.to_vec().into(),
        };

        if let Err(e) = packet.recalculate_checksums(ChecksumFlags::default()) {
            warn!(error = ?e, "checksum recalculation failed");
        }

        self.handle
            .send(&packet)
            .map_err(|e| PlatformError::InjectFailed(format!("{e:?}")))?;

        Ok(())
    }

    fn close(&self) -> Result<()> {
        // The kernel handle is released when the wrapper drops; nothing is
        // left blocked on it because waits go through recv_timeout.
        debug!(filter = %self.filter, "closing divert handle");
        Ok(())
    }

    fn filter(&self) -> &str {
        &self.filter
    }
}

/// Opener producing [`WinDivertHandle`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct WinDivertOpener;

impl CaptureOpen for WinDivertOpener {
    type Handle = WinDivertHandle;

    fn open(&self, filter: &str) -> Result<WinDivertHandle> {
        WinDivertHandle::open(filter)
    }
}
