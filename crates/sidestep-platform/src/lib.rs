//! # sidestep platform
//!
//! The packet-diversion layer: traits the daemons capture and inject
//! through, the filter expressions they open, and the WinDivert driver
//! wrapper that implements them on Windows.
//!
//! On other platforms opening a handle fails cleanly; the engine is
//! exercised there through mock captures in its tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
pub mod filters;
mod traits;

pub use error::{PlatformError, Result};
pub use traits::{CaptureOpen, CapturedPacket, PacketAddress, PacketCapture};

#[cfg(windows)]
pub mod windows;

#[cfg(windows)]
pub use windows::{WinDivertHandle, WinDivertOpener};
