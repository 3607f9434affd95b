//! Windows diversion backend (WinDivert)

mod driver;

pub use driver::{WinDivertHandle, WinDivertOpener};
