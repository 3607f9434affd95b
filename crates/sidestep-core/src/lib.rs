//! # sidestep core
//!
//! Platform-independent core for the sidestep interception engine.
//!
//! This crate provides:
//! - **Packet codec** - IPv4/IPv6, UDP, and TCP header access over raw buffers
//! - **DNS wire codec** - question parsing, answer parsing, answer synthesis
//! - **TLS ClientHello inspection** - locating the SNI field
//! - **Policy tables** - domain and destination-IP classification
//! - **Forged-packet synthesis** - DNS replies, decoys, and segment splits
//! - **Configuration** - the flat-text rule file
//!
//! Nothing in here touches a capture driver; the packet types carry raw
//! bytes in and out, and the daemons in `sidestep-engine` wire them to a
//! divert handle.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod dns;
pub mod error;
pub mod forge;
pub mod packet;
pub mod policy;
pub mod tls;

pub use config::Settings;
pub use error::{Error, Result};
pub use packet::Packet;
pub use policy::{DomainPolicy, DomainTable, IpPolicyTable};
