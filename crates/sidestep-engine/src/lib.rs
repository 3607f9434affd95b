//! # sidestep engine
//!
//! The interception daemons. Each daemon owns one capture loop over a
//! divert filter and decides per packet whether to re-inject it unchanged,
//! replace it with forged traffic, or spin up a short-lived worker for the
//! connection it announces.
//!
//! | daemon | filter | job |
//! |---|---|---|
//! | [`dns_query`] | outbound UDP/53 | answer, suppress, tunnel, or pass DNS queries |
//! | [`dns_response`] | inbound UDP src 53 | harvest resolved addresses |
//! | [`dot`] | TCP PSH dst 53 | break DNS-over-TLS with decoys and splits |
//! | [`http`] | TCP PSH dst 80 | decoys ahead of plaintext requests |
//! | [`tls`] | TCP/443 SYN | MSS override and ClientHello fragmentation |
//!
//! Daemons are generic over the capture traits so the whole engine runs
//! against in-memory captures in tests.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod dns_query;
pub mod dns_response;
pub mod dot;
pub mod http;
pub mod resolver;
pub mod runtime;
pub mod tls;

pub use runtime::Engine;

use sidestep_core::{config::Rules, DomainTable, IpPolicyTable, Settings};

/// State shared by every daemon.
///
/// Settings and the domain table are immutable after config load; the IP
/// table takes concurrent writes from the DNS daemons while the TCP
/// daemons read it on every captured packet.
#[derive(Debug)]
pub struct Shared {
    /// Scalar settings
    pub settings: Settings,
    /// Domain classification, read-only
    pub domains: DomainTable,
    /// Destination-address classification, written at runtime
    pub ips: IpPolicyTable,
}

impl Shared {
    /// Build shared state from parsed rules
    pub fn from_rules(rules: Rules) -> Self {
        Self {
            settings: rules.settings,
            domains: rules.domains,
            ips: rules.ips,
        }
    }
}
