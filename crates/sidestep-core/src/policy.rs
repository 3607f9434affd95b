//! Classification tables
//!
//! Two tables drive every daemon: the domain table maps query names to a
//! policy, and the IP table maps destination addresses to a level. The
//! domain table is built once at startup and read-only afterwards; the IP
//! table is written by the DNS daemons while the TCP daemons read it on
//! every captured packet.

use dashmap::DashMap;
use std::collections::HashMap;
use std::net::IpAddr;

/// How aggressively a destination is manipulated.
///
/// Levels are cumulative: 1 rewrites DNS locally, 2 adds IP harvesting and
/// TLS/HTTP obstruction, 3 adds the SYN MSS override. Level 4 is accepted
/// in rule files but behaves as level 3.
pub type Level = u16;

/// Policy bound to a domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainPolicy {
    /// Intervention level, 0 means leave traffic alone
    pub level: Level,
    /// Number of A records encoded in `answers_v4`
    pub an_count_v4: u16,
    /// Number of AAAA records encoded in `answers_v6`
    pub an_count_v6: u16,
    /// Pre-encoded A answer records
    pub answers_v4: Vec<u8>,
    /// Pre-encoded AAAA answer records
    pub answers_v6: Vec<u8>,
}

impl DomainPolicy {
    /// A suppression-only entry: intervene, but hold no addresses
    pub fn bare(level: Level) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }
}

/// Domain name to policy mapping with suffix fallback
#[derive(Debug, Default)]
pub struct DomainTable {
    entries: HashMap<String, DomainPolicy>,
}

impl DomainTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a domain to a policy (name is lowercased)
    pub fn insert(&mut self, name: &str, policy: DomainPolicy) {
        self.entries.insert(name.to_lowercase(), policy);
    }

    /// Look up a query name, case-insensitively.
    ///
    /// Tries the exact name first, then the suffixes formed by dropping the
    /// leading label up to two times; `a.b.example.com` also tries
    /// `b.example.com` and `example.com`. Returns `None` when nothing
    /// matches, which callers treat as level 0.
    pub fn lookup(&self, qname: &str) -> Option<&DomainPolicy> {
        let qname = qname.to_lowercase();
        if let Some(policy) = self.entries.get(&qname) {
            return Some(policy);
        }

        let mut rest = qname.as_str();
        for _ in 0..2 {
            let dot = rest.find('.')?;
            rest = &rest[dot + 1..];
            if let Some(policy) = self.entries.get(rest) {
                return Some(policy);
            }
        }

        None
    }

    /// Number of configured domains
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Destination address to level mapping.
///
/// Read on every captured TCP/443, TCP/80, and TCP/53 packet and written by
/// the DNS daemons when they observe resolved addresses, so it lives in a
/// sharded concurrent map. Insertion is last-writer-wins.
#[derive(Debug, Default)]
pub struct IpPolicyTable {
    entries: DashMap<IpAddr, Level>,
}

impl IpPolicyTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an address at a level, replacing any previous level
    pub fn record(&self, ip: IpAddr, level: Level) {
        self.entries.insert(ip, level);
    }

    /// The level recorded for an address, if any
    pub fn level_of(&self, ip: &IpAddr) -> Option<Level> {
        self.entries.get(ip).map(|e| *e)
    }

    /// Number of recorded addresses
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
