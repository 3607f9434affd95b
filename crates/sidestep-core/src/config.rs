//! Rule-file configuration
//!
//! The engine is driven by a flat text file, by convention named `config`
//! in the working directory. `#LEVELn` directives set the level for the
//! domain entries that follow; `key=value` lines set scalars or bind a
//! domain to a list of addresses; bare tokens toggle modes or add
//! suppression-only domains.
//!
//! ```text
//! server=8.8.8.8:53
//! ttl=6
//! #LEVEL1
//! pinned.example=10.0.0.1
//! #LEVEL2
//! blocked.example
//! ```

use crate::dns::{self, QTYPE_A, QTYPE_AAAA};
use crate::error::{Error, Result};
use crate::policy::{DomainPolicy, DomainTable, IpPolicyTable, Level};
use std::net::IpAddr;
use std::path::Path;
use tracing::{debug, warn};

/// Default forged MSS when the rule file does not set one
pub const DEFAULT_MSS: u16 = 1024;

/// Scalar settings, immutable once loaded
#[derive(Debug, Clone)]
pub struct Settings {
    /// Upstream DNS endpoint (`host:port`) for the TCP tunnel
    pub dns_server: String,
    /// TTL stamped on decoys; 0 selects the malformed-header decoy instead
    pub forged_ttl: u8,
    /// MSS value written into SYNs at level 3
    pub forged_mss: u16,
    /// Upstream DNS is loopback: queries pass through, responses are harvested
    pub local_dns: bool,
    /// Answer AAAA queries instead of suppressing them
    pub ipv6: bool,
    /// Log verbosity from the rule file
    pub log_level: u8,
    /// Running under the service manager rather than a terminal
    pub service_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dns_server: String::new(),
            forged_ttl: 0,
            forged_mss: DEFAULT_MSS,
            local_dns: false,
            ipv6: false,
            log_level: 0,
            service_mode: true,
        }
    }
}

/// Everything a rule file produces
#[derive(Debug)]
pub struct Rules {
    /// Scalar settings
    pub settings: Settings,
    /// Domain classification table
    pub domains: DomainTable,
    /// Destination-IP table, seeded from the static address lists
    pub ips: IpPolicyTable,
}

/// Load and parse a rule file.
///
/// A missing or unreadable file is fatal; the engine cannot run without
/// its classification tables.
pub fn load(path: impl AsRef<Path>) -> Result<Rules> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::ConfigInvalid(format!("cannot read {}: {e}", path.display())))?;
    parse(&text)
}

/// Parse rule-file text.
pub fn parse(text: &str) -> Result<Rules> {
    let mut settings = Settings::default();
    let mut domains = DomainTable::new();
    let ips = IpPolicyTable::new();
    let mut level: Level = 0;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(directive) = line.strip_prefix('#') {
            // #LEVEL0..#LEVEL4 switch the level; any other #-line is a comment
            if let Some(rest) = directive.strip_prefix("LEVEL") {
                if let Ok(new_level @ 0..=4) = rest.parse::<Level>() {
                    level = new_level;
                }
            }
            continue;
        }

        match line.split_once('=') {
            Some(("server", value)) => {
                settings.dns_server = value.to_string();
                if value == "127.0.0.1:53" || value == "[::1]:53" {
                    settings.local_dns = true;
                }
                debug!(server = value, local_dns = settings.local_dns, "upstream DNS");
            }
            Some(("ttl", value)) => {
                settings.forged_ttl = value
                    .parse()
                    .map_err(|_| Error::config_value("ttl", format!("not a TTL: {value}")))?;
            }
            Some(("mss", value)) => {
                settings.forged_mss = value
                    .parse()
                    .map_err(|_| Error::config_value("mss", format!("not an MSS: {value}")))?;
            }
            Some(("log", value)) => {
                settings.log_level = value
                    .parse()
                    .map_err(|_| Error::config_value("log", format!("not a level: {value}")))?;
            }
            Some((domain, list)) => {
                let addrs = parse_address_list(domain, list);
                for ip in &addrs {
                    ips.record(*ip, level);
                }
                let (an_count_v4, answers_v4) = dns::pack_answers(&addrs, QTYPE_A);
                let (an_count_v6, answers_v6) = dns::pack_answers(&addrs, QTYPE_AAAA);
                domains.insert(
                    domain,
                    DomainPolicy {
                        level,
                        an_count_v4,
                        an_count_v6,
                        answers_v4,
                        answers_v6,
                    },
                );
            }
            None => match line {
                "local-dns" => settings.local_dns = true,
                "ipv6" => settings.ipv6 = true,
                domain => domains.insert(domain, DomainPolicy::bare(level)),
            },
        }
    }

    Ok(Rules {
        settings,
        domains,
        ips,
    })
}

/// Parse a comma-separated address list, dropping entries that are not
/// addresses. A domain bound to nothing parseable degrades to a
/// suppression entry.
fn parse_address_list(domain: &str, list: &str) -> Vec<IpAddr> {
    list.split(',')
        .filter_map(|s| {
            let s = s.trim();
            match s.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    warn!(domain, entry = s, "ignoring unparseable address");
                    None
                }
            }
        })
        .collect()
}
