//! DNS query daemon
//!
//! Captures outbound UDP/53 and decides per query: answer it locally from
//! the configured addresses, suppress it with an empty reply, tunnel it to
//! the upstream server over TCP, or let it pass. Level-0 names always pass
//! untouched.

use crate::resolver;
use crate::Shared;
use sidestep_core::dns::{self, QTYPE_A, QTYPE_AAAA};
use sidestep_core::policy::DomainPolicy;
use sidestep_core::{forge, Settings};
use sidestep_platform::{CapturedPacket, PacketCapture};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// What to do with one captured query
#[derive(Debug, PartialEq, Eq)]
enum Verdict<'a> {
    /// Re-inject unchanged
    Pass,
    /// Reply with ANCOUNT 0
    Suppress,
    /// Reply with pre-encoded records
    Answer {
        /// Record count for the reply header
        count: u16,
        /// Encoded answer records
        records: &'a [u8],
    },
    /// Resolve upstream over TCP and inject the response
    Tunnel,
}

/// Pick the outcome for a classified query.
///
/// AAAA queries are suppressed outright unless IPv6 answering is on. A
/// query whose family has no configured addresses while the other family
/// has some is suppressed too, so the client does not fall back to the
/// tampered path. With no addresses at all the query goes upstream, or
/// passes through when the upstream is the loopback resolver.
fn classify<'a>(policy: &'a DomainPolicy, qtype: u16, settings: &Settings) -> Verdict<'a> {
    if !settings.ipv6 && qtype == QTYPE_AAAA {
        return Verdict::Suppress;
    }

    let (own, other, records) = match qtype {
        QTYPE_A => (policy.an_count_v4, policy.an_count_v6, &policy.answers_v4),
        QTYPE_AAAA => (policy.an_count_v6, policy.an_count_v4, &policy.answers_v6),
        _ => (0, 0, &policy.answers_v4),
    };

    if own > 0 {
        Verdict::Answer {
            count: own,
            records,
        }
    } else if other > 0 && matches!(qtype, QTYPE_A | QTYPE_AAAA) {
        Verdict::Suppress
    } else if settings.local_dns {
        Verdict::Pass
    } else {
        Verdict::Tunnel
    }
}

/// The outbound-query capture loop
pub struct DnsQueryDaemon<C: PacketCapture + 'static> {
    shared: Arc<Shared>,
    handle: Arc<C>,
}

impl<C: PacketCapture + 'static> DnsQueryDaemon<C> {
    /// Create a daemon over an open handle
    pub fn new(shared: Arc<Shared>, handle: Arc<C>) -> Self {
        Self { shared, handle }
    }

    /// Run until the capture handle fails
    pub fn run(&self) {
        loop {
            match self.handle.recv() {
                Ok(captured) => {
                    // Tunnel workers detach; they own their buffers
                    let _ = self.process(captured);
                }
                Err(e) => {
                    warn!(error = %e, "DNS query capture ended");
                    return;
                }
            }
        }
    }

    /// Handle one captured query. Returns the tunnel worker, if one was
    /// spawned, so callers can wait on it.
    pub fn process(&self, captured: CapturedPacket) -> Option<JoinHandle<()>> {
        let packet = match captured.parse() {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "dropping unparseable packet");
                return None;
            }
        };

        let question = match dns::parse_question(packet.payload()) {
            Ok(q) => q,
            Err(e) => {
                debug!(error = %e, "dropping malformed query");
                return None;
            }
        };

        let policy = match self.shared.domains.lookup(&question.name) {
            Some(p) if p.level > 0 => p,
            _ => {
                self.inject(&captured.data, &captured);
                return None;
            }
        };

        match classify(policy, question.qtype, &self.shared.settings) {
            Verdict::Pass => {
                self.inject(&captured.data, &captured);
                None
            }
            Verdict::Suppress => {
                debug!(name = %question.name, qtype = question.qtype, "suppressing query");
                self.inject(&forge::dns_reply(&packet, 0, &[]), &captured);
                None
            }
            Verdict::Answer { count, records } => {
                info!(name = %question.name, count, "answering locally");
                self.inject(&forge::dns_reply(&packet, count, records), &captured);
                None
            }
            Verdict::Tunnel => {
                if packet.is_ipv6() {
                    // The tunnel path synthesizes IPv4 replies only
                    self.inject(&captured.data, &captured);
                    return None;
                }
                info!(name = %question.name, level = policy.level, "tunneling upstream");
                Some(self.spawn_tunnel(packet, captured, question.answers_offset, policy.level))
            }
        }
    }

    fn spawn_tunnel(
        &self,
        packet: sidestep_core::Packet,
        captured: CapturedPacket,
        answers_offset: usize,
        level: u16,
    ) -> JoinHandle<()> {
        let handle = Arc::clone(&self.handle);
        let shared = Arc::clone(&self.shared);

        std::thread::spawn(move || {
            let server = &shared.settings.dns_server;
            let response = match resolver::tcp_lookup(packet.payload(), server) {
                Ok(r) => r,
                Err(e) => {
                    // The query was already consumed; the client times out
                    debug!(error = %e, "abandoning tunneled query");
                    return;
                }
            };

            if response.len() >= answers_offset {
                let count = dns::answer_count(&response);
                match dns::parse_answers(&response[answers_offset..], count) {
                    Ok(ips) => {
                        for ip in ips {
                            shared.ips.record(ip, level);
                        }
                    }
                    Err(e) => debug!(error = %e, "unparseable upstream answers"),
                }
            }

            let reply = forge::tunnel_reply(&packet, &response);
            if let Err(e) = handle.send(&reply, &captured.address) {
                warn!(error = %e, "failed to inject tunneled reply");
            }
        })
    }

    fn inject(&self, data: &[u8], captured: &CapturedPacket) {
        if let Err(e) = self.handle.send(data, &captured.address) {
            warn!(error = %e, "failed to inject packet");
        }
    }
}
