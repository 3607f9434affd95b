//! DNS response daemon
//!
//! Runs only in local-DNS mode, where queries pass through to the loopback
//! resolver and the answers come back past this daemon. It harvests the
//! A records of responses for domains above level 1 into the IP table so
//! the TCP daemons recognize those destinations, then re-injects every
//! packet untouched.

use crate::Shared;
use sidestep_core::dns::{self, QTYPE_A};
use sidestep_platform::{CapturedPacket, PacketCapture};
use std::sync::Arc;
use tracing::{debug, warn};

/// The response-harvesting capture loop
pub struct DnsResponseDaemon<C: PacketCapture + 'static> {
    shared: Arc<Shared>,
    handle: Arc<C>,
}

impl<C: PacketCapture + 'static> DnsResponseDaemon<C> {
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
                    warn!(error = %e, "DNS response capture ended");
                    return;
                }
            }
        }
    }

    /// Harvest one captured response and re-inject it
    pub fn process(&self, captured: CapturedPacket) {
        if let Err(e) = self.harvest(&captured) {
            debug!(error = %e, "response not harvested");
        }

        // The response itself always continues to the client
        if let Err(e) = self.handle.send(&captured.data, &captured.address) {
            warn!(error = %e, "failed to re-inject response");
        }
    }

    fn harvest(&self, captured: &CapturedPacket) -> sidestep_core::Result<()> {
        let packet = captured.parse()?;
        let msg = packet.payload();
        let question = dns::parse_question(msg)?;

        let Some(policy) = self.shared.domains.lookup(&question.name) else {
            return Ok(());
        };
        if policy.level <= 1 || question.qtype != QTYPE_A {
            return Ok(());
        }

        let count = dns::answer_count(msg);
        let ips = dns::parse_answers(&msg[question.answers_offset..], count)?;
        debug!(name = %question.name, level = policy.level, count = ips.len(), "harvesting addresses");
        for ip in ips {
            self.shared.ips.record(ip, policy.level);
        }

        Ok(())
    }
}
