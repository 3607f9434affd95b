//! Engine runtime
//!
//! Wires the daemons to their filters and shared state. One thread per
//! capture loop: the DNS query daemon always runs; response harvesting and
//! DoT obstruction are alternatives selected by local-DNS mode; the HTTP
//! daemon always runs; the TLS orchestrator runs on the calling thread.
//!
//! A daemon whose filter cannot be opened logs the failure and stays down;
//! the others are unaffected.

use crate::dns_query::DnsQueryDaemon;
use crate::dns_response::DnsResponseDaemon;
use crate::dot::DotDaemon;
use crate::http::HttpDaemon;
use crate::tls::TlsInterceptor;
use crate::Shared;
use sidestep_platform::{filters, CaptureOpen};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

/// The assembled engine
pub struct Engine<O: CaptureOpen + 'static> {
    shared: Arc<Shared>,
    opener: Arc<O>,
}

impl<O: CaptureOpen + 'static> Engine<O> {
    /// Assemble an engine from shared state and a handle opener
    pub fn new(shared: Shared, opener: O) -> Self {
        Self {
            shared: Arc::new(shared),
            opener: Arc::new(opener),
        }
    }

    /// Start every daemon and block on the TLS orchestrator.
    ///
    /// Returns when the SYN capture cannot be opened or its loop ends.
    pub fn run(&self) -> sidestep_platform::Result<()> {
        let local_dns = self.shared.settings.local_dns;
        info!(
            domains = self.shared.domains.len(),
            seeded_ips = self.shared.ips.len(),
            local_dns,
            "starting daemons"
        );

        {
            let shared = Arc::clone(&self.shared);
            let opener = Arc::clone(&self.opener);
            thread::spawn(move || match opener.open(filters::DNS_QUERY) {
                Ok(handle) => DnsQueryDaemon::new(shared, Arc::new(handle)).run(),
                Err(e) => error!(error = %e, "DNS query daemon not started"),
            });
        }

        if local_dns {
            let shared = Arc::clone(&self.shared);
            let opener = Arc::clone(&self.opener);
            thread::spawn(move || match opener.open(filters::DNS_RESPONSE) {
                Ok(handle) => DnsResponseDaemon::new(shared, Arc::new(handle)).run(),
                Err(e) => error!(error = %e, "DNS response daemon not started"),
            });
        } else {
            let shared = Arc::clone(&self.shared);
            let opener = Arc::clone(&self.opener);
            thread::spawn(move || match opener.open(filters::DOT_PUSH) {
                Ok(handle) => DotDaemon::new(shared, Arc::new(handle)).run(),
                Err(e) => error!(error = %e, "DoT daemon not started"),
            });
        }

        {
            let shared = Arc::clone(&self.shared);
            let opener = Arc::clone(&self.opener);
            thread::spawn(move || match opener.open(filters::HTTP_PUSH) {
                Ok(handle) => HttpDaemon::new(shared, Arc::new(handle)).run(),
                Err(e) => error!(error = %e, "HTTP daemon not started"),
            });
        }

        TlsInterceptor::new(Arc::clone(&self.shared), Arc::clone(&self.opener)).run()
    }
}
