//! sidestep CLI
//!
//! Service control flags (`--install`, `--remove`, `--start`, `--stop`)
//! drive the service manager and exit; with no flags the engine runs in
//! the foreground against the rule file in the working directory.

mod args;
mod logging;
mod service;

use anyhow::{Context, Result};
use clap::Parser;
use sidestep_engine::{Engine, Shared};
use tracing::{error, info};

use args::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    if service::dispatch(&args)? {
        return Ok(());
    }

    // The rule file's log= setting participates in verbosity, so load
    // before wiring the subscriber; load failures go to stderr raw.
    let mut rules = sidestep_core::config::load(&args.config)
        .with_context(|| format!("cannot load rule file '{}'", args.config))?;
    rules.settings.service_mode = args.service;

    logging::init(rules.settings.log_level, args.verbose)?;

    if !args.service {
        print_banner();
    }

    info!(
        config = %args.config,
        domains = rules.domains.len(),
        local_dns = rules.settings.local_dns,
        "loaded rules"
    );

    // Rewritten answers should not fight cached ones
    service::flush_dns_cache();

    ctrlc::set_handler(|| {
        info!("interrupted, shutting down");
        service::flush_dns_cache();
        std::process::exit(0);
    })
    .context("failed to set interrupt handler")?;

    let engine = Engine::new(Shared::from_rules(rules), platform_opener()?);
    if let Err(e) = engine.run() {
        error!(error = %e, "engine stopped");
        return Err(e.into());
    }

    Ok(())
}

#[cfg(windows)]
fn platform_opener() -> Result<sidestep_platform::WinDivertOpener> {
    Ok(sidestep_platform::WinDivertOpener)
}

#[cfg(not(windows))]
fn platform_opener() -> Result<UnsupportedOpener> {
    Ok(UnsupportedOpener)
}

/// Placeholder opener for platforms without a diversion driver; every
/// daemon fails to open its filter and reports it.
#[cfg(not(windows))]
struct UnsupportedOpener;

#[cfg(not(windows))]
impl sidestep_platform::CaptureOpen for UnsupportedOpener {
    type Handle = UnsupportedHandle;

    fn open(&self, _filter: &str) -> sidestep_platform::Result<UnsupportedHandle> {
        Err(sidestep_platform::PlatformError::Unsupported)
    }
}

/// Uninhabited-in-practice handle type for [`UnsupportedOpener`]
#[cfg(not(windows))]
struct UnsupportedHandle;

#[cfg(not(windows))]
impl sidestep_platform::PacketCapture for UnsupportedHandle {
    fn recv(&self) -> sidestep_platform::Result<sidestep_platform::CapturedPacket> {
        Err(sidestep_platform::PlatformError::Unsupported)
    }

    fn recv_timeout(
        &self,
        _timeout: std::time::Duration,
    ) -> sidestep_platform::Result<Option<sidestep_platform::CapturedPacket>> {
        Err(sidestep_platform::PlatformError::Unsupported)
    }

    fn send(
        &self,
        _data: &[u8],
        _addr: &sidestep_platform::PacketAddress,
    ) -> sidestep_platform::Result<()> {
        Err(sidestep_platform::PlatformError::Unsupported)
    }

    fn close(&self) -> sidestep_platform::Result<()> {
        Ok(())
    }

    fn filter(&self) -> &str {
        ""
    }
}

fn print_banner() {
    use colored::Colorize;

    println!();
    println!("  {}", "sidestep".green().bold());
    println!("  {}", "DNS and SNI interception countermeasures".white());
    println!();
}
