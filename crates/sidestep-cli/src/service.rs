//! Service control glue
//!
//! Thin wrappers around the Windows service manager. The engine itself is
//! platform-agnostic; installing it as a background service only makes
//! sense where the diversion driver exists.

use anyhow::Result;

/// Service name registered with the service manager
pub const SERVICE_NAME: &str = "sidestep";

#[cfg(windows)]
mod control {
    use super::SERVICE_NAME;
    use anyhow::{bail, Context, Result};
    use tracing::info;

    /// Install the service pointing at this executable
    pub fn install() -> Result<()> {
        let exe = std::env::current_exe().context("cannot locate own executable")?;
        let bin_path = format!("{} --service", exe.display());
        run_control(
            "sc",
            &["create", SERVICE_NAME, &format!("binPath={bin_path}"), "start=auto"],
        )?;
        info!(service = SERVICE_NAME, "installed");
        Ok(())
    }

    /// Remove the installed service
    pub fn remove() -> Result<()> {
        run_control("sc", &["delete", SERVICE_NAME])?;
        info!(service = SERVICE_NAME, "removed");
        Ok(())
    }

    /// Start the installed service
    pub fn start() -> Result<()> {
        run_control("net", &["start", SERVICE_NAME])
    }

    /// Stop the running service
    pub fn stop() -> Result<()> {
        run_control("net", &["stop", SERVICE_NAME])
    }

    fn run_control(program: &str, args: &[&str]) -> Result<()> {
        let output = std::process::Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to run {program}"))?;
        if !output.status.success() {
            bail!(
                "{program} {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stdout).trim()
            );
        }
        Ok(())
    }
}

#[cfg(windows)]
pub use control::{install, remove, start, stop};

#[cfg(not(windows))]
mod control {
    use anyhow::{bail, Result};

    /// Service control is Windows-only
    pub fn unsupported() -> Result<()> {
        bail!("service control requires the Windows service manager")
    }
}

#[cfg(not(windows))]
pub use control::{
    unsupported as install, unsupported as remove, unsupported as start, unsupported as stop,
};

/// Flush the OS resolver cache so rewritten answers take effect at once.
///
/// Failure is not fatal; the stale entries age out on their own.
pub fn flush_dns_cache() {
    #[cfg(windows)]
    {
        match std::process::Command::new("ipconfig").arg("/flushdns").output() {
            Ok(output) if output.status.success() => tracing::info!("flushed DNS cache"),
            Ok(output) => tracing::warn!(
                output = %String::from_utf8_lossy(&output.stdout).trim(),
                "DNS cache flush failed"
            ),
            Err(e) => tracing::warn!(error = %e, "DNS cache flush failed"),
        }
    }
    #[cfg(not(windows))]
    tracing::debug!("no DNS cache to flush on this platform");
}

/// Dispatch a service-control flag, if one was given.
///
/// Returns `true` when a control action ran and the process should exit.
pub fn dispatch(args: &crate::args::Args) -> Result<bool> {
    if args.install {
        install()?;
    } else if args.remove {
        remove()?;
    } else if args.start {
        start()?;
    } else if args.stop {
        stop()?;
        flush_dns_cache();
    } else {
        return Ok(false);
    }
    Ok(true)
}
