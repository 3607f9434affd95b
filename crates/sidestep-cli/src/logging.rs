//! Logging initialization

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log file written next to the rule file when file logging is on
const LOG_FILE: &str = "sidestep.log";

/// Initialize logging.
///
/// The effective verbosity is the higher of the rule file's `log=` value
/// and the command line's `-v` count: 0 is warnings, 1 adds info, 2 adds
/// debug, 3 and up is everything. At `log >= 1` a log file is kept
/// alongside stderr so service runs leave a trace.
pub fn init(config_level: u8, verbose: u8) -> Result<()> {
    let effective = config_level.max(verbose);
    let level = match effective {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(effective >= 2));

    if config_level >= 1 {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_FILE)
            .with_context(|| format!("failed to open {LOG_FILE}"))?;
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(std::sync::Arc::new(file));
        subscriber.with(file_layer).init();
    } else {
        subscriber.init();
    }

    Ok(())
}
