//! Command line arguments

use clap::Parser;

/// sidestep command line
#[derive(Parser, Debug)]
#[command(name = "sidestep", version)]
#[command(about = "Host-resident interception engine against DNS tampering and SNI filtering")]
pub struct Args {
    /// Install the Windows service
    #[arg(long)]
    pub install: bool,

    /// Remove the Windows service
    #[arg(long)]
    pub remove: bool,

    /// Start the installed service
    #[arg(long)]
    pub start: bool,

    /// Stop the running service
    #[arg(long)]
    pub stop: bool,

    /// Rule file path
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Run under the service manager (set on the installed command line)
    #[arg(long, hide = true)]
    pub service: bool,
}
