pub mod run;
pub mod wait;
pub mod wake;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use wolagent_common::WakeError;
use wolagent_common::config::WaitPolicy;

#[derive(Parser)]
#[command(name = "wolagent")]
#[command(about = "Wake a machine over LAN, wait for it, then hand over to a connector.")]
#[command(version)]
pub struct CommandLine {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a single magic packet
    #[command(alias = "w")]
    Wake {
        /// Target MAC address (DE-AD-BE-EF-12-34 or de:ad:be:ef:12:34)
        mac: String,
        /// Broadcast address of the target's segment
        #[arg(short, long, default_value = "192.168.0.255")]
        broadcast: String,
    },
    /// Wait until a host answers on the network
    Wait {
        host: String,
        #[command(flatten)]
        timing: Timing,
    },
    /// Wake, wait, launch the configured connector, and suspend on exit
    #[command(alias = "r")]
    Run(RunArgs),
}

#[derive(Args, Clone, Copy)]
pub struct Timing {
    /// Delay between reachability probes, in milliseconds
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,
    /// Give up waiting after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

#[derive(Args)]
pub struct RunArgs {
    /// JSON file describing the target and its connector
    #[arg(short, long)]
    pub config: PathBuf,
    /// Override the configured MAC address
    #[arg(long)]
    pub mac: Option<String>,
    /// Override the configured broadcast address
    #[arg(short, long)]
    pub broadcast: Option<String>,
    #[command(flatten)]
    pub timing: Timing,
}

impl Timing {
    /// `defaults` with whichever values were given on the command line.
    pub fn policy(&self, defaults: WaitPolicy) -> Result<WaitPolicy, WakeError> {
        WaitPolicy::from_millis(
            self.interval_ms
                .unwrap_or(defaults.poll_interval().as_millis() as u64),
            self.timeout_ms.unwrap_or(defaults.timeout().as_millis() as u64),
        )
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
