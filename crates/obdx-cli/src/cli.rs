//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;
use obdx_canbus::{CanResult, LoopbackInterfaces, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "obdx", version)]
#[command(about = "Query or emulate an OBD-II ECU's engine RPM over SocketCAN")]
#[command(after_help = "With neither --ecu nor --query, opens the two loopback interfaces \
(can0 and can1 unless configured) and runs a one-shot test between them. \
The --ecu instance keeps answering queries until the bus fails.")]
pub struct Args {
    /// Interface to use with --ecu or --query
    #[arg(short, long, value_name = "IFACE")]
    pub iface: Option<String>,

    /// Emulate ECU RPM on <IFACE>
    #[arg(short, long)]
    pub ecu: bool,

    /// Query ECU RPM on <IFACE>
    #[arg(short, long)]
    pub query: bool,

    /// TOML settings file (loopback interfaces, logging)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the reading as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Turn the role flags into the immutable run configuration.
    pub fn run_config(&self, loopback: &LoopbackInterfaces) -> CanResult<RunConfig> {
        RunConfig::from_selection(self.ecu, self.query, self.iface.as_deref(), loopback)
    }
}
