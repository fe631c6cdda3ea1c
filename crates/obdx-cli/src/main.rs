//! obdx: query or emulate an OBD-II ECU's engine RPM over SocketCAN.
//!
//! `--query` sends one RPM request and prints the answer, `--ecu` answers
//! RPM requests with random values until the bus fails, and with neither
//! flag the two roles run once against each other on two cross-wired
//! interfaces.

use anyhow::Context;
use clap::Parser;

use obdx_cli::cli::Args;
use obdx_cli::settings::Settings;
use obdx_cli::{logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // ── Load settings ───────────────────────────────────────────
    let settings = match &args.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    logging::init(&settings.logging, args.verbose);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "obdx starting");

    // ── Resolve role ────────────────────────────────────────────
    let config = args.run_config(&settings.loopback)?;
    tracing::info!(
        role = %config.role(),
        query_interface = config.query_interface(),
        ecu_interface = config.ecu_interface(),
        "run configured"
    );

    // ── Run ─────────────────────────────────────────────────────
    let reading = run::run(&config)
        .await
        .with_context(|| format!("{} run failed", config.role()))?;

    match reading {
        Some(reading) => println!("{}", run::render(&reading, args.json)?),
        None => tracing::warn!("reply did not carry an RPM value"),
    }

    tracing::info!("obdx stopped");
    Ok(())
}
