//! Role runner: opens the endpoints the role needs and drives the exchange.

use obdx_canbus::{BusEndpoint, CanResult, Exchange, RunConfig};
use obdx_protocol::RpmReading;
use rand::Rng;

/// Drive one run of the configured role over already-open endpoints.
///
/// Query and loopback runs return the reading (if the reply carried one).
/// The ECU role only returns when the transport fails.
pub async fn run_exchange<R: Rng>(
    config: &RunConfig,
    query: Option<&dyn BusEndpoint>,
    ecu: Option<&dyn BusEndpoint>,
    rng: R,
) -> CanResult<Option<RpmReading>> {
    let mut exchange = Exchange::new(config.role(), query, ecu, rng)?;
    exchange.run().await
}

/// Open SocketCAN endpoints for the configured role and run it.
///
/// Endpoints are closed when this returns, on success or error.
#[cfg(target_os = "linux")]
pub async fn run(config: &RunConfig) -> CanResult<Option<RpmReading>> {
    use obdx_canbus::SocketCanEndpoint;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    let query = config
        .query_interface()
        .map(SocketCanEndpoint::open)
        .transpose()?;
    let ecu = config
        .ecu_interface()
        .map(SocketCanEndpoint::open)
        .transpose()?;

    run_exchange(
        config,
        query.as_ref().map(|ep| ep as &dyn BusEndpoint),
        ecu.as_ref().map(|ep| ep as &dyn BusEndpoint),
        StdRng::from_entropy(),
    )
    .await
}

#[cfg(not(target_os = "linux"))]
pub async fn run(_config: &RunConfig) -> CanResult<Option<RpmReading>> {
    Err(obdx_canbus::CanError::Config(
        "SocketCAN endpoints are only available on Linux".into(),
    ))
}

/// Render a reading for stdout.
pub fn render(reading: &RpmReading, json: bool) -> serde_json::Result<String> {
    if json {
        serde_json::to_string(reading)
    } else {
        Ok(reading.to_string())
    }
}
