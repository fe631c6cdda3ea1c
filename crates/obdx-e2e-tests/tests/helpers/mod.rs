//! Shared setup for scenario tests.
//!
//! Builds run configurations the way the CLI does and wires mock endpoints
//! in place of SocketCAN, so every scenario exercises the real exchange.

#![allow(dead_code)]

use obdx_canbus::{LoopbackInterfaces, MockBusEndpoint, RunConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Fixed seed so emulated RPM values are reproducible.
pub const SEED: u64 = 0x0BD2;

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(SEED)
}

pub fn query_config(iface: &str) -> RunConfig {
    RunConfig::from_selection(false, true, Some(iface), &LoopbackInterfaces::default()).unwrap()
}

pub fn ecu_config(iface: &str) -> RunConfig {
    RunConfig::from_selection(true, false, Some(iface), &LoopbackInterfaces::default()).unwrap()
}

pub fn loopback_config() -> RunConfig {
    RunConfig::from_selection(false, false, None, &LoopbackInterfaces::default()).unwrap()
}

/// Mock endpoints named after the loopback config's interfaces, cross-wired.
pub fn loopback_endpoints(config: &RunConfig) -> (MockBusEndpoint, MockBusEndpoint) {
    MockBusEndpoint::linked_pair(
        config.query_interface().unwrap(),
        config.ecu_interface().unwrap(),
    )
}
