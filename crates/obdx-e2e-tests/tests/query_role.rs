//! E2E tests for the one-shot query role.

mod helpers;

use obdx_canbus::{CanError, MockBusEndpoint, REPLY_TIMEOUT};
use obdx_cli::run::{render, run_exchange};
use obdx_protocol::{CanFrame, encode_request, encode_response};

/// A responder answering `04 41 0C 2A 40` yields a reading of 42.
#[tokio::test]
async fn e2e_query_reports_rpm() {
    let config = helpers::query_config("can0");
    let query = MockBusEndpoint::with_replies(
        "can0",
        vec![CanFrame::new(0x7E8, &[0x04, 0x41, 0x0C, 0x2A, 0x40]).unwrap()],
    );

    let reading = run_exchange(&config, Some(&query), None, helpers::rng())
        .await
        .unwrap()
        .expect("reply carried an RPM value");

    assert_eq!(reading.rpm, 42);
    assert_eq!(reading.interface, "can0");
    assert_eq!(render(&reading, false).unwrap(), "RPM at 42 of 255");
    assert_eq!(query.sent_frames(), vec![encode_request()]);
}

/// A silent responder aborts the run after the 1000 ms bound.
#[tokio::test(start_paused = true)]
async fn e2e_query_times_out() {
    let config = helpers::query_config("can0");
    let query = MockBusEndpoint::new("can0");

    let start = tokio::time::Instant::now();
    let err = run_exchange(&config, Some(&query), None, helpers::rng())
        .await
        .unwrap_err();

    assert!(start.elapsed() >= REPLY_TIMEOUT);
    assert!(matches!(err, CanError::Timeout { .. }));
    assert!(err.to_string().contains("timeout waiting for receive on can0"));
}

/// A reply with another discriminator completes the run without a reading.
#[tokio::test]
async fn e2e_query_non_rpm_reply() {
    let config = helpers::query_config("can0");
    let other = CanFrame::new(0x7E8, &[0x03, 0x41, 0x0D, 0x3C]).unwrap();
    let query = MockBusEndpoint::with_replies("can0", vec![other]);

    let reading = run_exchange(&config, Some(&query), None, helpers::rng())
        .await
        .unwrap();
    assert!(reading.is_none());
}

/// Only one query is ever sent, even with more replies scripted.
#[tokio::test]
async fn e2e_query_is_one_shot() {
    let config = helpers::query_config("can0");
    let query =
        MockBusEndpoint::with_replies("can0", vec![encode_response(1), encode_response(2)]);

    let reading = run_exchange(&config, Some(&query), None, helpers::rng())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reading.rpm, 1);
    assert_eq!(query.sent_frames().len(), 1);
}

/// A truncated reply is still decoded from whatever arrived.
#[tokio::test]
async fn e2e_query_short_reply_is_best_effort() {
    let config = helpers::query_config("can0");
    let query = MockBusEndpoint::new("can0");
    // Identifier, length, padding and the first four payload bytes.
    query.inject_raw(&encode_response(0x55).to_wire()[..12]);

    let reading = run_exchange(&config, Some(&query), None, helpers::rng())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reading.rpm, 0x55);
}

/// JSON output carries the same value.
#[tokio::test]
async fn e2e_query_json_output() {
    let config = helpers::query_config("vcan0");
    let query = MockBusEndpoint::with_replies("vcan0", vec![encode_response(200)]);

    let reading = run_exchange(&config, Some(&query), None, helpers::rng())
        .await
        .unwrap()
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&render(&reading, true).unwrap()).unwrap();
    assert_eq!(json["rpm"], 200);
    assert_eq!(json["interface"], "vcan0");
}
