//! E2E tests for the emulated ECU role.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use obdx_canbus::{CanError, CycleOutcome, Exchange, MockBusEndpoint, REPLY_TIMEOUT};
use obdx_cli::run::run_exchange;
use obdx_protocol::{CanFrame, decode, encode_request};

/// Frames whose first byte is not 0x03 get no answer; the ECU keeps waiting.
#[tokio::test(start_paused = true)]
async fn e2e_ecu_ignores_non_queries() {
    let config = helpers::ecu_config("can1");
    let ecu = MockBusEndpoint::new("can1");
    ecu.inject(CanFrame::new(0x7DF, &[0x02, 0x01, 0x0C]).unwrap());
    ecu.inject(CanFrame::new(0x7DF, &[0x04, 0x41, 0x0C, 0x10, 0x40]).unwrap());

    let mut exchange = Exchange::new(config.role(), None, Some(&ecu), helpers::rng()).unwrap();
    assert_eq!(
        exchange.run_cycle().await.unwrap(),
        CycleOutcome::Ignored(Some(0x02))
    );
    assert_eq!(
        exchange.run_cycle().await.unwrap(),
        CycleOutcome::Ignored(Some(0x04))
    );
    assert!(ecu.sent_frames().is_empty());

    // Back to waiting: nothing pending, so the idle wait simply expires.
    assert_eq!(exchange.run_cycle().await.unwrap(), CycleOutcome::Idle);
}

/// Each query is answered with `04 41 0C vv 40` on the response address.
#[tokio::test]
async fn e2e_ecu_answers_every_query() {
    let config = helpers::ecu_config("can1");
    let ecu = MockBusEndpoint::new("can1");
    for _ in 0..3 {
        ecu.inject(encode_request());
    }

    let mut exchange = Exchange::new(config.role(), None, Some(&ecu), helpers::rng()).unwrap();
    for _ in 0..3 {
        let outcome = exchange.run_cycle().await.unwrap();
        assert!(matches!(outcome, CycleOutcome::Responded(_)));
    }

    let sent = ecu.sent_frames();
    assert_eq!(sent.len(), 3);
    for frame in sent {
        assert_eq!(frame.id(), 0x7E8);
        assert_eq!(frame.len(), 5);
        let payload = frame.payload();
        assert_eq!(payload[..3], [0x04, 0x41, 0x0C]);
        assert_eq!(payload[4], 0x40);
        assert!(decode(&frame).rpm().is_some());
    }
}

/// Idle timeouts are benign; a query arriving later is still answered.
#[tokio::test(start_paused = true)]
async fn e2e_ecu_survives_idle_timeouts() {
    let config = helpers::ecu_config("can1");
    let ecu = Arc::new(MockBusEndpoint::new("can1"));

    let late = ecu.clone();
    tokio::spawn(async move {
        tokio::time::sleep(REPLY_TIMEOUT * 2 + Duration::from_millis(500)).await;
        late.inject(encode_request());
    });

    let mut exchange = Exchange::new(config.role(), None, Some(&*ecu), helpers::rng()).unwrap();
    let mut idle = 0;
    loop {
        match exchange.run_cycle().await.unwrap() {
            CycleOutcome::Idle => idle += 1,
            CycleOutcome::Responded(_) => break,
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(idle, 2);
    assert_eq!(ecu.sent_frames().len(), 1);
}

/// The otherwise endless ECU run ends on the first transport failure.
#[tokio::test(start_paused = true)]
async fn e2e_ecu_run_ends_on_send_failure() {
    let config = helpers::ecu_config("can1");
    let ecu = MockBusEndpoint::new("can1");
    ecu.inject(encode_request());
    ecu.fail_sends(true);

    let err = run_exchange(&config, None, Some(&ecu), helpers::rng())
        .await
        .unwrap_err();
    assert!(matches!(err, CanError::Io { .. }));
}
