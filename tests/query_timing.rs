// tests/query_timing.rs

use echonet_lite::controller::Controller;
use echonet_lite::{EchonetError, Esv};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn query_waits_the_full_timeout_with_no_responders() {
    let controller = Controller::new();
    let mut frame = controller.create_frame();
    frame.edata.esv = Esv::Get;

    let start = tokio::time::Instant::now();
    let result = controller
        .query_builder()
        .with_timeout(Duration::from_millis(500))
        .query(frame)
        .await;

    match result {
        Ok(responses) => assert!(responses.is_empty()),
        // Binding the transient query socket can fail in sandboxed test
        // environments without multicast support; only assert the timing
        // contract when the query actually ran.
        Err(EchonetError::Io { .. }) => return,
        Err(other) => panic!("unexpected error: {other}"),
    }

    assert!(tokio::time::Instant::now() - start >= Duration::from_millis(500));
}
