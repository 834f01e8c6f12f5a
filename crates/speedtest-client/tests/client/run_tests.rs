//! Test run lifecycle tests.
//!
//! Covers the full state machine against a scripted server: clean completion,
//! ordering, mid-stream failure, and rejection before or at call setup.

use std::sync::atomic::Ordering;

use speedtest_client::{ClientError, RunState, SpeedTestClient};
use tokio_stream::StreamExt;
use tonic::Code;

use crate::test_utilities::{ScriptedTestProxy, sample_config, sample_replies, start_test_server};

#[tokio::test]
async fn test_run_completes_after_all_replies() {
    let proxy = ScriptedTestProxy::new(sample_replies(3));
    let calls = proxy.call_counter();
    let (server_addr, _shutdown_handle) = start_test_server(proxy).await;

    let mut client = SpeedTestClient::connect(server_addr).await.unwrap();
    let mut run = client.start_test(&sample_config()).await.unwrap();
    assert_eq!(run.state(), RunState::Initiated);

    let mut consumed = 0;
    while let Some(reply) = run.next_reply().await.unwrap() {
        assert_eq!(reply.group_name, "Default");
        consumed += 1;
    }

    assert_eq!(consumed, 3);
    assert_eq!(run.received(), 3);
    assert_eq!(run.state(), RunState::Completed);

    // Exactly one streaming call for the whole run.
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Pulling past completion stays at the clean end-of-stream signal.
    assert!(run.next_reply().await.unwrap().is_none());
    assert_eq!(run.state(), RunState::Completed);
}

#[tokio::test]
async fn test_empty_run_completes() {
    let proxy = ScriptedTestProxy::new(Vec::new());
    let (server_addr, _shutdown_handle) = start_test_server(proxy).await;

    let mut client = SpeedTestClient::connect(server_addr).await.unwrap();
    let mut run = client.start_test(&sample_config()).await.unwrap();

    assert!(run.next_reply().await.unwrap().is_none());
    assert_eq!(run.received(), 0);
    assert_eq!(run.state(), RunState::Completed);
}

#[tokio::test]
async fn test_replies_arrive_in_server_order() {
    let proxy = ScriptedTestProxy::new(sample_replies(5));
    let (server_addr, _shutdown_handle) = start_test_server(proxy).await;

    let mut client = SpeedTestClient::connect(server_addr).await.unwrap();
    let run = client.start_test(&sample_config()).await.unwrap();

    let mut ids = Vec::new();
    let received = run.for_each(|reply| ids.push(reply.id)).await.unwrap();

    assert_eq!(received, 5);
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_mid_stream_abort_stops_iteration() {
    let proxy =
        ScriptedTestProxy::new(sample_replies(2)).with_abort(Code::Unavailable, "server crashed");
    let (server_addr, _shutdown_handle) = start_test_server(proxy).await;

    let mut client = SpeedTestClient::connect(server_addr).await.unwrap();
    let mut run = client.start_test(&sample_config()).await.unwrap();

    assert!(run.next_reply().await.unwrap().is_some());
    assert!(run.next_reply().await.unwrap().is_some());

    let error = run.next_reply().await.unwrap_err();
    assert!(matches!(error, ClientError::Stream { .. }));
    assert_eq!(run.state(), RunState::Failed);
    assert_eq!(run.received(), 2);

    // A failed run never reports a spurious completion afterwards.
    assert!(run.next_reply().await.is_err());
    assert_eq!(run.state(), RunState::Failed);
}

#[tokio::test]
async fn test_server_rejection_is_a_request_error() {
    let proxy = ScriptedTestProxy::new(sample_replies(1)).with_rejected_group("Default");
    let (server_addr, _shutdown_handle) = start_test_server(proxy).await;

    let mut client = SpeedTestClient::connect(server_addr).await.unwrap();
    let error = client.start_test(&sample_config()).await.unwrap_err();

    assert!(matches!(error, ClientError::Request { .. }));
}

#[tokio::test]
async fn test_invalid_config_fails_before_invocation() {
    let proxy = ScriptedTestProxy::new(sample_replies(1));
    let calls = proxy.call_counter();
    let (server_addr, _shutdown_handle) = start_test_server(proxy).await;

    let mut client = SpeedTestClient::connect(server_addr).await.unwrap();

    let mut config = sample_config();
    config.subscription.clear();
    let error = client.start_test(&config).await.unwrap_err();

    assert!(matches!(
        error,
        ClientError::InvalidConfig {
            field: "subscription",
            ..
        }
    ));
    // The incomplete config never produced a call.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_stream_adapter_yields_all_replies() {
    let proxy = ScriptedTestProxy::new(sample_replies(3));
    let (server_addr, _shutdown_handle) = start_test_server(proxy).await;

    let mut client = SpeedTestClient::connect(server_addr).await.unwrap();
    let mut stream = client.start_test_stream(&sample_config()).await.unwrap();

    let mut ids = Vec::new();
    while let Some(item) = stream.next().await {
        ids.push(item.unwrap().id);
    }

    assert_eq!(ids, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_documented_scenario_end_to_end() {
    // Endpoint 127.0.0.1:<port>, stock config, three replies, clean close.
    let proxy = ScriptedTestProxy::new(sample_replies(3));
    let (server_addr, _shutdown_handle) = start_test_server(proxy).await;

    let mut client = SpeedTestClient::connect(server_addr).await.unwrap();

    let config = sample_config();
    assert_eq!(config.group_name, "Default");
    assert_eq!(config.concurrency, 2);
    assert_eq!(config.timeout_secs, 10);

    let mut run = client.start_test(&config).await.unwrap();

    let mut invocations = 0;
    while let Some(_reply) = run.next_reply().await.unwrap() {
        invocations += 1;
    }

    assert_eq!(invocations, 3);
    assert_eq!(run.state(), RunState::Completed);
}
