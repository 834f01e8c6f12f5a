//! Connection establishment tests.
//!
//! Connection failures must surface before any streaming call is attempted,
//! with zero replies delivered.

use std::time::Duration;

use speedtest_client::{ClientError, SpeedTestClient};

use crate::test_utilities::{ScriptedTestProxy, sample_config, sample_replies, start_test_server};

fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    let port = listener.local_addr().expect("probe addr").port();
    drop(listener);
    port
}

#[tokio::test]
async fn test_connect_refused_fails_fast() {
    let port = unused_port();

    let result = SpeedTestClient::connect(format!("http://127.0.0.1:{port}")).await;

    let error = result.unwrap_err();
    assert!(matches!(error, ClientError::Connect { .. }));
}

#[tokio::test]
async fn test_connect_timeout() {
    // Non-routable address; the connect timeout has to fire.
    let result = SpeedTestClient::connect_with_timeout(
        "http://10.255.255.1:10999".to_string(),
        Duration::from_millis(100),
    )
    .await;

    let error = result.unwrap_err();
    assert!(matches!(error, ClientError::Connect { .. }));
}

#[tokio::test]
async fn test_invalid_endpoint_is_a_connect_error() {
    let result = SpeedTestClient::connect("not a uri".to_string()).await;

    let error = result.unwrap_err();
    assert!(matches!(error, ClientError::Connect { .. }));
}

#[tokio::test]
async fn test_channel_reuse_across_sequential_runs() {
    let proxy = ScriptedTestProxy::new(sample_replies(2));
    let calls = proxy.call_counter();
    let (server_addr, _shutdown_handle) = start_test_server(proxy).await;

    let mut client = SpeedTestClient::connect(server_addr).await.unwrap();

    for _ in 0..2 {
        let run = client.start_test(&sample_config()).await.unwrap();
        let received = run.for_each(|_| {}).await.unwrap();
        assert_eq!(received, 2);
    }

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}
