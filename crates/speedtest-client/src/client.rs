//! Client for connecting to a speed test server.

use std::time::Duration;

use tokio_stream::StreamExt;
use tonic::Request;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use speedtest_proto::lite::TestReply;
use speedtest_proto::lite::test_proxy_client::TestProxyClient as TonicTestProxyClient;

use crate::config::TestConfig;
use crate::error::{ClientError, status_to_request_error, status_to_stream_error};
use crate::run::TestRun;

/// Client for the proxy speed test service.
///
/// Owns one channel to the server; the channel is released when the client is
/// dropped, on every exit path. Connection setup is eager: the TCP/HTTP2
/// handshake happens inside `connect`, so an unreachable endpoint surfaces a
/// connection error there, before any call is attempted.
///
/// The channel may be reused for sequential test runs. Concurrent calls
/// multiplex on the same HTTP/2 connection with per-call isolation handled by
/// the transport.
#[derive(Debug, Clone)]
pub struct SpeedTestClient {
    client: TonicTestProxyClient<Channel>,
}

impl SpeedTestClient {
    /// Connect to a speed test server at the given endpoint,
    /// e.g., "http://127.0.0.1:10999".
    pub async fn connect<D>(dst: D) -> Result<Self, ClientError>
    where
        D: TryInto<Endpoint>,
        D::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::connect_with_endpoint_config(dst, |endpoint| endpoint).await
    }

    /// Connect with a custom connection timeout.
    pub async fn connect_with_timeout<D>(dst: D, timeout: Duration) -> Result<Self, ClientError>
    where
        D: TryInto<Endpoint>,
        D::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::connect_with_endpoint_config(dst, |endpoint| endpoint.connect_timeout(timeout)).await
    }

    /// Internal helper method to reduce duplication between connect methods.
    async fn connect_with_endpoint_config<D, F>(dst: D, config_fn: F) -> Result<Self, ClientError>
    where
        D: TryInto<Endpoint>,
        D::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
        F: FnOnce(Endpoint) -> Endpoint,
    {
        let endpoint = dst
            .try_into()
            .map_err(|e| ClientError::from_connect_error(e.into(), "endpoint parsing"))?;

        let configured_endpoint = config_fn(endpoint);

        debug!("establishing channel");
        let channel = configured_endpoint
            .connect()
            .await
            .map_err(|e| ClientError::from_connect_error(e, "channel establishment"))?;

        Ok(Self {
            client: TonicTestProxyClient::new(channel),
        })
    }

    /// Start one test run.
    ///
    /// Issues exactly one server-streaming call per invocation. The config is
    /// validated first, so an incomplete config fails here without touching
    /// the network; a config the server rejects at call setup surfaces as a
    /// request error. The returned [`TestRun`] pulls replies on demand.
    pub async fn start_test(&mut self, config: &TestConfig) -> Result<TestRun, ClientError> {
        let request = config.to_request()?;
        debug!(
            group = %request.group_name,
            concurrency = request.concurrency,
            "starting test run"
        );

        let stream = self
            .client
            .start_test(Request::new(request))
            .await
            .map_err(status_to_request_error)?
            .into_inner();

        Ok(TestRun::new(stream))
    }

    /// Start one test run, exposing the replies as a stream.
    ///
    /// Same lazy sequence as [`start_test`](Self::start_test), for
    /// combinator-style consumption. End-of-stream and stream failure remain
    /// distinct: the stream ends after `None`, a failure yields one final
    /// `Err` item.
    pub async fn start_test_stream(
        &mut self,
        config: &TestConfig,
    ) -> Result<impl StreamExt<Item = Result<TestReply, ClientError>> + use<>, ClientError> {
        let request = config.to_request()?;

        let response_stream = self
            .client
            .start_test(Request::new(request))
            .await
            .map_err(status_to_request_error)?
            .into_inner();

        Ok(response_stream.map(|result| result.map_err(status_to_stream_error)))
    }

    /// Get a mutable reference to the underlying tonic client.
    ///
    /// This allows access to lower-level tonic functionality if needed.
    pub fn client_mut(&mut self) -> &mut TonicTestProxyClient<Channel> {
        &mut self.client
    }

    /// Get a reference to the underlying tonic client.
    pub fn client(&self) -> &TonicTestProxyClient<Channel> {
        &self.client
    }
}
