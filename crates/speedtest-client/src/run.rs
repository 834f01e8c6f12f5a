//! One test run's reply sequence and lifecycle.

use tonic::Streaming;
use tracing::debug;

use speedtest_proto::lite::TestReply;

use crate::error::{ClientError, status_to_stream_error};

/// Lifecycle of a test run as observed by the client.
///
/// The only transitions are `Initiated -> Streaming -> Completed | Failed`.
/// There is no retry transition out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Request sent, no reply pulled yet.
    Initiated,
    /// At least one reply received.
    Streaming,
    /// Server closed the stream cleanly.
    Completed,
    /// Transport or server failure ended the stream.
    Failed,
}

/// A lazy, finite, non-restartable sequence of test replies.
///
/// Each reply is pulled from the network on demand and yielded in server
/// emission order; the full result set is never buffered and never reordered.
/// Dropping a run mid-stream cancels the call and releases its resources.
#[derive(Debug)]
pub struct TestRun {
    stream: Streaming<TestReply>,
    state: RunState,
    received: u64,
}

impl TestRun {
    pub(crate) fn new(stream: Streaming<TestReply>) -> Self {
        Self {
            stream,
            state: RunState::Initiated,
            received: 0,
        }
    }

    /// Pull the next reply, suspending until the server produces one.
    ///
    /// Returns `Ok(None)` once the server has closed the stream cleanly;
    /// an abnormal termination fails the run and surfaces as a stream error.
    /// Replies delivered before a failure stay delivered; the lost remainder
    /// is not replayed.
    pub async fn next_reply(&mut self) -> Result<Option<TestReply>, ClientError> {
        match self.state {
            RunState::Completed => return Ok(None),
            RunState::Failed => {
                return Err(ClientError::Stream {
                    reason: "test run already failed".to_string(),
                });
            }
            RunState::Initiated | RunState::Streaming => {}
        }

        match self.stream.message().await {
            Ok(Some(reply)) => {
                self.state = RunState::Streaming;
                self.received += 1;
                Ok(Some(reply))
            }
            Ok(None) => {
                debug!(received = self.received, "test run completed");
                self.state = RunState::Completed;
                Ok(None)
            }
            Err(status) => {
                self.state = RunState::Failed;
                Err(status_to_stream_error(status))
            }
        }
    }

    /// Drive the run to completion, invoking `consumer` for each reply as it
    /// arrives. Returns the number of replies delivered.
    pub async fn for_each<F>(mut self, mut consumer: F) -> Result<u64, ClientError>
    where
        F: FnMut(TestReply),
    {
        while let Some(reply) = self.next_reply().await? {
            consumer(reply);
        }
        Ok(self.received)
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Number of replies delivered so far.
    pub fn received(&self) -> u64 {
        self.received
    }
}
