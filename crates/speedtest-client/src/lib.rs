//! Client for the proxy speed test service.
//!
//! Connects to a server exposing the `lite.TestProxy` streaming API, submits
//! one validated test configuration, and consumes the per-proxy results
//! lazily as the server produces them.

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod run;
pub mod telemetry;

pub use client::SpeedTestClient;
pub use config::{
    OutputMode, PingMethod, ServerAddr, SortMethod, SpeedTestMode, TestConfig, TestMode,
};
pub use error::ClientError;
pub use run::{RunState, TestRun};

// Re-export the wire types consumers handle directly
pub use speedtest_proto::lite::{TestReply, TestRequest};
