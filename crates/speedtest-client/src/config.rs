//! Validated test-run configuration.
//!
//! The service requires every request field to be populated, so the
//! configuration is an owned struct with typed fields and an explicit
//! validation step. The wire request is only ever built from a configuration
//! that passed validation; a partial request cannot reach the network.

use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use speedtest_proto::lite;

use crate::error::ClientError;

/// Server endpoint as host and port.
///
/// Rendered as `http://{host}:{port}`, the URI form accepted by the channel
/// builder. The service runs without TLS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddr {
    pub host: String,
    pub port: u16,
}

impl ServerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// URI accepted by `tonic::transport::Endpoint`.
    pub fn uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// What the test run measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedTestMode {
    /// Latency probe and download speed.
    All,
    /// Latency probe only.
    #[value(name = "pingonly")]
    PingOnly,
    /// Download speed only.
    #[value(name = "speedonly")]
    SpeedOnly,
}

impl From<SpeedTestMode> for lite::SpeedTestMode {
    fn from(v: SpeedTestMode) -> Self {
        match v {
            SpeedTestMode::All => lite::SpeedTestMode::All,
            SpeedTestMode::PingOnly => lite::SpeedTestMode::Pingonly,
            SpeedTestMode::SpeedOnly => lite::SpeedTestMode::Speedonly,
        }
    }
}

/// Latency-probe strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PingMethod {
    /// HTTP probe against a Google endpoint.
    #[value(name = "googleping")]
    GooglePing,
    /// Plain TCP connect probe.
    #[value(name = "tcpping")]
    TcpPing,
}

impl From<PingMethod> for lite::PingMethod {
    fn from(v: PingMethod) -> Self {
        match v {
            PingMethod::GooglePing => lite::PingMethod::Googleping,
            PingMethod::TcpPing => lite::PingMethod::Tcpping,
        }
    }
}

/// Result ordering, applied server side; the stream arrives already sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMethod {
    /// Ascending by measured speed.
    Speed,
    /// Descending by measured speed.
    Rspeed,
    /// Ascending by latency.
    Ping,
    /// Descending by latency.
    Rping,
}

impl From<SortMethod> for lite::SortMethod {
    fn from(v: SortMethod) -> Self {
        match v {
            SortMethod::Speed => lite::SortMethod::Speed,
            SortMethod::Rspeed => lite::SortMethod::Rspeed,
            SortMethod::Ping => lite::SortMethod::Ping,
            SortMethod::Rping => lite::SortMethod::Rping,
        }
    }
}

/// Server-defined test variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestMode {
    /// Test every proxy in the subscription.
    Full,
    /// Re-test the selection from a previous run.
    Retest,
}

impl TestMode {
    /// Wire encoding; the service numbers these 2 and 3.
    pub fn as_i32(self) -> i32 {
        match self {
            TestMode::Full => 2,
            TestMode::Retest => 3,
        }
    }
}

/// Server output formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Render a result picture, returned base64 encoded.
    PicBase64,
    /// Render a result picture, returned as a file path.
    PicPath,
    /// No picture.
    PicNone,
    /// JSON result document.
    Json,
    /// Plain text result table.
    Text,
}

impl OutputMode {
    pub fn as_i32(self) -> i32 {
        match self {
            OutputMode::PicBase64 => 0,
            OutputMode::PicPath => 1,
            OutputMode::PicNone => 2,
            OutputMode::Json => 3,
            OutputMode::Text => 4,
        }
    }
}

/// Configuration for one test run.
///
/// A config is immutable once handed to the client; one config initiates
/// exactly one test run. `Default` carries the stock values; `subscription`
/// has no usable default and must be filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    pub group_name: String,
    pub speed_test_mode: SpeedTestMode,
    pub ping_method: PingMethod,
    pub sort_method: SortMethod,
    pub concurrency: u32,
    pub test_mode: TestMode,
    pub subscription: String,
    pub language: String,
    pub font_size: u32,
    pub theme: String,
    pub timeout_secs: u32,
    pub output_mode: OutputMode,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            group_name: "Default".to_string(),
            speed_test_mode: SpeedTestMode::All,
            ping_method: PingMethod::GooglePing,
            sort_method: SortMethod::Rspeed,
            concurrency: 2,
            test_mode: TestMode::Full,
            subscription: String::new(),
            language: "en".to_string(),
            font_size: 24,
            theme: "rainbow".to_string(),
            timeout_secs: 10,
            output_mode: OutputMode::PicBase64,
        }
    }
}

impl TestConfig {
    /// Stock configuration for the given subscription URL.
    pub fn new(subscription: impl Into<String>) -> Self {
        Self {
            subscription: subscription.into(),
            ..Self::default()
        }
    }

    /// Load a config from file.
    /// Supports both JSON (.json) and YAML (.yaml/.yml) formats based on file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::from_io_error(e, "config loading"))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension.to_lowercase().as_str() {
            "json" => serde_json::from_str(&content)
                .map_err(|e| ClientError::from_parse_error(e, "JSON config parsing")),
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| ClientError::from_parse_error(e, "YAML config parsing")),
            _ => {
                // Try JSON first, then YAML as fallback
                serde_json::from_str(&content)
                    .or_else(|_| serde_yaml::from_str(&content))
                    .map_err(|e| {
                        ClientError::from_parse_error(e, "config parsing (tried both JSON and YAML)")
                    })
            }
        }
    }

    /// Check every field the service requires.
    ///
    /// Out-of-range values are rejected here rather than left for the server
    /// to bounce.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.subscription.is_empty() {
            return Err(ClientError::invalid_config(
                "subscription",
                "a subscription URL is required",
            ));
        }
        if self.group_name.is_empty() {
            return Err(ClientError::invalid_config(
                "group_name",
                "must be non-empty",
            ));
        }
        if self.language.is_empty() {
            return Err(ClientError::invalid_config("language", "must be non-empty"));
        }
        if self.theme.is_empty() {
            return Err(ClientError::invalid_config("theme", "must be non-empty"));
        }
        if self.concurrency == 0 {
            return Err(ClientError::invalid_config(
                "concurrency",
                "must be at least 1",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::invalid_config(
                "timeout_secs",
                "must be at least 1 second",
            ));
        }
        if self.font_size == 0 {
            return Err(ClientError::invalid_config(
                "font_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Build the wire request. Runs validation first so a partially populated
    /// config never produces a request.
    pub fn to_request(&self) -> Result<lite::TestRequest, ClientError> {
        self.validate()?;
        Ok(lite::TestRequest {
            group_name: self.group_name.clone(),
            speed_test_mode: lite::SpeedTestMode::from(self.speed_test_mode) as i32,
            ping_method: lite::PingMethod::from(self.ping_method) as i32,
            sort_method: lite::SortMethod::from(self.sort_method) as i32,
            concurrency: self.concurrency as i32,
            test_mode: self.test_mode.as_i32(),
            subscription: self.subscription.clone(),
            language: self.language.clone(),
            font_size: self.font_size as i32,
            theme: self.theme.clone(),
            timeout: self.timeout_secs as i32,
            output_mode: self.output_mode.as_i32(),
        })
    }
}
