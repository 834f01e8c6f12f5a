//! Error types for speed test client operations.

use std::fmt;

use tonic::Status;

/// Main error type for client operations.
///
/// Connection setup, request rejection, and mid-stream failure are distinct
/// terminal signals. None of them are retried; all of them propagate to the
/// process boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// A configuration field failed validation before any request was built.
    InvalidConfig {
        field: &'static str,
        reason: String,
    },
    /// Configuration file I/O or parse error.
    Config {
        context: String,
        reason: String,
    },
    /// The channel to the server could not be established.
    Connect {
        context: String,
        reason: String,
    },
    /// The server rejected the test request at call setup.
    Request {
        reason: String,
    },
    /// The reply stream terminated abnormally mid-run.
    Stream {
        reason: String,
    },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::InvalidConfig { field, reason } => {
                write!(f, "Invalid value for '{field}': {reason}")
            }
            ClientError::Config { context, reason } => {
                write!(f, "Config error in {context}: {reason}")
            }
            ClientError::Connect { context, reason } => {
                write!(f, "Connection error in {context}: {reason}")
            }
            ClientError::Request { reason } => {
                write!(f, "Test request rejected: {reason}")
            }
            ClientError::Stream { reason } => {
                write!(f, "Test run aborted mid-stream: {reason}")
            }
        }
    }
}

impl std::error::Error for ClientError {}

impl ClientError {
    /// True for errors the caller can fix locally, without a server involved.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig { .. } | ClientError::Config { .. }
        )
    }

    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        ClientError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub fn from_io_error(e: std::io::Error, context: &str) -> Self {
        ClientError::Config {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }

    pub fn from_parse_error(e: impl fmt::Display, context: &str) -> Self {
        ClientError::Config {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }

    pub fn from_connect_error(e: impl fmt::Display, context: &str) -> Self {
        ClientError::Connect {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Convert a call-setup `Status` into a request rejection.
pub(crate) fn status_to_request_error(status: Status) -> ClientError {
    ClientError::Request {
        reason: describe_status(&status),
    }
}

/// Convert a mid-stream `Status` into a stream abort.
pub(crate) fn status_to_stream_error(status: Status) -> ClientError {
    ClientError::Stream {
        reason: describe_status(&status),
    }
}

fn describe_status(status: &Status) -> String {
    let context = match status.code() {
        tonic::Code::InvalidArgument => "invalid argument",
        tonic::Code::NotFound => "not found",
        tonic::Code::DeadlineExceeded => "request timeout",
        tonic::Code::Unavailable => "service unavailable",
        tonic::Code::Internal => "internal error",
        tonic::Code::Cancelled => "call cancelled",
        tonic::Code::Unimplemented => "method not implemented",
        _ => "RPC error",
    };
    format!("{context}: {}", status.message())
}
