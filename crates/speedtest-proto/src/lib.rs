//! Shared Protocol Buffer definitions for the proxy speed test service.
//!
//! This crate contains the `lite` package schema and the tonic/prost
//! generated code. Message, field, and enum names mirror the service schema
//! exactly; the method path on the wire is `/lite.TestProxy/StartTest`.

// Generated protobuf modules via `tonic_build` in build.rs

/// Speed test service protocol
pub mod lite {
    tonic::include_proto!("lite");
}

// Re-export message and enum types for convenience
pub use lite::*;

// Re-export client and server types
pub use lite::test_proxy_client::TestProxyClient;
pub use lite::test_proxy_server::{TestProxy, TestProxyServer};
