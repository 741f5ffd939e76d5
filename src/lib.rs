//! # Kinesis
//!
//! Soft-body creatures learning to walk by evolution. This library holds the
//! frame harness, camera, render surfaces and the HTTP/WebSocket server on
//! top of `kinesis_core` and `kinesis_io`.

/// Harness, camera, render surfaces and the headless driver
pub mod app;
/// axum router and the served frame loop
pub mod server;
