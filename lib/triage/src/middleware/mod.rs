//! Tower middleware for the transport.
//!
//! Layers wrap the [`BoxedService`](crate::BoxedService) inside a
//! [`HyperClient`](crate::HyperClient) and see every exchange before any
//! call classifies it:
//!
//! ```ignore
//! use triage::HyperClient;
//! use triage::middleware::LoggingLayer;
//!
//! let client = HyperClient::builder().layer(LoggingLayer::debug()).build();
//! ```

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};
