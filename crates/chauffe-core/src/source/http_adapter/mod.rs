//! CloudManager REST client.
//!
//! Implements [`BlockchainSource`](super::BlockchainSource) over HTTP using
//! `reqwest`, with optional request rate limiting, concurrent detail fetches
//! and failure classification into connection, timeout, status and
//! malformed-response errors.

mod client;
mod connection;
mod parsing;

pub use client::HttpCloudManagerClient;
