//! # outbox-transport
//!
//! Network boundary of the outbox. `HttpTransport` implements `ITransport`
//! over a blocking reqwest client: any HTTP status is returned as a
//! `CapturedResponse`, only a missing response is an error.

pub mod http_client;

pub use http_client::HttpTransport;
