use crate::errors::TransportError;
use crate::models::{CapturedResponse, OutboundRequest};

/// Sends one request over the network.
///
/// Any HTTP status is a successful send. `Err` means the request never got a
/// response (unreachable host, timeout, malformed request).
pub trait ITransport: Send + Sync {
    fn send(&self, request: &OutboundRequest) -> Result<CapturedResponse, TransportError>;
}
