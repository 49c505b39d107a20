//! Relay RPC abstraction for relaysub.
//!
//! This module provides a pluggable seam toward the JSON-RPC provider
//! that actually talks to the relay (WebSocket client, mock for testing).
//!
//! # Design
//!
//! The trait is request/acknowledgement oriented:
//! - `request()` issues one JSON-RPC request and resolves with the
//!   relay's acknowledgement payload
//! - `lifecycle()` hands out a broadcast receiver of connect/disconnect
//!   notifications, which the subscriber's event loop consumes
//!
//! # Example
//!
//! ```ignore
//! let relay = MockRelay::new();
//! let ack = relay.request(RpcRequest::new("irn_subscribe", params)).await?;
//! ```

mod mock;

pub use mock::MockRelay;

use crate::error::RpcResult;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// One JSON-RPC request bound for the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    /// Fully derived method name, e.g. `irn_subscribe`.
    pub method: String,
    /// JSON params object.
    pub params: serde_json::Value,
}

impl RpcRequest {
    /// Create a request from a method name and params.
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Connectivity notifications from the RPC provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// The provider (re)established its relay connection.
    Connected,
    /// The provider lost its relay connection.
    Disconnected,
}

/// RPC provider trait for issuing relay requests.
///
/// Implementations own the socket and the JSON-RPC id/response matching;
/// the subscriber only sees acknowledged payloads and errors.
#[async_trait]
pub trait RelayRpc: Send + Sync {
    /// Issue a request and await the relay's acknowledgement payload.
    async fn request(&self, request: RpcRequest) -> RpcResult<serde_json::Value>;

    /// Get a receiver of connect/disconnect notifications.
    ///
    /// Each call returns an independent receiver; events published after
    /// the call are observed.
    fn lifecycle(&self) -> broadcast::Receiver<TransportEvent>;
}
