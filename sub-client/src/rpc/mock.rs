//! Mock relay RPC provider for testing.
//!
//! Auto-acknowledges requests, captures them for verification, and
//! supports scripting the next responses (fail, park, fixed payload).

use super::{RelayRpc, RpcRequest, TransportEvent};
use crate::error::{RpcError, RpcResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, oneshot};

/// What the mock should do with an incoming request instead of
/// auto-acknowledging it.
#[derive(Debug)]
enum Script {
    /// Answer with a JSON-RPC rejection.
    Fail(String),
    /// Park the request until released (or dropped).
    Hold,
    /// Acknowledge with this exact payload.
    Ack(serde_json::Value),
}

#[derive(Debug, Default)]
struct MockRelayInner {
    requests: Vec<RpcRequest>,
    scripts: VecDeque<Script>,
    held: VecDeque<oneshot::Sender<RpcResult<serde_json::Value>>>,
    next_id: u64,
}

/// Mock RPC provider for testing.
///
/// Unscripted subscribe requests are acknowledged with sequential ids
/// (`id-1`, `id-2`, ...); everything else is acknowledged with `true`.
/// Scripts apply to requests in arrival order, one script per request.
#[derive(Debug)]
pub struct MockRelay {
    inner: Arc<Mutex<MockRelayInner>>,
    lifecycle: broadcast::Sender<TransportEvent>,
}

impl MockRelay {
    /// Create a new mock provider.
    pub fn new() -> Self {
        let (lifecycle, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(Mutex::new(MockRelayInner::default())),
            lifecycle,
        }
    }

    /// Get all requests that were issued.
    pub fn requests(&self) -> Vec<RpcRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.clone()
    }

    /// Get the number of requests that were issued.
    pub fn request_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.requests.len()
    }

    /// Get the most recent request, if any.
    pub fn last_request(&self) -> Option<RpcRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.last().cloned()
    }

    /// Cause the next request to fail with a relay rejection.
    pub fn fail_next(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.scripts.push_back(Script::Fail(error.to_string()));
    }

    /// Cause the next request to park until [`release_oldest`](Self::release_oldest).
    pub fn hold_next(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.scripts.push_back(Script::Hold);
    }

    /// Cause the next request to be acknowledged with `payload`.
    pub fn ack_next_with(&self, payload: serde_json::Value) {
        let mut inner = self.inner.lock().unwrap();
        inner.scripts.push_back(Script::Ack(payload));
    }

    /// Number of requests currently parked.
    pub fn held_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.held.len()
    }

    /// Release the oldest parked request with `result`.
    ///
    /// Returns `false` if nothing was parked.
    pub fn release_oldest(&self, result: RpcResult<serde_json::Value>) -> bool {
        let sender = {
            let mut inner = self.inner.lock().unwrap();
            inner.held.pop_front()
        };
        match sender {
            Some(sender) => sender.send(result).is_ok(),
            None => false,
        }
    }

    /// Publish a connected notification to lifecycle subscribers.
    pub fn emit_connected(&self) {
        let _ = self.lifecycle.send(TransportEvent::Connected);
    }

    /// Publish a disconnected notification to lifecycle subscribers.
    pub fn emit_disconnected(&self) {
        let _ = self.lifecycle.send(TransportEvent::Disconnected);
    }

    /// Clear all state (requests, scripts, parked requests, id counter).
    ///
    /// Parked requests resolve with `ConnectionClosed`.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockRelayInner::default();
    }

    fn auto_ack(&self, request: &RpcRequest) -> serde_json::Value {
        if request.method.ends_with("_unsubscribe") {
            return serde_json::Value::Bool(true);
        }
        if request.method.ends_with("_subscribe") {
            let mut inner = self.inner.lock().unwrap();
            inner.next_id += 1;
            return serde_json::Value::String(format!("id-{}", inner.next_id));
        }
        serde_json::Value::Bool(true)
    }
}

impl Default for MockRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockRelay {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            lifecycle: self.lifecycle.clone(),
        }
    }
}

#[async_trait]
impl RelayRpc for MockRelay {
    async fn request(&self, request: RpcRequest) -> RpcResult<serde_json::Value> {
        let script = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(request.clone());
            inner.scripts.pop_front()
        };
        match script {
            Some(Script::Fail(error)) => Err(RpcError::Rejected(error)),
            Some(Script::Hold) => {
                let (sender, receiver) = oneshot::channel();
                self.inner.lock().unwrap().held.push_back(sender);
                match receiver.await {
                    Ok(result) => result,
                    Err(_) => Err(RpcError::ConnectionClosed),
                }
            }
            Some(Script::Ack(payload)) => Ok(payload),
            None => Ok(self.auto_ack(&request)),
        }
    }

    fn lifecycle(&self) -> broadcast::Receiver<TransportEvent> {
        self.lifecycle.subscribe()
    }
}
