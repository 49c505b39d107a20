//! Subscription records and the options accepted by subscribe/unsubscribe.

use crate::ids::{SubscriptionId, Topic};
use crate::protocol::RelayProtocol;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An acknowledged subscription held against the relay.
///
/// This is the unit relaysub stores, persists, and resubscribes after a
/// reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSubscription {
    /// Relay-assigned identifier.
    pub id: SubscriptionId,
    /// Topic the subscription covers.
    pub topic: Topic,
    /// Relay protocol the subscription was established with.
    pub relay: RelayProtocol,
}

impl ActiveSubscription {
    /// Create an ActiveSubscription.
    pub fn new(id: SubscriptionId, topic: Topic, relay: RelayProtocol) -> Self {
        Self { id, topic, relay }
    }
}

/// A subscribe request staged before its acknowledgement arrives.
///
/// Carries everything needed to re-issue the request, so a failed or
/// unacknowledged subscribe can be retried later without caller input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Topic being subscribed to.
    pub topic: Topic,
    /// Relay protocol to subscribe with.
    pub relay: RelayProtocol,
}

impl SubscribeRequest {
    /// Create a SubscribeRequest.
    pub fn new(topic: Topic, relay: RelayProtocol) -> Self {
        Self { topic, relay }
    }

    /// Promote this request to an [`ActiveSubscription`] once the relay
    /// has acknowledged it with `id`.
    pub fn into_active(self, id: SubscriptionId) -> ActiveSubscription {
        ActiveSubscription::new(id, self.topic, self.relay)
    }
}

/// Why a subscription left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteReason {
    /// The caller asked for the subscription to be released.
    Deleted,
    /// A resubscribe established a replacement under a fresh id.
    Resubscribed,
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteReason::Deleted => write!(f, "deleted"),
            DeleteReason::Resubscribed => write!(f, "resubscribed"),
        }
    }
}

/// Options accepted by a subscribe call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Relay protocol override. Falls back to the controller default.
    pub relay: Option<RelayProtocol>,
}

impl SubscribeOptions {
    /// Create empty options (controller defaults apply).
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe with a specific relay protocol.
    pub fn with_relay(mut self, relay: RelayProtocol) -> Self {
        self.relay = Some(relay);
        self
    }
}

/// Options accepted by an unsubscribe call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnsubscribeOptions {
    /// Release only this subscription id instead of every id on the topic.
    pub id: Option<SubscriptionId>,
    /// Relay protocol override. Falls back to the controller default.
    pub relay: Option<RelayProtocol>,
}

impl UnsubscribeOptions {
    /// Create empty options (release every id on the topic).
    pub fn new() -> Self {
        Self::default()
    }

    /// Release a single subscription id.
    pub fn with_id(mut self, id: SubscriptionId) -> Self {
        self.id = Some(id);
        self
    }

    /// Unsubscribe with a specific relay protocol.
    pub fn with_relay(mut self, relay: RelayProtocol) -> Self {
        self.relay = Some(relay);
        self
    }
}
