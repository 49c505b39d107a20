//! Relay protocol tags and the JSON-RPC method lookup derived from them.

use crate::ids::{SubscriptionId, Topic};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The protocol tag used when a caller does not pick one.
pub const DEFAULT_RELAY_PROTOCOL: &str = "irn";

/// A relay protocol tag, e.g. `"irn"`.
///
/// The tag selects which JSON-RPC method family the relay speaks; see
/// [`RelayApi::for_protocol`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelayProtocol(String);

impl RelayProtocol {
    /// Create a RelayProtocol from any string-like value.
    pub fn new(protocol: impl Into<String>) -> Self {
        Self(protocol.into())
    }

    /// Get the protocol tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RelayProtocol {
    fn default() -> Self {
        Self(DEFAULT_RELAY_PROTOCOL.to_string())
    }
}

impl From<&str> for RelayProtocol {
    fn from(protocol: &str) -> Self {
        Self(protocol.to_string())
    }
}

impl fmt::Display for RelayProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RelayProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelayProtocol({})", self.0)
    }
}

/// The JSON-RPC method names for one relay protocol.
///
/// Method names are derived from the protocol tag: the `"irn"` protocol
/// subscribes via `irn_subscribe`, is notified via `irn_subscription`,
/// and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayApi {
    /// Method for publishing a message to a topic.
    pub publish: String,
    /// Method for subscribing to a topic.
    pub subscribe: String,
    /// Method the relay uses to push inbound messages to the client.
    pub subscription: String,
    /// Method for releasing a subscription.
    pub unsubscribe: String,
}

impl RelayApi {
    /// Derive the method names for `protocol`.
    pub fn for_protocol(protocol: &RelayProtocol) -> Self {
        let prefix = protocol.as_str();
        Self {
            publish: format!("{prefix}_publish"),
            subscribe: format!("{prefix}_subscribe"),
            subscription: format!("{prefix}_subscription"),
            unsubscribe: format!("{prefix}_unsubscribe"),
        }
    }
}

/// Params for a relay subscribe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeParams {
    /// Topic to subscribe to.
    pub topic: Topic,
}

/// Params for a relay unsubscribe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeParams {
    /// Topic the subscription was held against.
    pub topic: Topic,
    /// Relay-assigned id of the subscription being released.
    pub id: SubscriptionId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_protocol_is_irn() {
        assert_eq!(RelayProtocol::default().as_str(), "irn");
    }

    #[test]
    fn api_methods_derive_from_tag() {
        let api = RelayApi::for_protocol(&RelayProtocol::default());
        assert_eq!(api.publish, "irn_publish");
        assert_eq!(api.subscribe, "irn_subscribe");
        assert_eq!(api.subscription, "irn_subscription");
        assert_eq!(api.unsubscribe, "irn_unsubscribe");
    }

    #[test]
    fn api_methods_follow_custom_tag() {
        let api = RelayApi::for_protocol(&RelayProtocol::new("alt"));
        assert_eq!(api.subscribe, "alt_subscribe");
        assert_eq!(api.unsubscribe, "alt_unsubscribe");
    }

    #[test]
    fn subscribe_params_wire_shape() {
        let params = SubscribeParams {
            topic: Topic::new("topic-a"),
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({ "topic": "topic-a" }));
    }

    #[test]
    fn unsubscribe_params_wire_shape() {
        let params = UnsubscribeParams {
            topic: Topic::new("topic-a"),
            id: SubscriptionId::new("sub-1"),
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({ "topic": "topic-a", "id": "sub-1" }));
    }
}
