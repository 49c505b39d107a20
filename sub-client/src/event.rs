//! Typed lifecycle events emitted by the subscriber.
//!
//! Events are delivered over a tokio broadcast channel obtained from
//! [`Subscriber::events`](crate::Subscriber::events). Persistence is not
//! driven by these events; by the time an event is observable, the
//! snapshot write it corresponds to has already been attempted.

use sub_types::{ActiveSubscription, DeleteReason};

/// A notification about a subscription lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriberEvent {
    /// A subscription became active (fresh subscribe, retry, or resubscribe).
    Created(ActiveSubscription),

    /// A subscription left the store.
    Deleted {
        /// The record that was removed.
        subscription: ActiveSubscription,
        /// Why it was removed.
        reason: DeleteReason,
    },

    /// The persisted snapshot was rewritten successfully.
    Synced,
}

impl SubscriberEvent {
    /// The topic this event concerns, if it carries one.
    pub fn topic(&self) -> Option<&sub_types::Topic> {
        match self {
            SubscriberEvent::Created(subscription) => Some(&subscription.topic),
            SubscriberEvent::Deleted { subscription, .. } => Some(&subscription.topic),
            SubscriberEvent::Synced => None,
        }
    }
}
