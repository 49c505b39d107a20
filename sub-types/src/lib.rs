//! # relaysub-types
//!
//! Shared types for the relaysub pub/sub subscription engine.
//!
//! This crate provides the vocabulary used across all relaysub crates:
//! - [`Topic`], [`SubscriptionId`] - Identity types
//! - [`RelayProtocol`], [`RelayApi`] - Protocol tags and JSON-RPC method lookup
//! - [`ActiveSubscription`], [`SubscribeRequest`] - Subscription records
//! - [`SubscribeOptions`], [`UnsubscribeOptions`] - Call options

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ids;
mod protocol;
mod subscription;

pub use ids::{SubscriptionId, Topic};
pub use protocol::{
    RelayApi, RelayProtocol, SubscribeParams, UnsubscribeParams, DEFAULT_RELAY_PROTOCOL,
};
pub use subscription::{
    ActiveSubscription, DeleteReason, SubscribeOptions, SubscribeRequest, UnsubscribeOptions,
};
