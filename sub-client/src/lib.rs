//! # relaysub-client
//!
//! Subscription-lifecycle controller for relaysub relay clients.
//!
//! This is the main library that relay clients embed to manage topic
//! subscriptions.
//!
//! ## Features
//!
//! - **Acknowledged Registration**: subscriptions become active only on
//!   relay acknowledgement; unacked requests stay queued
//! - **At-Least-Once Delivery**: a heartbeat re-issues every pending
//!   request until the relay acks it
//! - **Crash Recovery**: active subscriptions persist as a snapshot and
//!   are re-established with fresh ids on restart
//! - **Pluggable Seams**: RPC provider, snapshot store, and message
//!   store are traits (with mock/in-memory implementations for testing)
//!
//! ## Example
//!
//! ```ignore
//! use relaysub_client::{Subscriber, SubscriberConfig};
//!
//! let subscriber = Subscriber::new(rpc, storage, messages, SubscriberConfig::default());
//! subscriber.init().await?;
//!
//! // Register interest in a topic
//! let id = subscriber.subscribe(topic, SubscribeOptions::new()).await?;
//!
//! // Drop it again
//! subscriber.unsubscribe(topic, UnsubscribeOptions::new()).await?;
//! ```
//!
//! ## Known Hazards
//!
//! ### The late-ack hazard
//!
//! A subscribe RPC in flight when the connection drops is not
//! cancelled. If its acknowledgement still arrives, it lands in the
//! regular ack pipeline and re-adds its subscription to the store the
//! disconnect just cleared, leaving a stale entry while the controller
//! is disabled. The reconnect resubscribe supersedes such entries when
//! the relay reissues the same id; an entry with an id the relay never
//! hands out again survives until its topic is unsubscribed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod heartbeat;
pub mod messages;
pub mod rpc;
pub mod storage;
pub mod subscriber;

pub use error::{Result, RpcError, RpcResult, StorageError, StorageResult, SubscriberError};
pub use event::SubscriberEvent;
pub use heartbeat::{Heartbeat, Pulse};
pub use messages::{MemoryMessageStore, MessageStore};
pub use rpc::{MockRelay, RelayRpc, RpcRequest, TransportEvent};
pub use storage::{JsonFileStorage, MemoryStorage, SnapshotStore};
pub use subscriber::{
    Subscriber, SubscriberConfig, STORAGE_VERSION, SUBSCRIBER_CONTEXT,
};
