//! # relaysub-core
//!
//! Pure subscription bookkeeping for relaysub (no I/O, instant tests).
//!
//! This crate holds the containers the subscription engine mutates:
//! the registry of acknowledged subscriptions, its topic index, and the
//! queue of subscribe requests still awaiting acknowledgement.
//!
//! ## Design Philosophy
//!
//! Everything here is **pure** - methods mutate in-memory state and
//! return facts about what changed, nothing more. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (ordered views, same input → same output)
//! - Easy reasoning about the store invariants
//!
//! The actual I/O (relay RPC, persistence, events) is performed by
//! `sub-client`, which drives these containers from acknowledgement
//! handlers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod pending;
pub mod registry;
pub mod topics;

pub use pending::PendingQueue;
pub use registry::SubscriptionRegistry;
pub use topics::TopicIndex;
