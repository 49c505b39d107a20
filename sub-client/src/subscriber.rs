//! The subscriber controller.
//!
//! Owns the live subscription registry, the pending-request queue, and
//! the cached snapshot used across disconnects. Everything flows
//! through the same acknowledgement pipeline:
//!
//! 1. a subscribe is staged in the pending queue
//! 2. its RPC goes out to the relay
//! 3. the ack promotes it to an active subscription, clears the
//!    pending entry, and dispatches `created` (persisting a snapshot)
//!
//! Reconnect resubscribes and heartbeat retries re-enter the pipeline
//! at step 2, so every path has the same durability behavior.

use crate::error::{Result, RpcError, SubscriberError};
use crate::event::SubscriberEvent;
use crate::heartbeat::Pulse;
use crate::messages::MessageStore;
use crate::rpc::{RelayRpc, RpcRequest, TransportEvent};
use crate::storage::SnapshotStore;
use futures_util::future::join_all;
use std::fmt;
use std::sync::Arc;
use sub_core::{PendingQueue, SubscriptionRegistry};
use sub_types::{
    ActiveSubscription, DeleteReason, RelayApi, RelayProtocol, SubscribeOptions, SubscribeParams,
    SubscribeRequest, SubscriptionId, Topic, UnsubscribeOptions, UnsubscribeParams,
};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Name of this controller, used in error contexts and the storage key.
pub const SUBSCRIBER_CONTEXT: &str = "subscriber";

/// Version tag of the persisted snapshot format.
pub const STORAGE_VERSION: &str = "0.1";

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Configuration for a [`Subscriber`].
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Prefix of the persisted snapshot key.
    pub storage_prefix: String,
    /// Relay protocol used when a call does not pick one.
    pub default_relay: RelayProtocol,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            storage_prefix: "relaysub:".to_string(),
            default_relay: RelayProtocol::default(),
        }
    }
}

impl SubscriberConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage key prefix.
    pub fn with_storage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_prefix = prefix.into();
        self
    }

    /// Set the default relay protocol.
    pub fn with_default_relay(mut self, relay: RelayProtocol) -> Self {
        self.default_relay = relay;
        self
    }
}

/// Mutable controller state, guarded by one mutex.
///
/// Critical sections over this state never hold the lock across an
/// await, so each locked mutation is atomic with respect to every
/// other operation on the controller.
struct SubscriberState {
    registry: SubscriptionRegistry,
    pending: PendingQueue,
    cached: Vec<ActiveSubscription>,
    initialized: bool,
}

impl SubscriberState {
    fn new() -> Self {
        Self {
            registry: SubscriptionRegistry::new(),
            pending: PendingQueue::new(),
            cached: Vec::new(),
            initialized: false,
        }
    }
}

struct SubscriberInner {
    rpc: Arc<dyn RelayRpc>,
    storage: Arc<dyn SnapshotStore>,
    messages: Arc<dyn MessageStore>,
    config: SubscriberConfig,
    state: Mutex<SubscriberState>,
    events: broadcast::Sender<SubscriberEvent>,
}

/// Subscription-lifecycle controller for one relay client.
///
/// Cloning is cheap and every clone drives the same controller
/// instance. Distinct instances share nothing.
///
/// # Example
///
/// ```ignore
/// let subscriber = Subscriber::new(rpc, storage, messages, SubscriberConfig::default());
/// subscriber.init().await?;
/// let id = subscriber.subscribe(Topic::new("topic-a"), SubscribeOptions::new()).await?;
/// ```
#[derive(Clone)]
pub struct Subscriber {
    inner: Arc<SubscriberInner>,
}

impl Subscriber {
    /// Create a controller over the given collaborators.
    ///
    /// The controller starts uninitialized; call [`init`](Self::init)
    /// before subscribing.
    pub fn new(
        rpc: Arc<dyn RelayRpc>,
        storage: Arc<dyn SnapshotStore>,
        messages: Arc<dyn MessageStore>,
        config: SubscriberConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(SubscriberInner {
                rpc,
                storage,
                messages,
                config,
                state: Mutex::new(SubscriberState::new()),
                events,
            }),
        }
    }

    /// Get a receiver of [`SubscriberEvent`]s published after this call.
    pub fn events(&self) -> broadcast::Receiver<SubscriberEvent> {
        self.inner.events.subscribe()
    }

    /// The key this controller persists its snapshot under.
    pub fn storage_key(&self) -> String {
        format!(
            "{}{}//{}",
            self.inner.config.storage_prefix, STORAGE_VERSION, SUBSCRIBER_CONTEXT
        )
    }

    // ===========================================
    // Public lifecycle surface
    // ===========================================

    /// Initialize the controller: restore the persisted snapshot,
    /// resubscribe every restored entry fresh, and enable the
    /// controller.
    ///
    /// Restored subscription ids are relay-assigned ephemeral tokens,
    /// so they are never reused; each restored entry is subscribed
    /// again and receives a fresh id.
    ///
    /// Fails with [`SubscriberError::RestoreConflict`] if a non-empty
    /// snapshot meets a non-empty live store, leaving both untouched.
    /// A snapshot that cannot be loaded is logged and treated as empty.
    pub async fn init(&self) -> Result<()> {
        trace!("Initializing {}", SUBSCRIBER_CONTEXT);
        self.restore().await?;
        self.resubscribe_cached().await;
        self.enable().await;
        debug!("Subscriber initialized");
        Ok(())
    }

    /// Subscribe to `topic`, resolving once the relay acknowledges.
    ///
    /// Returns the relay-assigned subscription id. On RPC failure the
    /// staged request stays in the pending queue and is re-issued on
    /// heartbeat pulses until an acknowledgement lands.
    pub async fn subscribe(&self, topic: Topic, opts: SubscribeOptions) -> Result<SubscriptionId> {
        self.ensure_initialized().await?;
        let relay = self.resolve_relay(opts.relay);
        debug!("Subscribing to topic {} via {}", topic, relay);

        let request = SubscribeRequest::new(topic, relay);
        {
            let mut state = self.inner.state.lock().await;
            state.pending.insert(request.clone());
        }
        // on failure the pending entry stays staged for the retry loop
        let id = self.rpc_subscribe(&request.topic, &request.relay).await?;
        self.on_subscribe_ack(id.clone(), request).await;
        Ok(id)
    }

    /// Unsubscribe from `topic`.
    ///
    /// Without an explicit id, every id currently held for the topic is
    /// released: one RPC per id, issued concurrently and awaited until
    /// all settle. Each entry is removed as its own ack arrives, so a
    /// partial failure leaves the succeeded removals in place while the
    /// call reports the first failure.
    ///
    /// With [`UnsubscribeOptions::with_id`], releases that single id;
    /// fails with [`SubscriberError::NotFound`] if the id is not held
    /// against `topic`.
    pub async fn unsubscribe(&self, topic: Topic, opts: UnsubscribeOptions) -> Result<()> {
        self.ensure_initialized().await?;
        let relay = self.resolve_relay(opts.relay);
        match opts.id {
            Some(id) => {
                let known = {
                    let state = self.inner.state.lock().await;
                    state.registry.has(&id, &topic)
                };
                if !known {
                    return Err(SubscriberError::NotFound { id });
                }
                self.unsubscribe_id(&topic, &id, &relay).await
            }
            None => self.unsubscribe_topic(&topic, &relay).await,
        }
    }

    /// Handle a transport disconnect: cache the active list, clear the
    /// live store, and disable the controller.
    ///
    /// No `deleted` events fire and nothing is persisted; the cached
    /// list is what [`handle_connect`](Self::handle_connect) will
    /// resubscribe. Pending requests are kept.
    pub async fn handle_disconnect(&self) {
        let mut state = self.inner.state.lock().await;
        state.cached = state.registry.values();
        state.registry.clear();
        state.initialized = false;
        debug!("Subscriber disabled, cached {} subscriptions", state.cached.len());
    }

    /// Handle a transport reconnect: resubscribe every cached entry
    /// fresh, then enable the controller again.
    pub async fn handle_connect(&self) {
        self.resubscribe_cached().await;
        self.enable().await;
    }

    /// Handle a heartbeat pulse: re-issue a subscribe for every topic
    /// still awaiting acknowledgement.
    ///
    /// Retries are at-least-once and unsupervised: failures are logged
    /// per topic and left staged for the next pulse, and a retry never
    /// aborts its siblings.
    pub async fn handle_pulse(&self) {
        let requests = {
            let state = self.inner.state.lock().await;
            state.pending.requests()
        };
        if requests.is_empty() {
            return;
        }
        debug!("Retrying {} pending subscriptions", requests.len());
        let results = join_all(requests.iter().map(|request| self.retry_pending(request))).await;
        for (request, result) in requests.iter().zip(results) {
            if let Err(e) = result {
                warn!("Pending retry failed for topic {}: {}", request.topic, e);
            }
        }
    }

    /// Spawn the watcher task that feeds transport lifecycle events and
    /// heartbeat pulses into this controller.
    ///
    /// Disconnects are applied inline, so the store is invalidated
    /// before the next event is consumed. Connect resyncs and pulse
    /// retries issue RPCs that can stall on lost acknowledgements, so
    /// each dispatch runs on its own task and never starves the loop.
    ///
    /// The task runs until either channel closes or the handle is
    /// aborted. Tests usually skip this and call
    /// [`handle_connect`](Self::handle_connect) /
    /// [`handle_disconnect`](Self::handle_disconnect) /
    /// [`handle_pulse`](Self::handle_pulse) directly.
    pub fn run(&self, mut pulses: broadcast::Receiver<Pulse>) -> JoinHandle<()> {
        let subscriber = self.clone();
        let mut lifecycle = self.inner.rpc.lifecycle();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = lifecycle.recv() => match event {
                        Ok(TransportEvent::Connected) => {
                            let resync = subscriber.clone();
                            tokio::spawn(async move { resync.handle_connect().await });
                        }
                        // lock-only, cannot stall
                        Ok(TransportEvent::Disconnected) => subscriber.handle_disconnect().await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("Lifecycle receiver lagged, skipped {} events", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    pulse = pulses.recv() => match pulse {
                        Ok(_) => {
                            let retry = subscriber.clone();
                            tokio::spawn(async move { retry.handle_pulse().await });
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!("Subscriber watcher stopped");
        })
    }

    // ===========================================
    // Read views (owned copies, never references)
    // ===========================================

    /// Whether the controller is initialized and enabled.
    pub async fn is_initialized(&self) -> bool {
        self.inner.state.lock().await.initialized
    }

    /// Number of active subscriptions.
    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.registry.len()
    }

    /// Whether no subscriptions are active.
    pub async fn is_empty(&self) -> bool {
        self.inner.state.lock().await.registry.is_empty()
    }

    /// Every active subscription id, ordered.
    pub async fn ids(&self) -> Vec<SubscriptionId> {
        self.inner.state.lock().await.registry.ids()
    }

    /// Every active subscription record, ordered by id.
    pub async fn values(&self) -> Vec<ActiveSubscription> {
        self.inner.state.lock().await.registry.values()
    }

    /// Every topic with at least one active subscription, ordered.
    pub async fn topics(&self) -> Vec<Topic> {
        self.inner.state.lock().await.registry.topics()
    }

    /// Every id held against `topic`, ordered.
    pub async fn topic_ids(&self, topic: &Topic) -> Vec<SubscriptionId> {
        self.inner.state.lock().await.registry.topic_ids(topic)
    }

    /// Whether at least one subscription is held against `topic`.
    pub async fn is_subscribed(&self, topic: &Topic) -> bool {
        self.inner.state.lock().await.registry.contains_topic(topic)
    }

    /// Whether `id` is held against `topic`.
    pub async fn has_subscription(&self, id: &SubscriptionId, topic: &Topic) -> bool {
        self.inner.state.lock().await.registry.has(id, topic)
    }

    /// Look up the subscription under `id`.
    pub async fn subscription(&self, id: &SubscriptionId) -> Result<ActiveSubscription> {
        self.inner
            .state
            .lock()
            .await
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| SubscriberError::NotFound { id: id.clone() })
    }

    /// Every subscribe request still awaiting acknowledgement, ordered
    /// by topic.
    pub async fn pending_requests(&self) -> Vec<SubscribeRequest> {
        self.inner.state.lock().await.pending.requests()
    }

    // ===========================================
    // Acknowledgement pipeline
    // ===========================================

    /// Apply a subscribe acknowledgement: promote the request to an
    /// active subscription, clear its pending entry, and dispatch
    /// `created` if the id was new.
    ///
    /// Duplicate acks for a known id are no-ops. An ack arriving after
    /// a disconnect cleared the store still lands here and re-adds its
    /// entry; see the crate docs on the late-ack hazard.
    async fn on_subscribe_ack(&self, id: SubscriptionId, request: SubscribeRequest) {
        let subscription = request.into_active(id);
        let created = {
            let mut state = self.inner.state.lock().await;
            state.pending.remove(&subscription.topic);
            state.registry.set(subscription.clone())
        };
        if created {
            self.dispatch_created(subscription).await;
        }
    }

    /// Apply a resubscribe acknowledgement: install the fresh entry
    /// unconditionally and supersede the pre-disconnect id if some
    /// other path re-added it while this resubscribe was in flight.
    async fn on_resubscribe_ack(
        &self,
        id: SubscriptionId,
        request: SubscribeRequest,
        previous_id: &SubscriptionId,
    ) {
        let subscription = request.into_active(id);
        let superseded = {
            let mut state = self.inner.state.lock().await;
            state.pending.remove(&subscription.topic);
            state.registry.insert(subscription.clone());
            if previous_id != &subscription.id && state.registry.contains(previous_id) {
                state.registry.remove(previous_id)
            } else {
                None
            }
        };
        self.dispatch_created(subscription).await;
        if let Some(old) = superseded {
            debug!("Superseded stale subscription {}", old.id);
            self.dispatch_deleted(old, DeleteReason::Resubscribed).await;
        }
    }

    /// Apply an unsubscribe acknowledgement: remove the entry if it is
    /// still held against `topic`, dispatch `deleted`, and purge the
    /// topic's cached inbound messages.
    async fn on_unsubscribe_ack(&self, topic: &Topic, id: &SubscriptionId) -> Result<()> {
        let removed = {
            let mut state = self.inner.state.lock().await;
            if state.registry.has(id, topic) {
                state.registry.remove(id)
            } else {
                None
            }
        };
        if let Some(subscription) = removed {
            self.dispatch_deleted(subscription, DeleteReason::Deleted).await;
        }
        self.inner.messages.delete(topic).await?;
        Ok(())
    }

    async fn dispatch_created(&self, subscription: ActiveSubscription) {
        debug!(
            "Subscription created: {} on topic {}",
            subscription.id, subscription.topic
        );
        let _ = self.inner.events.send(SubscriberEvent::Created(subscription));
        self.persist().await;
    }

    async fn dispatch_deleted(&self, subscription: ActiveSubscription, reason: DeleteReason) {
        debug!(
            "Subscription deleted: {} on topic {} ({})",
            subscription.id, subscription.topic, reason
        );
        let _ = self.inner.events.send(SubscriberEvent::Deleted {
            subscription,
            reason,
        });
        self.persist().await;
    }

    /// Overwrite the persisted snapshot with the current active list.
    ///
    /// Write failures are logged, not surfaced: the live store is the
    /// source of truth and the next lifecycle event rewrites the whole
    /// snapshot anyway.
    async fn persist(&self) {
        let snapshot = {
            let state = self.inner.state.lock().await;
            state.registry.values()
        };
        let key = self.storage_key();
        trace!("Persisting {} subscriptions under {}", snapshot.len(), key);
        if let Err(e) = self.inner.storage.set(&key, &snapshot).await {
            warn!("Failed to persist subscriptions: {}", e);
            return;
        }
        let _ = self.inner.events.send(SubscriberEvent::Synced);
    }

    // ===========================================
    // Restore and resync
    // ===========================================

    async fn restore(&self) -> Result<()> {
        let key = self.storage_key();
        let snapshot = match self.inner.storage.get(&key).await {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load persisted subscriptions, starting empty: {}", e);
                return Ok(());
            }
        };
        if snapshot.is_empty() {
            return Ok(());
        }
        let mut state = self.inner.state.lock().await;
        if !state.registry.is_empty() {
            return Err(SubscriberError::RestoreConflict {
                context: SUBSCRIBER_CONTEXT.to_string(),
                count: state.registry.len(),
            });
        }
        debug!("Restored {} persisted subscriptions", snapshot.len());
        state.cached = snapshot;
        Ok(())
    }

    /// Resubscribe every cached entry, collecting per-item outcomes.
    ///
    /// Failures are logged per topic and never abort sibling
    /// resubscribes; a failed topic stays staged in the pending queue
    /// and is picked up by the heartbeat retry loop.
    async fn resubscribe_cached(&self) {
        let cached = {
            let state = self.inner.state.lock().await;
            state.cached.clone()
        };
        if cached.is_empty() {
            return;
        }
        debug!("Resubscribing {} cached subscriptions", cached.len());
        let results = join_all(cached.iter().map(|previous| self.resubscribe(previous))).await;
        for (previous, result) in cached.iter().zip(results) {
            if let Err(e) = result {
                warn!("Resubscribe failed for topic {}: {}", previous.topic, e);
            }
        }
    }

    async fn resubscribe(&self, previous: &ActiveSubscription) -> Result<()> {
        let request = SubscribeRequest::new(previous.topic.clone(), previous.relay.clone());
        {
            let mut state = self.inner.state.lock().await;
            state.pending.insert(request.clone());
        }
        let id = self.rpc_subscribe(&request.topic, &request.relay).await?;
        self.on_resubscribe_ack(id, request, &previous.id).await;
        Ok(())
    }

    async fn retry_pending(&self, request: &SubscribeRequest) -> Result<()> {
        let id = self.rpc_subscribe(&request.topic, &request.relay).await?;
        self.on_subscribe_ack(id, request.clone()).await;
        Ok(())
    }

    async fn enable(&self) {
        let mut state = self.inner.state.lock().await;
        state.cached.clear();
        state.initialized = true;
        debug!("Subscriber enabled");
    }

    // ===========================================
    // Relay RPC
    // ===========================================

    async fn rpc_subscribe(&self, topic: &Topic, relay: &RelayProtocol) -> Result<SubscriptionId> {
        let api = RelayApi::for_protocol(relay);
        let params = serde_json::to_value(SubscribeParams {
            topic: topic.clone(),
        })
        .map_err(|e| RpcError::Encode(e.to_string()))?;
        trace!("Sending {} for topic {}", api.subscribe, topic);
        let ack = self
            .inner
            .rpc
            .request(RpcRequest::new(api.subscribe, params))
            .await?;
        match ack.as_str() {
            Some(id) => Ok(SubscriptionId::new(id)),
            None => Err(RpcError::MalformedResponse(format!(
                "expected subscription id string, got {ack}"
            ))
            .into()),
        }
    }

    async fn rpc_unsubscribe(
        &self,
        topic: &Topic,
        id: &SubscriptionId,
        relay: &RelayProtocol,
    ) -> Result<()> {
        let api = RelayApi::for_protocol(relay);
        let params = serde_json::to_value(UnsubscribeParams {
            topic: topic.clone(),
            id: id.clone(),
        })
        .map_err(|e| RpcError::Encode(e.to_string()))?;
        trace!("Sending {} for id {}", api.unsubscribe, id);
        self.inner
            .rpc
            .request(RpcRequest::new(api.unsubscribe, params))
            .await?;
        Ok(())
    }

    // ===========================================
    // Unsubscribe fan-out
    // ===========================================

    async fn unsubscribe_topic(&self, topic: &Topic, relay: &RelayProtocol) -> Result<()> {
        let ids = {
            let state = self.inner.state.lock().await;
            state.registry.topic_ids(topic)
        };
        debug!("Unsubscribing {} ids for topic {}", ids.len(), topic);
        let results = join_all(ids.iter().map(|id| self.unsubscribe_id(topic, id, relay))).await;
        let mut first_error = None;
        for (id, result) in ids.iter().zip(results) {
            if let Err(e) = result {
                warn!("Unsubscribe failed for id {}: {}", id, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn unsubscribe_id(
        &self,
        topic: &Topic,
        id: &SubscriptionId,
        relay: &RelayProtocol,
    ) -> Result<()> {
        debug!("Unsubscribing id {} on topic {}", id, topic);
        self.rpc_unsubscribe(topic, id, relay).await?;
        self.on_unsubscribe_ack(topic, id).await
    }

    // ===========================================
    // Helpers
    // ===========================================

    fn resolve_relay(&self, relay: Option<RelayProtocol>) -> RelayProtocol {
        relay.unwrap_or_else(|| self.inner.config.default_relay.clone())
    }

    async fn ensure_initialized(&self) -> Result<()> {
        let state = self.inner.state.lock().await;
        if state.initialized {
            Ok(())
        } else {
            Err(SubscriberError::NotInitialized {
                context: SUBSCRIBER_CONTEXT.to_string(),
            })
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
