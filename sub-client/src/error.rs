//! Error types for sub-client.

use sub_types::SubscriptionId;

/// Main error type for subscriber operations.
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    /// Restoring a persisted snapshot would clobber live subscriptions.
    #[error("restore would override {count} live subscriptions in {context}")]
    RestoreConflict {
        /// Name of the controller whose restore collided.
        context: String,
        /// Number of live subscriptions that would have been lost.
        count: usize,
    },

    /// The controller was used before `init()` completed.
    #[error("{context} not initialized")]
    NotInitialized {
        /// Name of the controller that was not initialized.
        context: String,
    },

    /// No subscription is held under the given id.
    #[error("subscription not found: {id}")]
    NotFound {
        /// The id that was not found.
        id: SubscriptionId,
    },

    /// Relay RPC error.
    #[error("relay rpc error: {0}")]
    Transport(#[from] RpcError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Relay RPC layer errors.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The relay answered with a JSON-RPC error.
    #[error("request rejected by relay: {0}")]
    Rejected(String),

    /// No connection to the relay.
    #[error("not connected")]
    NotConnected,

    /// Connection closed while a request was in flight.
    #[error("connection closed")]
    ConnectionClosed,

    /// The relay acknowledged with a payload of the wrong shape.
    #[error("malformed relay response: {0}")]
    MalformedResponse(String),

    /// Request params could not be encoded.
    #[error("failed to encode request params: {0}")]
    Encode(String),

    /// No acknowledgement within the provider's deadline.
    #[error("request timed out")]
    Timeout,
}

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot encoding or decoding failed.
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type alias for subscriber operations.
pub type Result<T> = std::result::Result<T, SubscriberError>;

/// Result type alias for relay RPC operations.
pub type RpcResult<T> = std::result::Result<T, RpcError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
