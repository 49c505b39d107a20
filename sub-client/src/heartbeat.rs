//! Heartbeat pulse source.
//!
//! Pending subscribe requests are reconciled on heartbeat pulses rather
//! than on their own timers. This module provides the pulse source: a
//! ticking variant for production wiring and a manual variant so tests
//! can drive retries deterministically.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

/// A single heartbeat tick. Carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse;

const PULSE_CHANNEL_CAPACITY: usize = 16;

/// Broadcast source of heartbeat pulses.
///
/// Receivers obtained from [`subscribe`](Self::subscribe) observe every
/// pulse published after the call, whether the pulse came from the
/// ticker or from [`pulse`](Self::pulse). Dropping the heartbeat stops
/// the ticker.
#[derive(Debug)]
pub struct Heartbeat {
    sender: broadcast::Sender<Pulse>,
    ticker: Option<JoinHandle<()>>,
}

impl Heartbeat {
    /// Start a heartbeat that pulses every `interval`.
    pub fn start(interval: Duration) -> Self {
        let (sender, _) = broadcast::channel(PULSE_CHANNEL_CAPACITY);
        let tick_sender = sender.clone();
        let ticker = tokio::spawn(async move {
            debug!("Heartbeat started (interval: {:?})", interval);
            let mut timer = tokio::time::interval(interval);
            loop {
                timer.tick().await;
                // no receivers yet is fine, pulses are fire-and-forget
                let _ = tick_sender.send(Pulse);
            }
        });
        Self {
            sender,
            ticker: Some(ticker),
        }
    }

    /// Create a heartbeat that only pulses when [`pulse`](Self::pulse)
    /// is called.
    pub fn manual() -> Self {
        let (sender, _) = broadcast::channel(PULSE_CHANNEL_CAPACITY);
        Self {
            sender,
            ticker: None,
        }
    }

    /// Publish one pulse by hand.
    pub fn pulse(&self) {
        let _ = self.sender.send(Pulse);
    }

    /// Get a receiver of future pulses.
    pub fn subscribe(&self) -> broadcast::Receiver<Pulse> {
        self.sender.subscribe()
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}
