//! # Subscriber
//!
//! The consuming side of the hub. A subscriber is created by the hub, then
//! attached to one or more topics with [`SubscriptionHub::subscribe`].
//!
//! [`SubscriptionHub::subscribe`]: crate::SubscriptionHub::subscribe

use crate::errors::HubError;
use shared_types::Delta;
use std::fmt;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

/// Identity of a subscriber, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 hex chars are plenty for logs
        let s = self.0.simple().to_string();
        f.write_str(&s[..8])
    }
}

/// A registered consumer with a bounded queue of pending deltas.
///
/// Dropping the subscriber detaches it from every topic; the hub prunes it on
/// the next broadcast.
pub struct Subscriber {
    id: SubscriberId,
    /// Cloned into every topic this subscriber joins.
    sender: mpsc::Sender<Delta>,
    receiver: mpsc::Receiver<Delta>,
    closed: watch::Receiver<bool>,
}

impl Subscriber {
    pub(crate) fn new(capacity: usize, closed: watch::Receiver<bool>) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            id: SubscriberId::new(),
            sender,
            receiver,
            closed,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn sender(&self) -> mpsc::Sender<Delta> {
        self.sender.clone()
    }

    /// Wait for the next delta.
    ///
    /// # Returns
    ///
    /// - `Ok(delta)` - The next delta, in broadcast order
    /// - `Err(HubError::Closed)` - The hub was closed (or dropped) and the
    ///   queue is drained
    pub async fn next(&mut self) -> Result<Delta, HubError> {
        loop {
            match self.receiver.try_recv() {
                Ok(delta) => return Ok(delta),
                Err(TryRecvError::Disconnected) => return Err(HubError::Closed),
                Err(TryRecvError::Empty) => {}
            }

            if *self.closed.borrow_and_update() {
                return Err(HubError::Closed);
            }

            tokio::select! {
                biased;
                received = self.receiver.recv() => {
                    return received.ok_or(HubError::Closed);
                }
                changed = self.closed.changed() => {
                    if changed.is_err() {
                        // Hub dropped: hand out what is left, then stop
                        return self.receiver.try_recv().map_err(|_| HubError::Closed);
                    }
                    // Closed flag flipped, loop to drain the queue first
                }
            }
        }
    }

    /// Take the next delta without waiting.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(delta))` - A delta was queued
    /// - `Ok(None)` - Nothing queued yet
    /// - `Err(HubError::Closed)` - The hub is closed and the queue is empty
    pub fn try_next(&mut self) -> Result<Option<Delta>, HubError> {
        match self.receiver.try_recv() {
            Ok(delta) => Ok(Some(delta)),
            Err(TryRecvError::Disconnected) => Err(HubError::Closed),
            Err(TryRecvError::Empty) => {
                if *self.closed.borrow() {
                    Err(HubError::Closed)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Number of deltas waiting in the queue.
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("pending", &self.pending())
            .finish()
    }
}
