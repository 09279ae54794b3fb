//! # Subscription Hub
//!
//! The publishing side: topic registry, subscriptions and delta broadcast.

use crate::errors::HubError;
use crate::subscriber::{Subscriber, SubscriberId};
use crate::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_SEND_TIMEOUT_MS};
use parking_lot::RwLock;
use shared_types::Delta;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Hub tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Bounded queue size of each subscriber.
    pub queue_capacity: usize,
    /// How long a broadcast waits on a full queue before failing.
    pub send_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_CHANNEL_CAPACITY,
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
        }
    }
}

/// Counters for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubStats {
    pub topics: usize,
    pub subscriptions: usize,
    /// Deltas handed to `broadcast_deltas`.
    pub deltas_broadcast: u64,
    /// Individual queue insertions (delta × subscriber).
    pub deliveries: u64,
}

/// One subscriber's presence on a topic.
struct TopicSubscription {
    subscriber: SubscriberId,
    sender: mpsc::Sender<Delta>,
}

/// In-process topic based publish/subscribe for store deltas.
///
/// Registration and subscription take `&self`, so the hub can be shared
/// behind an `Arc` between the driver and the consumer tasks.
pub struct SubscriptionHub {
    config: HubConfig,
    topics: RwLock<HashMap<String, Vec<TopicSubscription>>>,
    closed: watch::Sender<bool>,
    deltas_broadcast: AtomicU64,
    deliveries: AtomicU64,
}

impl SubscriptionHub {
    /// Create a hub with default capacity and timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    #[must_use]
    pub fn with_config(config: HubConfig) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            config,
            topics: RwLock::new(HashMap::new()),
            closed,
            deltas_broadcast: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Register a topic. Fails if the name is taken or the hub is closed.
    pub fn register_topic(&self, name: &str) -> Result<(), HubError> {
        if self.is_closed() {
            return Err(HubError::Closed);
        }
        let mut topics = self.topics.write();
        if topics.contains_key(name) {
            return Err(HubError::DuplicateTopic {
                topic: name.to_string(),
            });
        }
        topics.insert(name.to_string(), Vec::new());
        debug!(topic = name, "Topic registered");
        Ok(())
    }

    /// Registered topic names, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Create a subscriber bound to this hub's close signal.
    ///
    /// The subscriber receives nothing until it joins a topic.
    #[must_use]
    pub fn new_subscriber(&self) -> Subscriber {
        Subscriber::new(self.config.queue_capacity, self.closed.subscribe())
    }

    /// Attach `subscriber` to `topic`.
    ///
    /// Only deltas broadcast after this call are delivered.
    pub fn subscribe(&self, subscriber: &Subscriber, topic: &str) -> Result<(), HubError> {
        if self.is_closed() {
            return Err(HubError::Closed);
        }
        let mut topics = self.topics.write();
        let Some(subscriptions) = topics.get_mut(topic) else {
            return Err(HubError::UnknownTopic {
                topic: topic.to_string(),
            });
        };

        if subscriptions
            .iter()
            .any(|s| s.subscriber == subscriber.id())
        {
            return Err(HubError::AlreadySubscribed {
                topic: topic.to_string(),
                subscriber: subscriber.id(),
            });
        }

        subscriptions.push(TopicSubscription {
            subscriber: subscriber.id(),
            sender: subscriber.sender(),
        });
        debug!(topic, subscriber = %subscriber.id(), "Subscription created");
        Ok(())
    }

    /// Enqueue `deltas`, in order, onto every subscriber of `topic`.
    ///
    /// Waits for queue space up to the configured send timeout, then fails
    /// with [`HubError::SubscriberOverflow`]. Subscribers that were dropped
    /// are pruned. Returns the number of queue insertions.
    pub async fn broadcast_deltas(&self, topic: &str, deltas: &[Delta]) -> Result<usize, HubError> {
        if self.is_closed() {
            return Err(HubError::Closed);
        }

        // Snapshot senders so no lock is held across an await
        let targets: Vec<(SubscriberId, mpsc::Sender<Delta>)> = {
            let topics = self.topics.read();
            let Some(subscriptions) = topics.get(topic) else {
                return Err(HubError::UnknownTopic {
                    topic: topic.to_string(),
                });
            };
            subscriptions
                .iter()
                .map(|s| (s.subscriber, s.sender.clone()))
                .collect()
        };

        self.deltas_broadcast
            .fetch_add(deltas.len() as u64, Ordering::Relaxed);

        if deltas.is_empty() || targets.is_empty() {
            return Ok(0);
        }

        let mut delivered = 0usize;
        let mut gone: Vec<SubscriberId> = Vec::new();

        for delta in deltas {
            for (subscriber, sender) in &targets {
                if gone.contains(subscriber) {
                    continue;
                }
                match self.send_one(sender, delta.clone()).await {
                    SendOutcome::Queued => delivered += 1,
                    SendOutcome::Gone => {
                        debug!(topic, subscriber = %subscriber, "Subscriber dropped, pruning");
                        gone.push(*subscriber);
                    }
                    SendOutcome::TimedOut => {
                        warn!(
                            topic,
                            subscriber = %subscriber,
                            capacity = self.config.queue_capacity,
                            "Subscriber queue overflow"
                        );
                        self.deliveries
                            .fetch_add(delivered as u64, Ordering::Relaxed);
                        return Err(HubError::SubscriberOverflow {
                            topic: topic.to_string(),
                            subscriber: *subscriber,
                            capacity: self.config.queue_capacity,
                        });
                    }
                }
            }
        }

        if !gone.is_empty() {
            self.prune(topic, &gone);
        }

        self.deliveries
            .fetch_add(delivered as u64, Ordering::Relaxed);
        debug!(topic, deltas = deltas.len(), delivered, "Deltas broadcast");
        Ok(delivered)
    }

    async fn send_one(&self, sender: &mpsc::Sender<Delta>, delta: Delta) -> SendOutcome {
        let delta = match sender.try_send(delta) {
            Ok(()) => return SendOutcome::Queued,
            Err(TrySendError::Closed(_)) => return SendOutcome::Gone,
            Err(TrySendError::Full(delta)) => delta,
        };

        match tokio::time::timeout(self.config.send_timeout, sender.send(delta)).await {
            Ok(Ok(())) => SendOutcome::Queued,
            Ok(Err(_)) => SendOutcome::Gone,
            Err(_) => SendOutcome::TimedOut,
        }
    }

    fn prune(&self, topic: &str, gone: &[SubscriberId]) {
        if let Some(subscriptions) = self.topics.write().get_mut(topic) {
            subscriptions.retain(|s| !gone.contains(&s.subscriber));
        }
    }

    /// Live subscribers of `topic` (0 for unknown topics).
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .get(topic)
            .map(|subs| subs.iter().filter(|s| !s.sender.is_closed()).count())
            .unwrap_or(0)
    }

    /// Close the hub. Subscribers drain their queues, then see `Closed`.
    pub fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }
        let subscriptions: usize = self.topics.read().values().map(Vec::len).sum();
        info!(subscriptions, "Subscription hub closed");
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    pub fn stats(&self) -> HubStats {
        let topics = self.topics.read();
        HubStats {
            topics: topics.len(),
            subscriptions: topics.values().map(Vec::len).sum(),
            deltas_broadcast: self.deltas_broadcast.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
        }
    }
}

impl Default for SubscriptionHub {
    fn default() -> Self {
        Self::new()
    }
}

enum SendOutcome {
    Queued,
    Gone,
    TimedOut,
}
