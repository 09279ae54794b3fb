use crate::subscriber::SubscriberId;
use thiserror::Error;

/// Errors from hub registration, broadcast and consumption.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HubError {
    /// A topic with this name already exists.
    #[error("Topic already registered: {topic}")]
    DuplicateTopic { topic: String },

    /// The topic was never registered.
    #[error("Unknown topic: {topic}")]
    UnknownTopic { topic: String },

    /// The subscriber already listens on this topic.
    #[error("Subscriber {subscriber} already subscribed to {topic}")]
    AlreadySubscribed {
        topic: String,
        subscriber: SubscriberId,
    },

    /// A subscriber queue stayed full past the send timeout.
    #[error("Subscriber {subscriber} on {topic} overflowed its queue of {capacity} deltas")]
    SubscriberOverflow {
        topic: String,
        subscriber: SubscriberId,
        capacity: usize,
    },

    /// The hub was closed.
    #[error("Subscription hub closed")]
    Closed,
}
