//! Topics and subscription tracking.

use crate::shared::Symbol;
use crate::ws::MessageOut;
use std::collections::BTreeSet;

pub const ORDERBOOK_CHANNEL: &str = "orderbook";
pub const TICKER_CHANNEL: &str = "ticker";
pub const PRIVATE_CHANNEL: &str = "private";

/// A channel key on the realtime connection, e.g. `ticker:BTCUSDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(String);

impl Topic {
    pub fn orderbook(symbol: &Symbol) -> Self {
        Self(format!("{}:{}", ORDERBOOK_CHANNEL, symbol))
    }

    pub fn ticker(symbol: &Symbol) -> Self {
        Self(format!("{}:{}", TICKER_CHANNEL, symbol))
    }

    /// Pushed by the server after an auth frame; never subscribed to explicitly.
    pub fn private(user_id: impl std::fmt::Display) -> Self {
        Self(format!("{}:{}", PRIVATE_CHANNEL, user_id))
    }

    /// The public market topics for one symbol.
    pub fn market(symbol: &Symbol) -> [Topic; 2] {
        [Topic::orderbook(symbol), Topic::ticker(symbol)]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the first `:`.
    pub fn channel(&self) -> &str {
        self.0.split_once(':').map(|(c, _)| c).unwrap_or(&self.0)
    }

    /// Part after the first `:`.
    pub fn key(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, k)| k)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Topic> for String {
    fn from(t: Topic) -> String {
        t.0
    }
}

/// Topics currently subscribed on one connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    topics: BTreeSet<Topic>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set with the market topics of `symbol`.
    ///
    /// Returns the frames that make the server agree: one unsubscribe for all
    /// old topics (if any), then one subscribe for the new ones. Nothing when
    /// the set already matches.
    pub fn switch_to(&mut self, symbol: &Symbol) -> Vec<MessageOut> {
        let next: BTreeSet<Topic> = Topic::market(symbol).into_iter().collect();
        if next == self.topics {
            return Vec::new();
        }

        let mut frames = Vec::with_capacity(2);
        let old = std::mem::replace(&mut self.topics, next);
        if !old.is_empty() {
            tracing::debug!("Unsubscribing from {} topic(s)", old.len());
            frames.push(MessageOut::unsubscribe(old));
        }
        tracing::debug!("Subscribing to {}", symbol);
        frames.push(MessageOut::subscribe(self.topics.iter().cloned()));
        frames
    }

    /// Forget everything; the server drops subscriptions with the socket.
    pub fn clear(&mut self) {
        self.topics.clear();
    }

    pub fn contains(&self, topic: &Topic) -> bool {
        self.topics.contains(topic)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }
}
