//! In-process publish/subscribe channel for row-change events.
//!
//! # Responsibility
//! - Fan out every committed row change to subscribers whose filter matches.
//! - Group subscribers into named channels that screens can drop as a unit.
//!
//! # Invariants
//! - Delivery order per subscriber equals publish order.
//! - Channels are unbounded; there is no replay for late subscribers.
//! - Dropping a [`Subscription`] unregisters it.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use uuid::Uuid;

/// Schema tables that publish changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Profiles,
    Posts,
    Stories,
    Comments,
    Likes,
    Follows,
    Messages,
    Notifications,
    Tips,
    UserBadges,
    BannerAds,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Posts => "posts",
            Self::Stories => "stories",
            Self::Comments => "comments",
            Self::Likes => "likes",
            Self::Follows => "follows",
            Self::Messages => "messages",
            Self::Notifications => "notifications",
            Self::Tips => "tips",
            Self::UserBadges => "user_badges",
            Self::BannerAds => "banner_ads",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One committed row change.
#[derive(Debug, Clone, PartialEq)]
pub struct RowChange {
    pub table: Table,
    pub kind: ChangeKind,
    pub row_id: Uuid,
    /// Row state after the change; for deletes, the removed row's columns
    /// known to the writer.
    pub record: Value,
}

impl RowChange {
    /// Builds a change with the serialized record.
    ///
    /// Serialization failures degrade to `Value::Null` so a row write is
    /// never rejected because of its notification payload.
    pub fn new(table: Table, kind: ChangeKind, row_id: Uuid, record: &impl Serialize) -> Self {
        Self {
            table,
            kind,
            row_id,
            record: serde_json::to_value(record).unwrap_or(Value::Null),
        }
    }

    /// Returns a record column rendered as text, if present.
    pub fn column_text(&self, column: &str) -> Option<String> {
        match self.record.get(column)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Subscription predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    pub table: Table,
    /// `None` matches every change kind.
    pub kind: Option<ChangeKind>,
    /// Equality filter on one record column, compared as text.
    pub column_eq: Option<(String, String)>,
}

impl ChangeFilter {
    pub fn all(table: Table) -> Self {
        Self {
            table,
            kind: None,
            column_eq: None,
        }
    }

    pub fn inserts(table: Table) -> Self {
        Self {
            table,
            kind: Some(ChangeKind::Insert),
            column_eq: None,
        }
    }

    pub fn with_column_eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.column_eq = Some((column.into(), value.to_string()));
        self
    }

    pub fn matches(&self, change: &RowChange) -> bool {
        if change.table != self.table {
            return false;
        }
        if self.kind.is_some_and(|kind| kind != change.kind) {
            return false;
        }
        match &self.column_eq {
            Some((column, expected)) => change
                .column_text(column)
                .is_some_and(|actual| &actual == expected),
            None => true,
        }
    }
}

struct Subscriber {
    id: u64,
    filter: ChangeFilter,
    sender: Sender<RowChange>,
}

#[derive(Default)]
struct FeedState {
    next_id: u64,
    channels: BTreeMap<String, Vec<Subscriber>>,
}

/// Cloneable handle to the shared change channel registry.
#[derive(Clone, Default)]
pub struct ChangeFeed {
    state: Arc<Mutex<FeedState>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber on `channel`.
    pub fn subscribe(&self, channel: &str, filter: ChangeFilter) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = state.next_id;
        state
            .channels
            .entry(channel.to_string())
            .or_default()
            .push(Subscriber { id, filter, sender });
        Subscription {
            id,
            channel: channel.to_string(),
            receiver,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Delivers `change` to every matching subscriber.
    ///
    /// Returns the number of subscribers it was delivered to.
    pub fn publish(&self, change: RowChange) -> usize {
        let mut state = lock(&self.state);
        let mut delivered = 0;
        for subscribers in state.channels.values_mut() {
            subscribers.retain(|subscriber| {
                if !subscriber.filter.matches(&change) {
                    return true;
                }
                match subscriber.sender.send(change.clone()) {
                    Ok(()) => {
                        delivered += 1;
                        true
                    }
                    Err(_) => false,
                }
            });
        }
        state.channels.retain(|_, subscribers| !subscribers.is_empty());
        delivered
    }

    /// Unregisters every subscriber of `channel`.
    ///
    /// Existing [`Subscription`] handles stop receiving and report
    /// disconnection once drained.
    pub fn remove_channel(&self, channel: &str) -> bool {
        lock(&self.state).channels.remove(channel).is_some()
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        lock(&self.state)
            .channels
            .get(channel)
            .map_or(0, |subscribers| subscribers.len())
    }
}

/// Receiving end of one channel subscription.
pub struct Subscription {
    id: u64,
    channel: String,
    receiver: Receiver<RowChange>,
    state: Weak<Mutex<FeedState>>,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns the next pending change without blocking.
    pub fn try_recv(&self) -> Option<RowChange> {
        match self.receiver.try_recv() {
            Ok(change) => Some(change),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Waits up to `timeout` for the next change.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<RowChange> {
        match self.receiver.recv_timeout(timeout) {
            Ok(change) => Some(change),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Takes every pending change.
    pub fn drain(&self) -> Vec<RowChange> {
        self.receiver.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = lock(&state);
        if let Some(subscribers) = state.channels.get_mut(&self.channel) {
            subscribers.retain(|subscriber| subscriber.id != self.id);
            if subscribers.is_empty() {
                state.channels.remove(&self.channel);
            }
        }
    }
}

fn lock(state: &Mutex<FeedState>) -> MutexGuard<'_, FeedState> {
    // A panicking subscriber callback cannot leave the registry half-updated.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
