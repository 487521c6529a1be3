//! Synchronous change notifications for ledger observers

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::workspace::edit::PendingEdit;

/// State transition of the ledger
#[derive(Debug, Clone)]
pub enum LedgerEvent {
    EditAdded(PendingEdit),
    /// Replaced, evicted, or dropped by a snapshot restore
    EditRemoved(PendingEdit),
    EditAccepted(PendingEdit),
    EditRejected(PendingEdit),
    AllAccepted,
    AllRejected,
    Cleared,
}

impl LedgerEvent {
    /// Stable event name, e.g. `edit-added`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EditAdded(_) => "edit-added",
            Self::EditRemoved(_) => "edit-removed",
            Self::EditAccepted(_) => "edit-accepted",
            Self::EditRejected(_) => "edit-rejected",
            Self::AllAccepted => "all-accepted",
            Self::AllRejected => "all-rejected",
            Self::Cleared => "cleared",
        }
    }

    /// The edit this event concerns, if any
    pub fn edit(&self) -> Option<&PendingEdit> {
        match self {
            Self::EditAdded(edit)
            | Self::EditRemoved(edit)
            | Self::EditAccepted(edit)
            | Self::EditRejected(edit) => Some(edit),
            Self::AllAccepted | Self::AllRejected | Self::Cleared => None,
        }
    }
}

/// Token returned by [`EventBus::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&LedgerEvent) + Send>;

/// Observer list invoked synchronously in registration order.
///
/// A panicking subscriber is logged and skipped; delivery to the remaining
/// subscribers and the emitting operation carry on.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&LedgerEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove a subscriber; returns false if the token was unknown
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: &LedgerEvent) {
        for (id, subscriber) in self.subscribers.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber(event)));
            if let Err(payload) = outcome {
                warn!(
                    subscription = id.0,
                    event = event.kind(),
                    panic = %panic_message(payload.as_ref()),
                    "Event subscriber panicked"
                );
            }
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
