//! Synchronous observer registry for world events.

use std::fmt;

use serpents_core::Event;

/// Receives every event the world broadcasts, in emission order.
pub trait Observer {
    /// Called synchronously once per event.
    fn notify(&mut self, event: &Event);
}

impl<F> Observer for F
where
    F: FnMut(&Event),
{
    fn notify(&mut self, event: &Event) {
        self(event);
    }
}

/// Handle returned by [`Notifier::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered list of registered observers.
#[derive(Default)]
pub struct Notifier {
    next_id: u64,
    observers: Vec<(SubscriptionId, Box<dyn Observer>)>,
}

impl Notifier {
    /// Registers an observer and returns its subscription handle.
    pub fn subscribe(&mut self, observer: Box<dyn Observer>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.observers.push((id, observer));
        id
    }

    /// Removes an observer. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(registered, _)| *registered != id);
        self.observers.len() != before
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Reports whether no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Hands each event to every observer.
    pub fn dispatch(&mut self, events: &[Event]) {
        if self.observers.is_empty() {
            return;
        }
        for event in events {
            for (_, observer) in &mut self.observers {
                observer.notify(event);
            }
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}
