//! Event channel implementation using crossbeam-channel.
//!
//! Operations run on a background worker and push events here; the
//! interaction thread drains them in order.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::{Event, ItemEvent, ItemProgress, Operation, RunEvent};

/// Sends events from an archive operation.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    pub fn new(sender: Sender<Event>) -> Self {
        Self { inner: sender }
    }

    /// Send an event. A dropped receiver discards it silently, so progress
    /// reporting never alters control flow.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }

    pub(crate) fn started(&self, operation: Operation, total: usize) {
        self.send(Event::Run(RunEvent::Started { operation, total }));
    }

    pub(crate) fn progress(&self, operation: Operation, index: usize, total: usize, name: &str) {
        self.send(Event::Item(ItemEvent::Progress(ItemProgress {
            operation,
            index,
            total,
            name: name.to_string(),
        })));
    }

    pub(crate) fn skipped(&self, operation: Operation, name: &str, reason: impl Into<String>) {
        self.send(Event::Item(ItemEvent::Skipped {
            operation,
            name: name.to_string(),
            reason: reason.into(),
        }));
    }
}

/// Receives events on the interaction side.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Take everything currently queued
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

/// Factory for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Create a bounded event channel. A slow consumer back-pressures the
    /// operation between items.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        EventChannel
    }
}

/// A sender whose receiver is already gone.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn events_arrive_in_send_order_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.started(Operation::Organize, 2);
            sender.progress(Operation::Organize, 1, 2, "a.jpg");
            sender.progress(Operation::Organize, 2, 2, "b.jpg");
        });
        handle.join().unwrap();

        let events: Vec<Event> = receiver.iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            Event::Run(RunEvent::Started { total: 2, .. })
        ));
        match &events[2] {
            Event::Item(ItemEvent::Progress(p)) => {
                assert_eq!(p.index, 2);
                assert_eq!(p.name, "b.jpg");
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        sender.skipped(Operation::Backup, "IMG_1.jpg", "pull failed");
    }

    #[test]
    fn bounded_channel_respects_capacity() {
        let (sender, receiver) = EventChannel::bounded(2);

        sender.started(Operation::Backup, 0);
        sender.started(Operation::Backup, 0);

        assert_eq!(receiver.drain().len(), 2);
        assert!(receiver.try_recv().is_none());
    }
}
