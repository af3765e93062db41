//! Event channel implementation using crossbeam-channel.
//!
//! Stage threads and their workers publish progress through an
//! [`EventSender`]; the CLI (or a test) drains the matching receiver.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::Event;

/// Sends events from pipeline stages.
///
/// Cheap to clone; every stage and worker holds its own copy.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Wrap a raw crossbeam sender.
    pub fn new(sender: Sender<Event>) -> Self {
        Self { inner: sender }
    }

    /// Publish an event.
    ///
    /// A dropped receiver is not an error: reporting is optional and the
    /// pipeline keeps running without it.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receives events published by a pipeline run.
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

    /// Iterate until every sender has been dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Constructors for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Create an unbounded event channel.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Create a bounded event channel.
    ///
    /// Stages block on `send` once `capacity` events are pending, so only
    /// use this with a receiver that keeps up.
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

/// A sender whose receiver is already gone; every event is discarded.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PipelineEvent, StageEvent, StageProgress};
    use std::thread;

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Stage(StageEvent::ItemProcessed(StageProgress {
                stage: "single_hash",
                completed: 3,
            })));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Stage(StageEvent::ItemProcessed(p)) => {
                assert_eq!(p.stage, "single_hash");
                assert_eq!(p.completed, 3);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        sender.send(Event::Pipeline(PipelineEvent::Failed {
            message: "nobody listening".to_string(),
        }));
    }

    #[test]
    fn iter_ends_when_senders_drop() {
        let (sender, receiver) = EventChannel::bounded(4);

        sender.send(Event::Stage(StageEvent::Started { stage: "combine" }));
        sender.send(Event::Stage(StageEvent::Completed {
            stage: "combine",
            emitted: 1,
        }));
        drop(sender);

        assert_eq!(receiver.iter().count(), 2);
        assert!(receiver.try_recv().is_none());
    }
}
