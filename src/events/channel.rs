//! crossbeam-backed event channel.
//!
//! The engine never holds a global sender: each run gets one through its
//! `RunContext`, and a dropped receiver just silences progress.

use super::Event;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Producer half, cloned into hashing workers
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    pub fn new(sender: Sender<Event>) -> Self {
        Self { inner: sender }
    }

    /// Deliver an event, or drop it if nobody is listening
    ///
    /// Blocks only when a bounded channel is full.
    pub fn send(&self, event: Event) {
        if self.inner.send(event).is_err() {
            tracing::trace!("event dropped, receiver is gone");
        }
    }

    /// Events sent but not yet received
    pub fn pending(&self) -> usize {
        self.inner.len()
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Consumer half, owned by a front end
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Wait for the next event; `None` once every sender is dropped
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Wait at most `timeout`, so a render loop can redraw in between
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError> {
        self.inner.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Blocking iterator that ends when the run drops its senders
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Everything queued right now, without waiting
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

/// Constructors for sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel; events are small and a run emits a few per file
    pub fn new() -> (EventSender, EventReceiver) {
        pair(crossbeam_channel::unbounded())
    }

    /// Bounded channel; hashing workers wait once `capacity` events queue up
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        pair(crossbeam_channel::bounded(capacity))
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        EventChannel
    }
}

fn pair((sender, receiver): (Sender<Event>, Receiver<Event>)) -> (EventSender, EventReceiver) {
    (EventSender::new(sender), EventReceiver { inner: receiver })
}

/// A sender whose receiver is already gone, for headless runs and tests
pub fn null_sender() -> EventSender {
    EventChannel::new().0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ExecuteEvent, PipelineEvent, ScanEvent, ScanProgress};
    use std::path::PathBuf;
    use std::thread;

    #[test]
    fn worker_threads_share_one_sender() {
        let (sender, receiver) = EventChannel::new();

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let sender = sender.clone();
                thread::spawn(move || {
                    sender.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                        directories_scanned: n,
                        files_found: n * 10,
                        current_path: PathBuf::from("/photos/2021"),
                    })));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        drop(sender);

        let mut found: Vec<usize> = receiver
            .iter()
            .filter_map(|e| match e {
                Event::Scan(ScanEvent::Progress(p)) => Some(p.files_found),
                _ => None,
            })
            .collect();
        found.sort();
        assert_eq!(found, vec![0, 10, 20, 30]);
    }

    #[test]
    fn sending_without_a_receiver_is_harmless() {
        let sender = null_sender();
        sender.send(Event::Pipeline(PipelineEvent::Cancelled));
        assert_eq!(sender.pending(), 0);
    }

    #[test]
    fn debug_shows_queue_depth() {
        let (sender, _receiver) = EventChannel::new();
        sender.send(Event::Pipeline(PipelineEvent::Started));
        assert!(format!("{:?}", sender).contains("pending: 1"));
    }

    #[test]
    fn drain_empties_the_queue() {
        let (sender, receiver) = EventChannel::bounded(4);
        sender.send(Event::Pipeline(PipelineEvent::Started));
        sender.send(Event::Execute(ExecuteEvent::Completed {
            committed: 1,
            failed: 0,
            skipped: 0,
        }));

        assert_eq!(receiver.drain().len(), 2);
        assert!(receiver.try_recv().is_none());
        assert!(matches!(
            receiver.recv_timeout(Duration::from_millis(1)),
            Err(RecvTimeoutError::Timeout)
        ));
    }
}
