//! Crossbeam-backed event bus between the pipeline and whatever renders it.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::{Event, PipelineEvent, PipelinePhase};

/// Publishing half, cloned into hashing workers.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Publish an event. Dropped silently once nobody is listening.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }

    /// Announce the start of a pipeline phase
    pub fn phase(&self, phase: PipelinePhase) {
        self.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));
    }
}

pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Events until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Everything already queued, without blocking
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

pub struct EventChannel;

impl EventChannel {
    /// Unbounded: progress events are small and the renderer never applies backpressure.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender with no receiver; for runs nobody watches.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{HashEvent, HashProgress};
    use std::path::PathBuf;
    use std::thread;

    #[test]
    fn worker_progress_reaches_the_renderer() {
        let (sender, receiver) = EventChannel::new();

        let worker = sender.clone();
        thread::spawn(move || {
            worker.send(Event::Hash(HashEvent::Progress(HashProgress {
                completed: 3,
                total: 10,
                current_path: PathBuf::from("/photos/a.jpg"),
            })));
        })
        .join()
        .unwrap();
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::Hash(HashEvent::Progress(p)) if p.completed == 3));
    }

    #[test]
    fn phase_is_wrapped_as_pipeline_event() {
        let (sender, receiver) = EventChannel::new();
        sender.phase(PipelinePhase::Grouping);

        let events = receiver.drain();
        assert!(matches!(
            events.as_slice(),
            [Event::Pipeline(PipelineEvent::PhaseChanged {
                phase: PipelinePhase::Grouping
            })]
        ));
    }

    #[test]
    fn null_sender_swallows_events() {
        null_sender().phase(PipelinePhase::Scanning);
    }
}
