use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Condvar, Mutex, PoisonError},
    thread::{self, JoinHandle},
};

use crate::{
    Event, Result,
    internal::lock,
    logging::{EventQueue, MAX_SINKS, Sink},
};

type SinkList = [Option<Arc<dyn Sink>>; MAX_SINKS];

struct State {
    queue: EventQueue,
    sinks: SinkList,
    /// The consumer is parked on the condition variable.
    waiting: bool,
    join_requested: bool,
}

struct Shared {
    state: Mutex<State>,
    wake: Condvar,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: Mutex::new(State {
                queue: EventQueue::new(),
                sinks: Default::default(),
                waiting: false,
                join_requested: false,
            }),
            wake: Condvar::new(),
        }
    }
}

struct Inner {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to the background thread delivering events to sinks.
///
/// Handles are cheap to clone. The thread stops when the last handle is
/// dropped, after every queued event has been delivered.
///
/// Producers never block on a full queue: [`push`](Self::push) yields the
/// calling thread and retries until a slot frees up.
#[derive(Clone)]
pub struct LoggingThread {
    inner: Arc<Inner>,
}

impl LoggingThread {
    /// Spawns the consumer thread.
    pub fn start() -> Result<Self> {
        let shared = Arc::new(Shared::new());

        let consumer = shared.clone();
        let handle = thread::Builder::new()
            .name("framescope-logging".into())
            .spawn(move || run(&consumer))?;

        Ok(Self {
            inner: Arc::new(Inner {
                shared,
                handle: Mutex::new(Some(handle)),
            }),
        })
    }

    /// Queues `event` for delivery, yielding while the queue is full.
    pub fn push(&self, event: impl Into<Event>) {
        let mut event = event.into();
        loop {
            let mut state = lock(&self.inner.shared.state);
            match state.queue.push(event) {
                Ok(()) => {
                    if state.waiting {
                        self.inner.shared.wake.notify_one();
                    }
                    return;
                }
                Err(rejected) => {
                    event = rejected;
                    drop(state);
                    thread::yield_now();
                }
            }
        }
    }

    /// Replaces the sinks. Events dequeued from now on go to the new list;
    /// sinks beyond the capacity are ignored.
    pub fn set_sinks<'a>(&self, sinks: impl IntoIterator<Item = &'a Arc<dyn Sink>>) {
        let mut list: SinkList = Default::default();
        for (slot, sink) in list.iter_mut().zip(sinks) {
            *slot = Some(sink.clone());
        }
        let previous = std::mem::replace(&mut lock(&self.inner.shared.state).sinks, list);
        drop(previous);
    }

    /// Waits until every queued event has been delivered, or the consumer
    /// thread is gone.
    pub fn flush(&self) {
        loop {
            {
                let state = lock(&self.inner.shared.state);
                if state.queue.is_empty() && state.waiting {
                    return;
                }
            }
            if lock(&self.inner.handle)
                .as_ref()
                .is_none_or(JoinHandle::is_finished)
            {
                return;
            }
            thread::yield_now();
        }
    }

    /// Number of live handles to this thread.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl fmt::Debug for LoggingThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner.shared.state);
        f.debug_struct("LoggingThread")
            .field("queued", &state.queue.len())
            .field("sinks", &state.sinks.iter().flatten().count())
            .field("handles", &self.handle_count())
            .finish()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        {
            let mut state = lock(&self.shared.state);
            state.join_requested = true;
            self.shared.wake.notify_one();
        }
        if let Some(handle) = lock(&self.handle).take() {
            if handle.join().is_err() {
                tracing::error!("logging thread panicked");
            }
        }
    }
}

fn run(shared: &Shared) {
    tracing::debug!("logging thread started");
    loop {
        let mut state = lock(&shared.state);
        let event = loop {
            if let Some(event) = state.queue.pop() {
                break event;
            }
            if state.join_requested {
                tracing::debug!("logging thread stopped");
                return;
            }
            state.waiting = true;
            state = shared
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            state.waiting = false;
        };
        let sinks = state.sinks.clone();
        drop(state);

        tracing::trace!(event_type = %event.event_type(), "delivering event");
        for (index, sink) in sinks.iter().enumerate() {
            let Some(sink) = sink else { continue };
            let result = catch_unwind(AssertUnwindSafe(|| sink.log(&event)));
            if result.is_err() {
                tracing::error!(sink_index = index, "sink panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GenericEvent, logging::EVENT_QUEUE_CAPACITY, testing::RecordingSink};

    fn generic_ids(sink: &RecordingSink) -> Vec<u32> {
        sink.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Generic(e) => Some(e.id),
                _ => None,
            })
            .collect()
    }

    fn started_with(sink: &RecordingSink) -> LoggingThread {
        let thread = LoggingThread::start().unwrap();
        let sink: Arc<dyn Sink> = Arc::new(sink.clone());
        thread.set_sinks([&sink]);
        thread
    }

    #[test]
    fn no_event_lost_on_shutdown() {
        let sink = RecordingSink::new();
        let thread = started_with(&sink);
        let count = 10 * EVENT_QUEUE_CAPACITY as u32 + 3;
        for id in 0..count {
            thread.push(GenericEvent::new(id, b"x"));
        }
        drop(thread);
        assert_eq!(generic_ids(&sink), (0..count).collect::<Vec<_>>());
    }

    #[test]
    fn events_keep_per_producer_order() {
        const PRODUCERS: u32 = 4;
        const PER_PRODUCER: u32 = 200;

        let sink = RecordingSink::new();
        let thread = started_with(&sink);
        let producers: Vec<_> = (0..PRODUCERS)
            .map(|producer| {
                let thread = thread.clone();
                std::thread::spawn(move || {
                    for sequence in 0..PER_PRODUCER {
                        thread.push(GenericEvent::new(producer * 1000 + sequence, b""));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        drop(thread);

        let ids = generic_ids(&sink);
        assert_eq!(ids.len(), (PRODUCERS * PER_PRODUCER) as usize);
        for producer in 0..PRODUCERS {
            let sequence: Vec<_> = ids
                .iter()
                .filter(|id| *id / 1000 == producer)
                .map(|id| id % 1000)
                .collect();
            assert_eq!(sequence, (0..PER_PRODUCER).collect::<Vec<_>>());
        }
    }

    #[test]
    fn every_sink_sees_the_same_order() {
        let first = RecordingSink::new();
        let second = RecordingSink::new();
        let thread = LoggingThread::start().unwrap();
        let sinks: [Arc<dyn Sink>; 2] = [Arc::new(first.clone()), Arc::new(second.clone())];
        thread.set_sinks(&sinks);
        for id in 0..50 {
            thread.push(GenericEvent::new(id, b""));
        }
        drop(thread);
        assert_eq!(generic_ids(&first), generic_ids(&second));
        assert_eq!(generic_ids(&first).len(), 50);
    }

    #[test]
    fn sinks_can_be_replaced() {
        let before = RecordingSink::new();
        let after = RecordingSink::new();
        let thread = started_with(&before);
        thread.push(GenericEvent::new(1, b""));
        thread.flush();

        let sink: Arc<dyn Sink> = Arc::new(after.clone());
        thread.set_sinks([&sink]);
        thread.push(GenericEvent::new(2, b""));
        drop(thread);

        assert_eq!(generic_ids(&before), [1]);
        assert_eq!(generic_ids(&after), [2]);
    }

    #[test]
    fn panicking_sink_does_not_stop_delivery() {
        struct Panicking;
        impl Sink for Panicking {
            fn log(&self, _event: &Event) {
                panic!("sink failure");
            }
        }

        let sink = RecordingSink::new();
        let thread = LoggingThread::start().unwrap();
        let sinks: [Arc<dyn Sink>; 2] = [Arc::new(Panicking), Arc::new(sink.clone())];
        thread.set_sinks(&sinks);
        thread.push(GenericEvent::new(1, b""));
        thread.push(GenericEvent::new(2, b""));
        drop(thread);

        assert_eq!(generic_ids(&sink), [1, 2]);
    }

    #[test]
    fn flush_returns_when_the_consumer_is_gone() {
        let consumer = thread::spawn(|| {});
        while !consumer.is_finished() {
            thread::yield_now();
        }
        let thread = LoggingThread {
            inner: Arc::new(Inner {
                shared: Arc::new(Shared::new()),
                handle: Mutex::new(Some(consumer)),
            }),
        };
        thread.push(GenericEvent::new(1, b""));
        thread.flush();
    }

    #[test]
    fn last_handle_stops_the_thread() {
        let sink = RecordingSink::new();
        let thread = started_with(&sink);
        let other = thread.clone();
        assert_eq!(thread.handle_count(), 2);

        drop(thread);
        other.push(GenericEvent::new(7, b""));
        other.flush();
        assert_eq!(generic_ids(&sink), [7]);
        drop(other);
    }
}
