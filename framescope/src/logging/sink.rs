use std::sync::Arc;

use crate::{
    Error, Event, Result,
    logging::{MAX_SINKS, SinkId},
};

/// Destination of the events drained by the logging thread.
///
/// `log` is always called on the logging thread, never on the thread that
/// produced the event. A slow sink delays the delivery to the sinks after it
/// but never blocks producers.
///
/// # Example
///
/// ```rust
/// use framescope::{Event, Sink};
///
/// struct FrameCounter(std::sync::atomic::AtomicU64);
///
/// impl Sink for FrameCounter {
///     fn log(&self, event: &Event) {
///         if let Event::Frame(_) = event {
///             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         }
///     }
/// }
/// ```
pub trait Sink: Send + Sync {
    fn log(&self, event: &Event);
}

/// Ordered, fixed-capacity list of installed sinks.
pub(crate) struct SinkTable {
    entries: [Option<(SinkId, Arc<dyn Sink>)>; MAX_SINKS],
    len: usize,
    next_id: SinkId,
}

impl SinkTable {
    pub fn new() -> Self {
        Self {
            entries: Default::default(),
            len: 0,
            next_id: 0,
        }
    }

    pub fn install(&mut self, sink: Arc<dyn Sink>) -> Result<SinkId> {
        if self.len == MAX_SINKS {
            tracing::warn!(capacity = MAX_SINKS, "can't install more sinks");
            return Err(Error::SinkCapacity(MAX_SINKS));
        }
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.entries[self.len] = Some((id, sink));
        self.len += 1;
        tracing::debug!(sink_id = id, "sink installed");
        Ok(id)
    }

    pub fn remove(&mut self, id: SinkId) -> Result<Arc<dyn Sink>> {
        let index = self.entries[..self.len]
            .iter()
            .position(|entry| matches!(entry, Some((entry_id, _)) if *entry_id == id))
            .ok_or(Error::UnknownSink(id))?;

        let removed = self.entries[index].take();
        self.entries[index..self.len].rotate_left(1);
        self.len -= 1;
        tracing::debug!(sink_id = id, "sink removed");

        removed.map(|(_, sink)| sink).ok_or(Error::UnknownSink(id))
    }

    pub fn clear(&mut self) -> Vec<Arc<dyn Sink>> {
        let removed = self.entries[..self.len]
            .iter_mut()
            .filter_map(|entry| entry.take().map(|(_, sink)| sink))
            .collect();
        self.len = 0;
        removed
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn entries(&self) -> impl Iterator<Item = (SinkId, &Arc<dyn Sink>)> {
        self.entries[..self.len]
            .iter()
            .filter_map(|entry| entry.as_ref().map(|(id, sink)| (*id, sink)))
    }

    pub fn sinks(&self) -> impl Iterator<Item = &Arc<dyn Sink>> {
        self.entries().map(|(_, sink)| sink)
    }
}
