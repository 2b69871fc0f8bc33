use crate::{Event, logging::EVENT_QUEUE_CAPACITY};

/// Fixed-capacity FIFO ring of events.
pub(crate) struct EventQueue {
    events: [Option<Event>; EVENT_QUEUE_CAPACITY],
    head: usize,
    len: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            events: [None; EVENT_QUEUE_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    /// Appends `event`, handing it back if the queue is full.
    pub fn push(&mut self, event: Event) -> Result<(), Event> {
        if self.is_full() {
            return Err(event);
        }
        let tail = (self.head + self.len) % EVENT_QUEUE_CAPACITY;
        self.events[tail] = Some(event);
        self.len += 1;
        Ok(())
    }

    /// Removes the oldest event.
    pub fn pop(&mut self) -> Option<Event> {
        if self.len == 0 {
            return None;
        }
        let event = self.events[self.head].take();
        self.head = (self.head + 1) % EVENT_QUEUE_CAPACITY;
        self.len -= 1;
        event
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == EVENT_QUEUE_CAPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GenericEvent;

    fn event(id: u32) -> Event {
        GenericEvent::new(id, b"").into()
    }

    fn id(event: Event) -> u32 {
        match event {
            Event::Generic(e) => e.id,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fifo_across_wrap_around() {
        let mut queue = EventQueue::new();
        let mut next = 0;
        let mut expected = 0;
        for _ in 0..5 {
            while queue.push(event(next)).is_ok() {
                next += 1;
            }
            for _ in 0..EVENT_QUEUE_CAPACITY / 2 + 1 {
                assert_eq!(queue.pop().map(id), Some(expected));
                expected += 1;
            }
        }
        while let Some(e) = queue.pop() {
            assert_eq!(id(e), expected);
            expected += 1;
        }
        assert_eq!(expected, next);
    }

    #[test]
    fn full_queue_rejects() {
        let mut queue = EventQueue::new();
        for i in 0..EVENT_QUEUE_CAPACITY as u32 {
            queue.push(event(i)).unwrap();
        }
        assert!(queue.is_full());
        assert_eq!(queue.len(), EVENT_QUEUE_CAPACITY);
        let rejected = queue.push(event(99)).unwrap_err();
        assert_eq!(id(rejected), 99);
    }

    #[test]
    fn empty_queue_pops_nothing() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }
}
