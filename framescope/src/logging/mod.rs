//! Event delivery to sinks.
//!
//! Producers on any thread [`push`](LoggingThread::push) events into a
//! bounded FIFO queue. A single background thread drains it and hands every
//! event to each installed [`Sink`], in order.

mod queue;
mod sink;
mod thread;

/// Identifier of an installed sink.
pub type SinkId = u16;

/// Number of events the queue holds before producers start yielding.
pub const EVENT_QUEUE_CAPACITY: usize = 16;

/// Maximum number of installed sinks.
pub const MAX_SINKS: usize = 8;

pub(crate) use queue::EventQueue;
pub use sink::Sink;
pub(crate) use sink::SinkTable;
pub use thread::LoggingThread;
