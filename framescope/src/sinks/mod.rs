//! Ready-to-use sink implementations.
//!
//! # Available Sinks
//!
//! - [`TracingSink`] - Forwards events to the `tracing` crate
//! - [`FileSink`] - Writes one text line per event to a file or stdout
//! - [`Recorder`] - Records events to a JSON Lines file (requires `recorder` feature)
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use framescope::sinks::{FileSink, TracingSink};
//!
//! let tracing_sink = Arc::new(TracingSink);
//! let stdout_sink = Arc::new(FileSink::stdout(false));
//! # let _ = (tracing_sink, stdout_sink);
//! ```

mod file;
pub use file::FileSink;

mod tracing_sink;
pub use tracing_sink::TracingSink;

#[cfg(feature = "recorder")]
mod recorder;

#[cfg(feature = "recorder")]
#[cfg_attr(docsrs, doc(cfg(feature = "recorder")))]
pub use recorder::Recorder;
