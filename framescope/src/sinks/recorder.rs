use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::Mutex,
};

use crate::{Event, Result, Sink, internal::lock};

/// A sink that records events to a file in JSON Lines format.
///
/// Each event is written as a JSON object on its own line, tagged with its
/// type, making the output easy to parse and stream. Events are flushed
/// immediately for reliability (not optimized for high-throughput).
///
/// ```text
/// {"type":"window","timestamp":5120,"window_id":1,"width":800,"height":600,"state":"shown"}
/// {"type":"generic","timestamp":9311,"id":0,"string":"UserInterfaceReady"}
/// ```
///
/// # Example
///
/// ```ignore
/// let recorder = Recorder::new("metrics.jsonl")?;
/// monitor.install_sink(Arc::new(recorder))?;
/// ```
#[derive(Debug)]
pub struct Recorder {
    writer: Mutex<BufWriter<File>>,
}

impl Recorder {
    /// Create a new recorder that writes to the specified path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoError`](crate::Error::IoError) if the file cannot
    /// be created.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl Sink for Recorder {
    fn log(&self, event: &Event) {
        let mut writer = lock(&self.writer);
        if let Err(e) = serde_json::to_writer(&mut *writer, event) {
            tracing::warn!("Recorder failed to serialize event: {}", e);
        }
        let _ = writer.write_all(b"\n");
        let _ = writer.flush();
    }
}
