use crate::{Event, Sink};

/// A sink that logs every event to the `tracing` crate at `debug` level.
///
/// Provides visibility into the metrics without custom code. Events are
/// emitted under the `framescope::sinks` target, so they can be enabled
/// separately, e.g. `RUST_LOG=framescope::sinks=debug`.
///
/// # Example
///
/// ```ignore
/// monitor.install_sink(Arc::new(TracingSink))?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn log(&self, event: &Event) {
        match event {
            Event::Process(e) => tracing::debug!(
                timestamp = e.timestamp,
                cpu_usage = e.cpu_usage,
                thread_count = e.thread_count,
                vsz_memory = e.vsz_memory,
                rss_memory = e.rss_memory,
                "process"
            ),
            Event::Window(e) => tracing::debug!(
                timestamp = e.timestamp,
                window_id = e.window_id,
                width = e.width,
                height = e.height,
                state = %e.state,
                "window"
            ),
            Event::Frame(e) => tracing::debug!(
                timestamp = e.timestamp,
                window_id = e.window_id,
                frame_number = e.frame_number,
                delta_time = e.delta_time,
                sync_time = e.sync_time,
                render_time = e.render_time,
                gpu_time = e.gpu_time,
                swap_time = e.swap_time,
                "frame"
            ),
            Event::Generic(e) => tracing::debug!(
                timestamp = e.timestamp,
                id = e.id,
                string = %e.string(),
                "generic"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameEvent, GenericEvent};

    #[test]
    fn logs_without_subscriber() {
        TracingSink.log(&FrameEvent::new(1).into());
        TracingSink.log(&GenericEvent::new(3, b"ready").into());
    }
}
