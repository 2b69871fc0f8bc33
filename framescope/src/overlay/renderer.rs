use std::sync::Arc;

use crate::{
    Error, EventType, FrameEvent, ProcessEvent, Result,
    host::{FrameSize, HostInfo, TextSurface},
    overlay::{
        catalog::{KeywordContext, Metric},
        format::{format_duration, format_integer, format_str},
        template::{MAX_METRIC_WIDTH, ParsedTemplate},
    },
};

/// Text shown by metrics with no measure available.
const NOT_AVAILABLE: &[u8] = b"N/A";

/// Text block drawn on top of a window, showing live metrics.
///
/// The overlay lives on the window's render thread. Every method except
/// [`set_template`](Self::set_template) and
/// [`set_process_event`](Self::set_process_event) must be called with the
/// rendering context current.
pub struct Overlay {
    template: String,
    parsed: ParsedTemplate,
    surface: Box<dyn TextSurface>,
    host: Arc<HostInfo>,
    window_id: u32,
    position: (f32, f32),
    opacity: f32,
    process_event: ProcessEvent,
    frame_size: Option<FrameSize>,
    initialized: bool,
    text_dirty: bool,
    process_dirty: bool,
    scratch: [u8; MAX_METRIC_WIDTH],
}

/// Values the metrics of one render are computed from.
struct MetricSources<'a> {
    process: &'a ProcessEvent,
    frame: &'a FrameEvent,
    frame_size: FrameSize,
    window_id: u32,
}

impl Overlay {
    pub fn new(
        template: impl Into<String>,
        window_id: u32,
        surface: Box<dyn TextSurface>,
        host: Arc<HostInfo>,
    ) -> Self {
        Self {
            template: template.into(),
            parsed: ParsedTemplate::new(),
            surface,
            host,
            window_id,
            position: (5.0, 5.0),
            opacity: 0.85,
            process_event: ProcessEvent::default(),
            frame_size: None,
            initialized: false,
            text_dirty: true,
            process_dirty: true,
            scratch: [b' '; MAX_METRIC_WIDTH],
        }
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = (x, y);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Allocates the GPU resources of the text surface.
    pub fn initialize(&mut self) -> Result {
        debug_assert!(!self.initialized);
        if !self.surface.initialize() {
            return Err(Error::OverlayInitialization);
        }
        self.surface.set_opacity(self.opacity);
        self.initialized = true;
        self.text_dirty = true;
        self.frame_size = None;
        Ok(())
    }

    /// Releases the GPU resources. Does nothing if not initialized.
    pub fn finalize(&mut self) {
        if self.initialized {
            self.surface.finalize();
            self.initialized = false;
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Replaces the template. Parsed lazily at the next render.
    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = template.into();
        self.text_dirty = true;
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Stores the latest process sample. Its metrics are refreshed at the
    /// next render.
    pub fn set_process_event(&mut self, event: &ProcessEvent) {
        self.process_event = *event;
        self.process_dirty = true;
    }

    /// Updates the metrics that changed and draws the overlay.
    pub fn render(&mut self, frame: &FrameEvent, frame_size: FrameSize) {
        debug_assert!(self.initialized);
        if !self.initialized {
            return;
        }

        if self.text_dirty {
            let graphics = self.surface.graphics_info();
            let keywords = KeywordContext {
                host: &self.host,
                graphics: &graphics,
            };
            self.parsed.parse(self.template.as_bytes(), &keywords);
            self.surface.set_text(self.parsed.text());
            self.text_dirty = false;
            self.frame_size = None;
            self.process_dirty = true;
        }

        let process = self.process_event;
        let sources = MetricSources {
            process: &process,
            frame,
            frame_size,
            window_id: self.window_id,
        };

        if self.frame_size != Some(frame_size) {
            self.update_metrics(EventType::Window, &sources);
            self.surface.set_transform(frame_size, self.position);
            self.frame_size = Some(frame_size);
        }

        if self.process_dirty {
            self.update_metrics(EventType::Process, &sources);
            self.process_dirty = false;
        }

        self.update_metrics(EventType::Frame, &sources);
        self.surface.render();
    }

    fn update_metrics(&mut self, event_type: EventType, sources: &MetricSources<'_>) {
        for slot in self.parsed.slots(event_type) {
            let field = &mut self.scratch[..slot.width as usize];
            field.fill(b' ');
            write_metric(slot.metric, field, sources);
            self.surface.update_text(field, slot.offset as usize);
        }
    }
}

impl std::fmt::Debug for Overlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overlay")
            .field("window_id", &self.window_id)
            .field("initialized", &self.initialized)
            .field("frame_size", &self.frame_size)
            .field("parsed", &self.parsed)
            .finish()
    }
}

impl Drop for Overlay {
    fn drop(&mut self) {
        if self.initialized {
            tracing::warn!(window = self.window_id, "overlay dropped without finalize");
        }
    }
}

fn write_metric(metric: Metric, field: &mut [u8], sources: &MetricSources<'_>) {
    let process = sources.process;
    let frame = sources.frame;
    match metric {
        Metric::CpuUsage => {
            format_integer(u64::from(process.cpu_usage), field);
        }
        Metric::ThreadCount => {
            format_integer(u64::from(process.thread_count), field);
        }
        Metric::VszMemory => {
            format_integer(process.vsz_memory, field);
        }
        Metric::RssMemory => {
            format_integer(process.rss_memory, field);
        }
        Metric::WindowId => {
            format_integer(u64::from(sources.window_id), field);
        }
        Metric::WindowSize => write_frame_size(sources.frame_size, field),
        Metric::FrameNumber => {
            format_integer(u64::from(frame.frame_number), field);
        }
        Metric::DeltaTime => {
            format_duration(frame.delta_time, field);
        }
        Metric::SyncTime => {
            format_duration(frame.sync_time, field);
        }
        Metric::RenderTime => {
            format_duration(frame.render_time, field);
        }
        Metric::GpuTime => {
            if frame.gpu_time > 0 {
                format_duration(frame.gpu_time, field);
            } else {
                format_str(NOT_AVAILABLE, field);
            }
        }
        Metric::SwapTime => {
            format_duration(frame.swap_time, field);
        }
        Metric::TotalTime => {
            format_duration(frame.sync_time + frame.render_time + frame.gpu_time, field);
        }
    }
}

/// Writes `WIDTHxHEIGHT`, dropping the width then the separator when the
/// field is too narrow.
fn write_frame_size(size: FrameSize, field: &mut [u8]) {
    let remaining = format_integer(u64::from(size.height), field);
    if remaining >= 1 {
        field[remaining - 1] = b'x';
    }
    if remaining >= 2 {
        format_integer(u64::from(size.width), &mut field[..remaining - 1]);
    }
}
