use std::{
    fmt,
    sync::{
        Arc, Mutex, PoisonError, Weak,
        atomic::{AtomicU32, Ordering},
    },
    time::Instant,
};

use crate::{
    EventType, FrameEvent, LoggingThread, MonitorConfig, ProcessEvent, WindowEvent, WindowState,
    event::timestamp,
    host::{FrameSize, GpuTimer, HostInfo, HostWindow, PipelineListener},
    internal::lock,
    monitor::{MonitorFlags, MonitorRegistry},
    overlay::Overlay,
};

/// State touched only from the window's render thread.
struct RenderState {
    gpu_resources_initialized: bool,
    gpu_timer_available: bool,
    gpu_timer: Box<dyn GpuTimer>,
    frame_size: FrameSize,
    frame_event: FrameEvent,
    /// Start of the pipeline stage being timed.
    stage_start: Instant,
    last_swap: Option<Instant>,
}

/// Per-window state machine driven by the render pipeline callbacks.
///
/// GPU resources (overlay surface, GPU timer) are created lazily on the
/// render thread and released there, either when the scene graph is
/// invalidated or stopped, or by a teardown job scheduled on the window.
pub(crate) struct WindowMonitor {
    id: u32,
    window: Arc<dyn HostWindow>,
    registry: Weak<MonitorRegistry>,
    logging_thread: LoggingThread,
    flags: AtomicU32,
    gpu_timer_enabled: bool,
    /// Also written by the application monitor thread.
    overlay: Mutex<Overlay>,
    render: Mutex<RenderState>,
}

impl WindowMonitor {
    pub fn new(
        id: u32,
        window: Arc<dyn HostWindow>,
        registry: Weak<MonitorRegistry>,
        logging_thread: LoggingThread,
        flags: MonitorFlags,
        config: &MonitorConfig,
        host_info: Arc<HostInfo>,
    ) -> Arc<Self> {
        let frame_size = window.size();
        let (x, y) = config.overlay_position();
        let surface = window.create_text_surface();
        let overlay = Overlay::new(config.overlay_text(), id, surface, host_info)
            .with_position(x, y)
            .with_opacity(config.overlay_opacity());
        let gpu_timer = window.create_gpu_timer();

        let monitor = Arc::new(Self {
            id,
            window,
            registry,
            logging_thread,
            flags: AtomicU32::new(flags.to_bits()),
            gpu_timer_enabled: config.gpu_timer(),
            overlay: Mutex::new(overlay),
            render: Mutex::new(RenderState {
                gpu_resources_initialized: false,
                gpu_timer_available: false,
                gpu_timer,
                frame_size,
                frame_event: FrameEvent::new(id),
                stage_start: Instant::now(),
                last_swap: None,
            }),
        });

        if flags.logs(EventType::Window) {
            monitor.push_window_event(frame_size, WindowState::Shown);
        }
        tracing::debug!(
            window_id = id,
            width = frame_size.width,
            height = frame_size.height,
            "window monitor created"
        );
        monitor
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn window(&self) -> &Arc<dyn HostWindow> {
        &self.window
    }

    pub fn flags(&self) -> MonitorFlags {
        MonitorFlags::from_bits(self.flags.load(Ordering::Acquire))
    }

    pub fn set_flags(&self, flags: MonitorFlags) {
        self.flags.store(flags.to_bits(), Ordering::Release);
    }

    pub fn gpu_resources_initialized(&self) -> bool {
        lock(&self.render).gpu_resources_initialized
    }

    /// Hands a new process sample to the overlay and asks for a redraw.
    pub fn set_process_event(&self, event: &ProcessEvent) {
        if self.flags().overlay {
            lock(&self.overlay).set_process_event(event);
            self.window.request_update();
        }
    }

    pub fn set_overlay_text(&self, text: &str) {
        lock(&self.overlay).set_template(text);
        if self.flags().overlay {
            self.window.request_update();
        }
    }

    /// Releases GPU resources and stops receiving callbacks. Must run on the
    /// render thread.
    pub fn teardown(&self) {
        {
            let mut render = lock(&self.render);
            if render.gpu_resources_initialized {
                self.finalize_gpu_resources(&mut render);
            }
        }
        self.window.detach(self);
    }

    fn initialize_gpu_resources(&self, render: &mut RenderState) {
        debug_assert!(!render.gpu_resources_initialized);

        if let Err(e) = lock(&self.overlay).initialize() {
            tracing::warn!(window_id = self.id, error = %e, "overlay disabled");
        }
        render.gpu_timer_available = self.gpu_timer_enabled && render.gpu_timer.initialize();
        render.frame_event.frame_number = 0;
        render.gpu_resources_initialized = true;
        tracing::debug!(
            window_id = self.id,
            gpu_timer = render.gpu_timer_available,
            "GPU resources initialized"
        );
    }

    fn finalize_gpu_resources(&self, render: &mut RenderState) {
        debug_assert!(render.gpu_resources_initialized);

        if render.gpu_timer_available {
            render.gpu_timer.finalize();
        }
        lock(&self.overlay).finalize();
        render.frame_event.frame_number = 0;
        render.gpu_resources_initialized = false;
        render.gpu_timer_available = false;
        tracing::debug!(window_id = self.id, "GPU resources finalized");
    }

    fn push_window_event(&self, size: FrameSize, state: WindowState) {
        self.logging_thread.push(WindowEvent {
            timestamp: timestamp(),
            window_id: self.id,
            width: size.width,
            height: size.height,
            state,
        });
    }
}

impl PipelineListener for WindowMonitor {
    fn scene_graph_initialized(&self) {
        let mut render = lock(&self.render);
        if !render.gpu_resources_initialized {
            self.initialize_gpu_resources(&mut render);
        }
    }

    fn scene_graph_invalidated(&self) {
        let mut render = lock(&self.render);
        if render.gpu_resources_initialized {
            self.finalize_gpu_resources(&mut render);
        }
    }

    fn before_synchronizing(&self) {
        let mut render = lock(&self.render);
        if render.gpu_resources_initialized {
            render.stage_start = Instant::now();
        }
    }

    fn after_synchronizing(&self) {
        let mut render = lock(&self.render);
        if render.gpu_resources_initialized {
            render.frame_event.sync_time = elapsed_ns(render.stage_start);
        }
    }

    fn before_rendering(&self) {
        let mut render = lock(&self.render);
        let frame_size = self.window.size();
        if frame_size != render.frame_size {
            render.frame_size = frame_size;
            if self.flags().logs(EventType::Window) {
                self.push_window_event(frame_size, WindowState::Resized);
            }
        }

        if render.gpu_resources_initialized {
            render.stage_start = Instant::now();
            if render.gpu_timer_available {
                render.gpu_timer.start();
            }
        }
    }

    fn after_rendering(&self) {
        let mut render = lock(&self.render);
        if !render.gpu_resources_initialized {
            return;
        }

        render.frame_event.render_time = elapsed_ns(render.stage_start);
        render.frame_event.gpu_time = if render.gpu_timer_available {
            render.gpu_timer.stop()
        } else {
            0
        };
        render.frame_event.frame_number = render.frame_event.frame_number.wrapping_add(1);

        if self.flags().overlay {
            let mut overlay = lock(&self.overlay);
            if overlay.is_initialized() {
                overlay.render(&render.frame_event, render.frame_size);
            }
        }
        render.stage_start = Instant::now();
    }

    fn frame_swapped(&self) {
        let mut render = lock(&self.render);
        if render.gpu_resources_initialized {
            let now = Instant::now();
            render.frame_event.delta_time = render
                .last_swap
                .map_or(0, |last| now.duration_since(last).as_nanos() as u64);
            render.last_swap = Some(now);

            if self.flags().logs(EventType::Frame) {
                render.frame_event.swap_time = elapsed_ns(render.stage_start);
                render.frame_event.timestamp = timestamp();
                self.logging_thread.push(render.frame_event);
            }
        } else {
            // First frame: get ready for the next one.
            self.initialize_gpu_resources(&mut render);
            if self.flags().overlay {
                self.window.request_update();
            }
        }
    }

    fn scene_graph_about_to_stop(&self) {
        // Unregistered last: `stop` returns once the registry is empty.
        self.teardown();
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self);
        }
    }
}

impl Drop for WindowMonitor {
    fn drop(&mut self) {
        let render = self.render.get_mut().unwrap_or_else(PoisonError::into_inner);
        if render.gpu_resources_initialized {
            tracing::warn!(
                window_id = self.id,
                "window monitor dropped with live GPU resources"
            );
        }
        let frame_size = render.frame_size;
        if self.flags().logs(EventType::Window) {
            self.push_window_event(frame_size, WindowState::Hidden);
        }
        tracing::debug!(window_id = self.id, "window monitor destroyed");
    }
}

impl fmt::Debug for WindowMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowMonitor")
            .field("id", &self.id)
            .field("flags", &self.flags())
            .finish_non_exhaustive()
    }
}

fn elapsed_ns(since: Instant) -> u64 {
    since.elapsed().as_nanos() as u64
}
