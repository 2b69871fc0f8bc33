use std::{
    collections::VecDeque,
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{
    host::{
        FrameSize, GpuTimer, Host, HostWindow, PipelineListener, RenderJob, TextSurface,
        same_listener,
    },
    internal::lock,
    testing::{ManualGpuTimer, RecordingSurface},
};

struct WindowState {
    size: FrameSize,
    visible: bool,
    listener: Option<Arc<dyn PipelineListener>>,
    jobs: VecDeque<RenderJob>,
    update_requests: usize,
}

/// A window rendering on the calling thread, frame by frame, or on a
/// render thread of its own.
///
/// [`render_frame`](Self::render_frame) runs the pending render jobs, then
/// delivers the pipeline callbacks of one frame to the attached listener.
/// [`spawn_render_loop`](Self::spawn_render_loop) does the same
/// continuously on a dedicated thread.
pub struct HeadlessWindow {
    state: Mutex<WindowState>,
    surface: RecordingSurface,
    gpu_timer: ManualGpuTimer,
}

impl HeadlessWindow {
    /// A visible window with a 1 ms GPU timer.
    pub fn new(width: u32, height: u32) -> Arc<Self> {
        Self::with_gpu_timer(width, height, ManualGpuTimer::new(1_000_000))
    }

    pub fn with_gpu_timer(width: u32, height: u32, gpu_timer: ManualGpuTimer) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(WindowState {
                size: FrameSize::new(width, height),
                visible: true,
                listener: None,
                jobs: VecDeque::new(),
                update_requests: 0,
            }),
            surface: RecordingSurface::new(),
            gpu_timer,
        })
    }

    /// Surface shared with the overlays created for this window.
    pub fn surface(&self) -> &RecordingSurface {
        &self.surface
    }

    /// Timer shared with the monitors created for this window.
    pub fn gpu_timer(&self) -> &ManualGpuTimer {
        &self.gpu_timer
    }

    pub fn resize(&self, width: u32, height: u32) {
        lock(&self.state).size = FrameSize::new(width, height);
    }

    pub fn set_visible(&self, visible: bool) {
        lock(&self.state).visible = visible;
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.state).listener.is_some()
    }

    /// Number of times a redraw was requested.
    pub fn update_requests(&self) -> usize {
        lock(&self.state).update_requests
    }

    pub fn pending_jobs(&self) -> usize {
        lock(&self.state).jobs.len()
    }

    /// Runs the scheduled render jobs, including the ones they schedule.
    pub fn run_jobs(&self) {
        loop {
            let Some(job) = lock(&self.state).jobs.pop_front() else {
                return;
            };
            job();
        }
    }

    /// Runs the pending jobs then renders one frame.
    pub fn render_frame(&self) {
        self.run_jobs();
        self.notify(|l| l.before_synchronizing());
        self.notify(|l| l.after_synchronizing());
        self.notify(|l| l.before_rendering());
        self.notify(|l| l.after_rendering());
        self.notify(|l| l.frame_swapped());
    }

    pub fn initialize_scene_graph(&self) {
        self.notify(|l| l.scene_graph_initialized());
    }

    pub fn invalidate_scene_graph(&self) {
        self.notify(|l| l.scene_graph_invalidated());
    }

    /// Stops the scene graph, as when the window is closed.
    pub fn stop_scene_graph(&self) {
        self.notify(|l| l.scene_graph_about_to_stop());
    }

    /// Renders frames on a new thread every `frame_interval` until the
    /// returned loop is dropped.
    ///
    /// Pair with [`HeadlessHost::threaded`], which leaves the render jobs to
    /// this thread.
    pub fn spawn_render_loop(self: &Arc<Self>, frame_interval: Duration) -> RenderLoop {
        let running = Arc::new(AtomicBool::new(true));
        let frames = Arc::new(AtomicUsize::new(0));
        let handle = {
            let window = self.clone();
            let running = running.clone();
            let frames = frames.clone();
            thread::spawn(move || {
                while running.load(Ordering::Acquire) {
                    window.render_frame();
                    frames.fetch_add(1, Ordering::Release);
                    thread::sleep(frame_interval);
                }
                window.run_jobs();
            })
        };
        RenderLoop {
            running,
            frames,
            handle: Some(handle),
        }
    }

    fn notify(&self, callback: impl FnOnce(&dyn PipelineListener)) {
        let listener = lock(&self.state).listener.clone();
        if let Some(listener) = listener {
            callback(listener.as_ref());
        }
    }
}

impl HostWindow for HeadlessWindow {
    fn size(&self) -> FrameSize {
        lock(&self.state).size
    }

    fn is_visible(&self) -> bool {
        lock(&self.state).visible
    }

    fn request_update(&self) {
        lock(&self.state).update_requests += 1;
    }

    fn schedule_render_job(&self, job: RenderJob) {
        let mut state = lock(&self.state);
        state.jobs.push_back(job);
        state.update_requests += 1;
    }

    fn attach(&self, listener: Arc<dyn PipelineListener>) {
        lock(&self.state).listener = Some(listener);
    }

    fn detach(&self, listener: &dyn PipelineListener) {
        let mut state = lock(&self.state);
        let attached = state
            .listener
            .as_ref()
            .is_some_and(|current| same_listener(&**current, listener));
        let detached = if attached { state.listener.take() } else { None };
        drop(state);
        drop(detached);
    }

    fn create_text_surface(&self) -> Box<dyn TextSurface> {
        Box::new(self.surface.clone())
    }

    fn create_gpu_timer(&self) -> Box<dyn GpuTimer> {
        Box::new(self.gpu_timer.clone())
    }
}

impl fmt::Debug for HeadlessWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("HeadlessWindow")
            .field("size", &state.size)
            .field("visible", &state.visible)
            .field("attached", &state.listener.is_some())
            .field("jobs", &state.jobs.len())
            .finish()
    }
}

/// Render thread of a [`HeadlessWindow`], stopped and joined on drop.
#[derive(Debug)]
pub struct RenderLoop {
    running: Arc<AtomicBool>,
    frames: Arc<AtomicUsize>,
    handle: Option<JoinHandle<()>>,
}

impl RenderLoop {
    /// Frames rendered so far.
    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::Acquire)
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// A host owning headless windows.
///
/// By default processing events runs the render jobs of every window, as
/// when windows render on the main thread.
#[derive(Debug)]
pub struct HeadlessHost {
    windows: Mutex<Vec<Arc<HeadlessWindow>>>,
    runs_jobs: bool,
}

impl HeadlessHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            windows: Mutex::new(Vec::new()),
            runs_jobs: true,
        })
    }

    /// A host whose windows render on their own threads: processing events
    /// leaves the render jobs alone.
    pub fn threaded() -> Arc<Self> {
        Arc::new(Self {
            windows: Mutex::new(Vec::new()),
            runs_jobs: false,
        })
    }

    /// Creates a visible window.
    pub fn add_window(&self, width: u32, height: u32) -> Arc<HeadlessWindow> {
        self.add(HeadlessWindow::new(width, height))
    }

    pub fn add(&self, window: Arc<HeadlessWindow>) -> Arc<HeadlessWindow> {
        lock(&self.windows).push(window.clone());
        window
    }
}

impl Host for HeadlessHost {
    fn windows(&self) -> Vec<Arc<dyn HostWindow>> {
        lock(&self.windows)
            .iter()
            .map(|window| window.clone() as Arc<dyn HostWindow>)
            .collect()
    }

    fn process_events(&self) {
        if !self.runs_jobs {
            return;
        }
        let windows = lock(&self.windows).clone();
        for window in windows {
            window.run_jobs();
        }
    }

    fn engine_version(&self) -> String {
        concat!("framescope ", env!("CARGO_PKG_VERSION")).to_string()
    }

    fn platform_name(&self) -> String {
        "headless".to_string()
    }
}
