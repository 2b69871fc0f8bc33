//! Boundary with the host application.
//!
//! The host owns the windows and their render pipelines. framescope only
//! sees them through the traits below: a [`Host`] enumerating windows and
//! pumping its event loop, a [`HostWindow`] per window delivering
//! [`PipelineListener`] callbacks on its render thread, and the GPU-bound
//! capabilities ([`TextSurface`], [`GpuTimer`]) created by the window.

use std::sync::Arc;

/// Size of a rendered frame in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One-shot job executed on a window's render thread before its next
/// synchronization stage.
pub type RenderJob = Box<dyn FnOnce() + Send + 'static>;

/// Render-pipeline callbacks, invoked by the host on the thread owning the
/// window's rendering context.
///
/// Per frame the host calls `before_synchronizing`, `after_synchronizing`,
/// `before_rendering`, `after_rendering` and `frame_swapped` in that order.
/// The scene graph lifecycle callbacks can be interspersed at any point.
/// All methods default to no-ops.
pub trait PipelineListener: Send + Sync {
    fn scene_graph_initialized(&self) {}

    fn scene_graph_invalidated(&self) {}

    fn before_synchronizing(&self) {}

    fn after_synchronizing(&self) {}

    fn before_rendering(&self) {}

    fn after_rendering(&self) {}

    fn frame_swapped(&self) {}

    /// Last callback ever delivered for this scene graph.
    fn scene_graph_about_to_stop(&self) {}
}

/// Description of the current rendering context, used to resolve the
/// `%glVersion` and `%gpuModel` overlay keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphicsInfo {
    /// `true` for desktop OpenGL, `false` for OpenGL ES and other APIs.
    pub desktop_gl: bool,
    pub version: String,
    pub vendor: String,
    pub renderer: String,
}

/// Opaque glyph-drawing capability used by the overlay.
///
/// Every method is called on the render thread, with the context that was
/// current at [`initialize`](Self::initialize).
pub trait TextSurface: Send {
    /// Allocates GPU resources. Returns `false` on failure.
    fn initialize(&mut self) -> bool;

    fn finalize(&mut self);

    /// Replaces the whole text. Lines are separated by `\n` or `\r`.
    fn set_text(&mut self, text: &[u8]);

    /// Overwrites `text.len()` bytes of the current text at `offset`.
    fn update_text(&mut self, text: &[u8], offset: usize);

    fn set_transform(&mut self, frame_size: FrameSize, position: (f32, f32));

    fn set_opacity(&mut self, opacity: f32);

    fn render(&mut self);

    fn graphics_info(&self) -> GraphicsInfo;
}

/// GPU timer query. Returns 0 from [`stop`](Self::stop) when no measure is
/// available.
pub trait GpuTimer: Send {
    fn initialize(&mut self) -> bool;

    fn finalize(&mut self);

    fn start(&mut self);

    /// Elapsed GPU time in nanoseconds since the last `start`.
    fn stop(&mut self) -> u64;
}

/// A window of the host application.
pub trait HostWindow: Send + Sync {
    fn size(&self) -> FrameSize;

    fn is_visible(&self) -> bool;

    /// Asks the render loop to produce a new frame.
    fn request_update(&self);

    /// Queues a job on the window's render thread. Also wakes up the render
    /// loop so that the job runs even if nothing else changes.
    fn schedule_render_job(&self, job: RenderJob);

    /// Starts delivering pipeline callbacks to `listener`.
    fn attach(&self, listener: Arc<dyn PipelineListener>);

    /// Stops delivering pipeline callbacks to `listener`. Does nothing if
    /// another listener is attached. Must not block when called from a
    /// callback.
    fn detach(&self, listener: &dyn PipelineListener);

    fn create_text_surface(&self) -> Box<dyn TextSurface>;

    fn create_gpu_timer(&self) -> Box<dyn GpuTimer>;
}

/// The host application.
pub trait Host: Send + Sync {
    /// All the windows currently known to the host, visible or not.
    fn windows(&self) -> Vec<Arc<dyn HostWindow>>;

    /// Processes pending events of the host event loop once, without waiting.
    fn process_events(&self);

    /// Name and version of the rendering engine, e.g. `Acme 5.12`.
    fn engine_version(&self) -> String;

    /// Name of the windowing platform, e.g. `wayland`.
    fn platform_name(&self) -> String;
}

/// Host strings resolved once at application monitor construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostInfo {
    pub engine_version: String,
    pub platform_name: String,
}

impl HostInfo {
    pub fn from_host(host: &dyn Host) -> Self {
        Self {
            engine_version: host.engine_version(),
            platform_name: host.platform_name(),
        }
    }
}

/// Returns `true` if both references point to the same listener.
pub fn same_listener(a: &dyn PipelineListener, b: &dyn PipelineListener) -> bool {
    std::ptr::addr_eq(a, b)
}

/// Returns `true` if both handles point to the same window.
pub(crate) fn same_window(a: &Arc<dyn HostWindow>, b: &Arc<dyn HostWindow>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
