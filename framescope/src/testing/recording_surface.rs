use std::sync::{Arc, Mutex};

use crate::{
    host::{FrameSize, GraphicsInfo, TextSurface},
    internal::lock,
};

#[derive(Debug)]
struct SurfaceState {
    text: Vec<u8>,
    initialized: bool,
    fails: bool,
    transform: Option<(FrameSize, (f32, f32))>,
    opacity: f32,
    render_count: usize,
    graphics: GraphicsInfo,
}

/// A text surface mirroring the overlay text in memory.
///
/// Clones share the same state: the window hands one clone to the overlay
/// while the test inspects another.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::with_graphics(GraphicsInfo {
            desktop_gl: true,
            version: "3.3".into(),
            vendor: "framescope".into(),
            renderer: "headless".into(),
        })
    }

    pub fn with_graphics(graphics: GraphicsInfo) -> Self {
        Self {
            state: Arc::new(Mutex::new(SurfaceState {
                text: Vec::new(),
                initialized: false,
                fails: false,
                transform: None,
                opacity: 1.0,
                render_count: 0,
                graphics,
            })),
        }
    }

    /// A surface whose initialization always fails.
    pub fn failing() -> Self {
        let surface = Self::new();
        lock(&surface.state).fails = true;
        surface
    }

    /// Current text, invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&lock(&self.state).text).into_owned()
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.state).initialized
    }

    pub fn render_count(&self) -> usize {
        lock(&self.state).render_count
    }

    pub fn transform(&self) -> Option<(FrameSize, (f32, f32))> {
        lock(&self.state).transform
    }

    pub fn opacity(&self) -> f32 {
        lock(&self.state).opacity
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSurface for RecordingSurface {
    fn initialize(&mut self) -> bool {
        let mut state = lock(&self.state);
        state.initialized = !state.fails;
        state.initialized
    }

    fn finalize(&mut self) {
        lock(&self.state).initialized = false;
    }

    fn set_text(&mut self, text: &[u8]) {
        let mut state = lock(&self.state);
        state.text.clear();
        state.text.extend_from_slice(text);
    }

    fn update_text(&mut self, text: &[u8], offset: usize) {
        let mut state = lock(&self.state);
        let end = (offset + text.len()).min(state.text.len());
        if offset < end {
            state.text[offset..end].copy_from_slice(&text[..end - offset]);
        }
    }

    fn set_transform(&mut self, frame_size: FrameSize, position: (f32, f32)) {
        lock(&self.state).transform = Some((frame_size, position));
    }

    fn set_opacity(&mut self, opacity: f32) {
        lock(&self.state).opacity = opacity;
    }

    fn render(&mut self) {
        lock(&self.state).render_count += 1;
    }

    fn graphics_info(&self) -> GraphicsInfo {
        lock(&self.state).graphics.clone()
    }
}
