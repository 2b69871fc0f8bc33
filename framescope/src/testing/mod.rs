//! In-memory host, surfaces and sinks for exercising monitors without a
//! graphics stack.
//!
//! Enable with the `test-harness` feature:
//!
//! ```toml
//! [dev-dependencies]
//! framescope = { version = "0.1", features = ["test-harness"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use framescope::{ApplicationMonitor, EventType, MonitorConfig, testing::*};
//!
//! let host = HeadlessHost::new();
//! let window = host.add_window(800, 600);
//! let sink = RecordingSink::new();
//!
//! let monitor = ApplicationMonitor::new(
//!     host.clone(),
//!     MonitorConfig::default().with_process_update_interval(-1),
//! );
//! monitor.install_sink(Arc::new(sink.clone())).unwrap();
//! monitor.set_logging(true).unwrap();
//!
//! // The first frame only sets up the GPU resources.
//! window.render_frame();
//! window.render_frame();
//! window.render_frame();
//! monitor.set_logging(false).unwrap();
//!
//! assert_eq!(sink.count(EventType::Frame), 2);
//! ```
//!
//! # Warning
//!
//! **Do not use in production.** Every type here keeps its history in
//! unbounded buffers.

mod headless;
mod manual_gpu_timer;
mod recording_sink;
mod recording_surface;

pub use headless::{HeadlessHost, HeadlessWindow, RenderLoop};
pub use manual_gpu_timer::ManualGpuTimer;
pub use recording_sink::RecordingSink;
pub use recording_surface::RecordingSurface;
