#![cfg_attr(docsrs, feature(doc_cfg))]
//! # framescope
//!
//! Frame, window and process metrics for real-time rendered applications,
//! with a live text overlay.
//!
//! framescope plugs into the render pipeline of a host application. It times
//! every stage of every frame, samples the process periodically, and ships
//! the resulting events to pluggable sinks through a dedicated background
//! thread. Optionally it draws a text overlay on top of each window, showing
//! the latest values.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use framescope::{ApplicationMonitor, MonitorConfig, sinks::FileSink};
//!
//! // `host` implements `framescope::host::Host`.
//! let monitor = ApplicationMonitor::new(host, MonitorConfig::default());
//! monitor.install_sink(Arc::new(FileSink::stdout(false)))?;
//! monitor.set_overlay(true)?;
//! monitor.set_logging(true)?;
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ApplicationMonitor`] | Turns monitoring on and off, owns sinks and windows |
//! | [`Event`] | Process, window, frame or generic sample |
//! | [`Sink`] | Receives every event on the logging thread |
//! | [`LoggingThread`] | Bounded queue drained by a background thread |
//! | [`Overlay`] | Per-window text overlay rendered from a template |
//! | [`MonitorConfig`] | Runtime configuration |
//! | [`host::Host`] | Boundary with the host application |
//!
//! ## Overlay Templates
//!
//! The overlay text is a template where `%` introduces a placeholder:
//!
//! - `%%` is a literal `%`.
//! - keywords are replaced once, when the template is parsed:
//!   `%engineVersion`, `%platformName`, `%glVersion`, `%cpuModel`,
//!   `%gpuModel`.
//! - metrics reserve a right-aligned field rewritten at every frame. An
//!   optional width of one or two digits (clamped to 1..=32) comes before
//!   the name, e.g. `%5frameNumber`: `%cpuUsage`, `%threadCount`,
//!   `%vszMemory`, `%rssMemory`, `%windowId`, `%windowSize`,
//!   `%frameNumber`, `%deltaTime`, `%syncTime`, `%renderTime`, `%gpuTime`,
//!   `%swapTime`, `%totalTime`.
//!
//! Anything else is kept as literal text. `\n` and `\r` both start a new
//! line. Durations are shown in milliseconds.
//!
//! ```rust
//! use framescope::MonitorConfig;
//!
//! let config = MonitorConfig::default()
//!     .with_overlay_text("%gpuModel\nframe %6frameNumber: %deltaTime ms");
//! ```
//!
//! ## Features
//!
//! - **`recorder`** (default) - Built-in `Recorder` sink writing events to JSON Lines files (enables `serde`)
//! - **`serde`** - `Serialize` on events, `Serialize`/`Deserialize` on configuration
//! - **`test-harness`** - Headless host, recording sink and surfaces for testing without a GPU

mod config;
mod error;
mod event;
mod logging_filter;

pub mod host;
pub mod logging;
pub mod monitor;
pub mod overlay;
pub mod sinks;

mod internal;

#[cfg(any(test, feature = "test-harness"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-harness")))]
pub mod testing;

pub use config::{DEFAULT_OVERLAY_TEXT, MonitorConfig, NO_GPU_TIMER_ENV};
pub use error::Error;
pub use event::{
    EVENT_TYPE_COUNT, Event, EventType, FrameEvent, GenericEvent, ProcessEvent, WindowEvent,
    WindowState, timestamp,
};
pub use logging::{LoggingThread, Sink, SinkId};
pub use logging_filter::LoggingFilter;
pub use monitor::{ApplicationMonitor, MonitorEvent, ProcessSampler};
pub use overlay::Overlay;

/// Convenience alias for `Result<T, framescope::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
