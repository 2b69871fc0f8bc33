//! Application and window monitors.
//!
//! The [`ApplicationMonitor`] owns the logging thread and the process timer,
//! and attaches a window monitor to every visible window of the host. Window
//! monitors live on their window's render thread, where they time the
//! render pipeline stages and draw the overlay.

mod application;
mod process;
mod registry;
mod timer;
mod window;

pub use application::{ApplicationMonitor, MonitorEvent};
pub use process::ProcessSampler;
pub(crate) use registry::MonitorRegistry;
pub(crate) use timer::ProcessTimer;
pub(crate) use window::WindowMonitor;

use crate::{EventType, LoggingFilter};

/// Maximum number of windows monitored at once.
pub const MAX_WINDOW_MONITORS: usize = 16;

/// Behaviour switches shared by the application monitor with its window
/// monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MonitorFlags {
    pub overlay: bool,
    pub logging: bool,
    pub filter: LoggingFilter,
}

impl MonitorFlags {
    const OVERLAY: u32 = 1 << 8;
    const LOGGING: u32 = 1 << 9;

    pub fn to_bits(self) -> u32 {
        let mut bits = self.filter.bits();
        if self.overlay {
            bits |= Self::OVERLAY;
        }
        if self.logging {
            bits |= Self::LOGGING;
        }
        bits
    }

    pub fn from_bits(bits: u32) -> Self {
        Self {
            overlay: bits & Self::OVERLAY != 0,
            logging: bits & Self::LOGGING != 0,
            filter: LoggingFilter::from_bits_truncate(bits),
        }
    }

    /// Returns `true` if events of the given type go to the sinks.
    pub fn logs(self, event_type: EventType) -> bool {
        self.logging && self.filter.allows(event_type)
    }
}
