use crate::LoggingFilter;

/// Overlay template used when none is configured. Shows every keyword and
/// metric known to the catalog.
pub const DEFAULT_OVERLAY_TEXT: &str = concat!(
    "%engineVersion (%platformName) - %glVersion\n",
    "%cpuModel\n",
    "%gpuModel\r",
    "    Window : %9windowId   \n",
    "      Size : %9windowSize px\r",
    "     Frame : %9frameNumber   \n",
    "     Delta : %9deltaTime ms\n",
    "      Sync : %9syncTime ms\n",
    "    Render : %9renderTime ms\n",
    "       GPU : %9gpuTime ms\n",
    "      Swap : %9swapTime ms\n",
    "     Total : %9totalTime ms\r",
    "  VSZ mem. : %9vszMemory kB\n",
    "  RSS mem. : %9rssMemory kB\n",
    "   Threads : %9threadCount   \n",
    " CPU usage : %9cpuUsage %% ",
);

/// Runtime configuration for the application monitor.
///
/// Use the builder pattern to customize, or use [`Default`] for sensible
/// defaults.
///
/// # Examples
///
/// ```rust
/// use framescope::{LoggingFilter, MonitorConfig};
///
/// let config = MonitorConfig::default()
///     .with_process_update_interval(250)                     // 4 samples per second
///     .with_logging_filter(LoggingFilter::FRAME)             // Frames only
///     .with_overlay_text("%5frameNumber %deltaTime ms");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MonitorConfig {
    /// Template rendered by each window overlay.
    /// Default: [`DEFAULT_OVERLAY_TEXT`]
    overlay_text: String,

    /// Time in milliseconds between two process samples. Negative values
    /// disable sampling.
    /// Default: 1000
    process_update_interval: i32,

    /// Event types forwarded to the sinks.
    /// Default: [`LoggingFilter::ALL`]
    logging_filter: LoggingFilter,

    /// Whether window monitors time frames on the GPU. The
    /// `FRAMESCOPE_NO_GPU_TIMER` environment variable overrides this.
    /// Default: true
    gpu_timer: bool,

    /// Top-left corner of the overlay in pixels.
    /// Default: (5.0, 5.0)
    overlay_position: (f32, f32),

    /// Overlay opacity in `[0, 1]`.
    /// Default: 0.85
    overlay_opacity: f32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            overlay_text: DEFAULT_OVERLAY_TEXT.to_string(),
            process_update_interval: 1000,
            logging_filter: LoggingFilter::ALL,
            gpu_timer: true,
            overlay_position: (5.0, 5.0),
            overlay_opacity: 0.85,
        }
    }
}

impl MonitorConfig {
    /// Set the overlay template. See the crate documentation for the
    /// placeholder syntax.
    pub fn with_overlay_text(mut self, text: impl Into<String>) -> Self {
        self.overlay_text = text.into();
        self
    }

    /// Returns the overlay template.
    pub fn overlay_text(&self) -> &str {
        &self.overlay_text
    }

    /// Set the process sampling period in milliseconds, -1 to disable.
    pub fn with_process_update_interval(mut self, interval: i32) -> Self {
        self.process_update_interval = interval;
        self
    }

    /// Returns the process sampling period in milliseconds.
    pub fn process_update_interval(&self) -> i32 {
        self.process_update_interval
    }

    pub fn with_logging_filter(mut self, filter: LoggingFilter) -> Self {
        self.logging_filter = filter;
        self
    }

    pub fn logging_filter(&self) -> LoggingFilter {
        self.logging_filter
    }

    /// Enable or disable GPU frame timing.
    pub fn with_gpu_timer(mut self, enabled: bool) -> Self {
        self.gpu_timer = enabled;
        self
    }

    /// Returns `true` if GPU timing is enabled, taking the
    /// `FRAMESCOPE_NO_GPU_TIMER` opt-out into account.
    pub fn gpu_timer(&self) -> bool {
        self.gpu_timer && !gpu_timer_disabled_by_env()
    }

    pub fn with_overlay_position(mut self, x: f32, y: f32) -> Self {
        self.overlay_position = (x, y);
        self
    }

    pub fn overlay_position(&self) -> (f32, f32) {
        self.overlay_position
    }

    /// Set the overlay opacity, clamped to `[0, 1]`.
    pub fn with_overlay_opacity(mut self, opacity: f32) -> Self {
        self.overlay_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn overlay_opacity(&self) -> f32 {
        self.overlay_opacity
    }
}

/// Name of the environment variable disabling GPU timers.
pub const NO_GPU_TIMER_ENV: &str = "FRAMESCOPE_NO_GPU_TIMER";

fn gpu_timer_disabled_by_env() -> bool {
    static DISABLED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
    *DISABLED.get_or_init(|| std::env::var_os(NO_GPU_TIMER_ENV).is_some())
}
