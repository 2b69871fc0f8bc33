//! Per-window text overlay.
//!
//! A template such as `"Frame %5frameNumber, %deltaTime ms"` is parsed once
//! into a fixed text with reserved regions. Each render rewrites only the
//! regions whose source changed, using the allocation-free formatters of
//! [`format`].

pub mod catalog;
pub mod format;
mod renderer;
mod template;

pub use catalog::{Keyword, KeywordContext, Metric, cpu_model};
pub use renderer::Overlay;
pub use template::{
    MAX_METRIC_WIDTH, MAX_METRICS_PER_TYPE, MAX_PARSED_TEXT_SIZE, MetricSlot, ParsedTemplate,
};
