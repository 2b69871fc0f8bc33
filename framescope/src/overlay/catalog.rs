//! Static tables of the placeholder names understood by overlay templates.

use std::sync::OnceLock;

use crate::{
    EventType,
    host::{GraphicsInfo, HostInfo},
};

/// Maximum size of a resolved keyword string.
pub const MAX_KEYWORD_STRING_SIZE: usize = 128;

/// One-shot string placeholders, substituted once at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    EngineVersion,
    PlatformName,
    GlVersion,
    CpuModel,
    GpuModel,
}

impl Keyword {
    pub const ALL: [Keyword; 5] = [
        Keyword::EngineVersion,
        Keyword::PlatformName,
        Keyword::GlVersion,
        Keyword::CpuModel,
        Keyword::GpuModel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Keyword::EngineVersion => "engineVersion",
            Keyword::PlatformName => "platformName",
            Keyword::GlVersion => "glVersion",
            Keyword::CpuModel => "cpuModel",
            Keyword::GpuModel => "gpuModel",
        }
    }

    /// Longest keyword whose name prefixes `text`.
    pub fn longest_match(text: &[u8]) -> Option<Keyword> {
        Self::ALL
            .into_iter()
            .filter(|k| text.starts_with(k.name().as_bytes()))
            .max_by_key(|k| k.name().len())
    }
}

/// Live numeric placeholders, rewritten at every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    CpuUsage,
    ThreadCount,
    VszMemory,
    RssMemory,
    WindowId,
    WindowSize,
    FrameNumber,
    DeltaTime,
    SyncTime,
    RenderTime,
    GpuTime,
    SwapTime,
    TotalTime,
}

impl Metric {
    pub const ALL: [Metric; 13] = [
        Metric::CpuUsage,
        Metric::ThreadCount,
        Metric::VszMemory,
        Metric::RssMemory,
        Metric::WindowId,
        Metric::WindowSize,
        Metric::FrameNumber,
        Metric::DeltaTime,
        Metric::SyncTime,
        Metric::RenderTime,
        Metric::GpuTime,
        Metric::SwapTime,
        Metric::TotalTime,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::CpuUsage => "cpuUsage",
            Metric::ThreadCount => "threadCount",
            Metric::VszMemory => "vszMemory",
            Metric::RssMemory => "rssMemory",
            Metric::WindowId => "windowId",
            Metric::WindowSize => "windowSize",
            Metric::FrameNumber => "frameNumber",
            Metric::DeltaTime => "deltaTime",
            Metric::SyncTime => "syncTime",
            Metric::RenderTime => "renderTime",
            Metric::GpuTime => "gpuTime",
            Metric::SwapTime => "swapTime",
            Metric::TotalTime => "totalTime",
        }
    }

    /// Event type providing the value of this metric.
    pub fn event_type(self) -> EventType {
        match self {
            Metric::CpuUsage | Metric::ThreadCount | Metric::VszMemory | Metric::RssMemory => {
                EventType::Process
            }
            Metric::WindowId | Metric::WindowSize => EventType::Window,
            _ => EventType::Frame,
        }
    }

    /// Width used when the placeholder has no explicit width.
    pub fn default_width(self) -> u8 {
        match self {
            Metric::CpuUsage | Metric::ThreadCount => 3,
            Metric::VszMemory | Metric::RssMemory => 8,
            Metric::WindowId => 2,
            Metric::WindowSize => 9,
            _ => 7,
        }
    }

    /// Longest metric whose name prefixes `text`, skipping metrics for which
    /// `accept` returns `false`.
    pub fn longest_match(text: &[u8], accept: impl Fn(Metric) -> bool) -> Option<Metric> {
        Self::ALL
            .into_iter()
            .filter(|m| accept(*m) && text.starts_with(m.name().as_bytes()))
            .max_by_key(|m| m.name().len())
    }
}

/// Sources needed to resolve keywords.
#[derive(Debug, Clone, Copy)]
pub struct KeywordContext<'a> {
    pub host: &'a HostInfo,
    pub graphics: &'a GraphicsInfo,
}

impl KeywordContext<'_> {
    /// Writes the string of `keyword` into `buffer`, truncated to its size.
    /// Returns the number of bytes written.
    pub fn resolve(&self, keyword: Keyword, buffer: &mut [u8]) -> usize {
        let mut writer = Writer { buffer, len: 0 };
        match keyword {
            Keyword::EngineVersion => writer.push(self.host.engine_version.as_bytes()),
            Keyword::PlatformName => writer.push(self.host.platform_name.as_bytes()),
            Keyword::GlVersion => {
                if self.graphics.desktop_gl {
                    writer.push(b"OpenGL ");
                }
                writer.push(self.graphics.version.as_bytes());
            }
            Keyword::CpuModel => writer.push(cpu_model().as_bytes()),
            Keyword::GpuModel => {
                writer.push(self.graphics.vendor.as_bytes());
                writer.push(b" ");
                writer.push(self.graphics.renderer.as_bytes());
            }
        }
        writer.len
    }
}

struct Writer<'a> {
    buffer: &'a mut [u8],
    len: usize,
}

impl Writer<'_> {
    fn push(&mut self, bytes: &[u8]) {
        let count = bytes.len().min(self.buffer.len() - self.len);
        self.buffer[self.len..self.len + count].copy_from_slice(&bytes[..count]);
        self.len += count;
    }
}

/// Human readable CPU model with the online core count, computed once.
pub fn cpu_model() -> &'static str {
    static MODEL: OnceLock<String> = OnceLock::new();
    MODEL.get_or_init(|| {
        let mut model = read_cpu_model()
            .unwrap_or_else(|| std::env::consts::ARCH.to_string())
            .trim()
            .to_string();
        if model.is_empty() {
            model = "Unknown CPU".to_string();
        }
        let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
        if cores > 1 {
            model.push_str(&format!(" ({cores} cores)"));
        }
        model.truncate(floor_char_boundary(&model, MAX_KEYWORD_STRING_SIZE));
        model
    })
}

fn read_cpu_model() -> Option<String> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo")
        .inspect_err(|e| tracing::debug!(error = %e, "can't read /proc/cpuinfo"))
        .ok()?;
    parse_cpu_model(&cpuinfo)
}

fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "model name").then(|| value.trim().to_string())
    })
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0)
}
