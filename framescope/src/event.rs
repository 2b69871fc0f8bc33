use std::{fmt, sync::OnceLock, time::Instant};

/// Number of event types, used to size per-type tables.
pub const EVENT_TYPE_COUNT: usize = 4;

/// Discriminant of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EventType {
    Process = 0,
    Window = 1,
    Frame = 2,
    Generic = 3,
}

impl EventType {
    pub const ALL: [EventType; EVENT_TYPE_COUNT] = [
        EventType::Process,
        EventType::Window,
        EventType::Frame,
        EventType::Generic,
    ];

    /// Index of this type in per-type tables.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            EventType::Process => "process",
            EventType::Window => "window",
            EventType::Frame => "frame",
            EventType::Generic => "generic",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Process sample taken by the application monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProcessEvent {
    pub timestamp: u64,
    /// CPU usage in percent, can exceed 100 on multi-core machines.
    pub cpu_usage: u32,
    pub thread_count: u32,
    /// Virtual memory size in kB.
    pub vsz_memory: u64,
    /// Resident set size in kB.
    pub rss_memory: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WindowState {
    Shown,
    Hidden,
    Resized,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowState::Shown => write!(f, "shown"),
            WindowState::Hidden => write!(f, "hidden"),
            WindowState::Resized => write!(f, "resized"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WindowEvent {
    pub timestamp: u64,
    pub window_id: u32,
    pub width: u32,
    pub height: u32,
    pub state: WindowState,
}

/// Frame sample accumulated by a window monitor across the pipeline stages.
///
/// Durations are in nanoseconds. A `gpu_time` of 0 means the GPU timer is
/// unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FrameEvent {
    pub timestamp: u64,
    pub window_id: u32,
    pub frame_number: u32,
    pub delta_time: u64,
    pub sync_time: u64,
    pub render_time: u64,
    pub gpu_time: u64,
    pub swap_time: u64,
}

impl FrameEvent {
    pub fn new(window_id: u32) -> Self {
        Self {
            window_id,
            ..Self::default()
        }
    }
}

/// Application defined event carrying a short string.
///
/// The string is stored inline so that the event stays `Copy` and can be
/// queued without allocating. Longer strings are truncated to
/// [`GenericEvent::MAX_STRING_SIZE`] bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct GenericEvent {
    pub timestamp: u64,
    pub id: u32,
    len: u8,
    bytes: [u8; GenericEvent::MAX_STRING_SIZE],
}

impl GenericEvent {
    pub const MAX_STRING_SIZE: usize = 64;

    pub fn new(id: u32, string: &[u8]) -> Self {
        let len = string.len().min(Self::MAX_STRING_SIZE);
        let mut bytes = [0; Self::MAX_STRING_SIZE];
        bytes[..len].copy_from_slice(&string[..len]);
        Self {
            timestamp: timestamp(),
            id,
            len: len as u8,
            bytes,
        }
    }

    /// Raw bytes of the (possibly truncated) string.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The string, with invalid UTF-8 sequences replaced.
    pub fn string(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.bytes())
    }
}

impl fmt::Debug for GenericEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericEvent")
            .field("timestamp", &self.timestamp)
            .field("id", &self.id)
            .field("string", &self.string())
            .finish()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for GenericEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("GenericEvent", 3)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("string", &self.string())?;
        state.end()
    }
}

/// A timestamped sample delivered to sinks.
///
/// Payload fields are only meaningful for their own variant. Timestamps are
/// monotonic nanoseconds (see [`timestamp`]), not wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum Event {
    Process(ProcessEvent),
    Window(WindowEvent),
    Frame(FrameEvent),
    Generic(GenericEvent),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Process(_) => EventType::Process,
            Event::Window(_) => EventType::Window,
            Event::Frame(_) => EventType::Frame,
            Event::Generic(_) => EventType::Generic,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Event::Process(e) => e.timestamp,
            Event::Window(e) => e.timestamp,
            Event::Frame(e) => e.timestamp,
            Event::Generic(e) => e.timestamp,
        }
    }
}

impl From<ProcessEvent> for Event {
    fn from(e: ProcessEvent) -> Self {
        Event::Process(e)
    }
}

impl From<WindowEvent> for Event {
    fn from(e: WindowEvent) -> Self {
        Event::Window(e)
    }
}

impl From<FrameEvent> for Event {
    fn from(e: FrameEvent) -> Self {
        Event::Frame(e)
    }
}

impl From<GenericEvent> for Event {
    fn from(e: GenericEvent) -> Self {
        Event::Generic(e)
    }
}

/// Monotonic timestamp in nanoseconds, relative to the first call in the
/// process.
pub fn timestamp() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_string_is_truncated() {
        let long = [b'a'; 100];
        let event = GenericEvent::new(3, &long);
        assert_eq!(event.bytes().len(), GenericEvent::MAX_STRING_SIZE);
        assert_eq!(event.id, 3);
    }

    #[test]
    fn generic_string_roundtrips_short_input() {
        let event = GenericEvent::new(1, b"loaded");
        assert_eq!(event.string(), "loaded");
    }

    #[test]
    fn timestamps_are_monotonic() {
        let a = timestamp();
        let b = timestamp();
        assert!(b >= a);
    }

    #[test]
    fn event_type_matches_variant() {
        let event: Event = FrameEvent::new(2).into();
        assert_eq!(event.event_type(), EventType::Frame);
        assert_eq!(EventType::Frame.index(), 2);
    }

    #[cfg(feature = "recorder")]
    #[test]
    fn generic_event_serializes_string() {
        let event: Event = GenericEvent::new(7, b"ready").into();
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["type"], "generic");
        assert_eq!(json["string"], "ready");
        assert_eq!(json["id"], 7);
    }
}
