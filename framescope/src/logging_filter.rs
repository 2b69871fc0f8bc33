use std::{fmt, ops, str::FromStr};

use crate::{Error, EventType};

/// Bitmask selecting which event types reach the sinks.
///
/// All events are logged by default. Parse from a comma separated list with
/// [`FromStr`]:
///
/// ```rust
/// use framescope::LoggingFilter;
///
/// let filter: LoggingFilter = "process,frame".parse().unwrap();
/// assert!(filter.contains(LoggingFilter::FRAME));
/// assert!(!filter.contains(LoggingFilter::WINDOW));
///
/// let all: LoggingFilter = "*".parse().unwrap();
/// assert_eq!(all, LoggingFilter::ALL);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoggingFilter(u32);

impl LoggingFilter {
    pub const NONE: LoggingFilter = LoggingFilter(0);
    pub const PROCESS: LoggingFilter = LoggingFilter(1 << 0);
    pub const WINDOW: LoggingFilter = LoggingFilter(1 << 1);
    pub const FRAME: LoggingFilter = LoggingFilter(1 << 2);
    pub const GENERIC: LoggingFilter = LoggingFilter(1 << 3);
    pub const ALL: LoggingFilter = LoggingFilter(0b1111);

    pub fn from_bits_truncate(bits: u32) -> Self {
        LoggingFilter(bits & Self::ALL.0)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: LoggingFilter) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if events of the given type pass the filter.
    pub fn allows(self, event_type: EventType) -> bool {
        self.contains(Self::from(event_type))
    }
}

impl Default for LoggingFilter {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<EventType> for LoggingFilter {
    fn from(event_type: EventType) -> Self {
        LoggingFilter(1 << event_type.index())
    }
}

impl ops::BitOr for LoggingFilter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        LoggingFilter(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for LoggingFilter {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl ops::BitAnd for LoggingFilter {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        LoggingFilter(self.0 & rhs.0)
    }
}

impl FromStr for LoggingFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filter = LoggingFilter::NONE;
        for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            filter |= match item {
                "*" => LoggingFilter::ALL,
                "process" => LoggingFilter::PROCESS,
                "window" => LoggingFilter::WINDOW,
                "frame" => LoggingFilter::FRAME,
                "generic" => LoggingFilter::GENERIC,
                other => return Err(Error::UnknownLoggingFilter(other.to_string())),
            };
        }
        Ok(filter)
    }
}

impl fmt::Display for LoggingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("*");
        }
        let mut first = true;
        for event_type in EventType::ALL {
            if self.allows(event_type) {
                if !first {
                    f.write_str(",")?;
                }
                f.write_str(event_type.name())?;
                first = false;
            }
        }
        Ok(())
    }
}
