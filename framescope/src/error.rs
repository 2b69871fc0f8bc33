use std::sync::Arc;

use crate::SinkId;

/// The single error type for all framescope operations.
///
/// Every fallible API returns `framescope::Result<T>` (alias for
/// `Result<T, framescope::Error>`). Capacity overflows are reported here
/// instead of growing a table; the caller keeps operating with the existing
/// capacity.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("Can't install more than {0} sinks")]
    SinkCapacity(usize),

    #[error("Can't monitor more than {0} windows")]
    MonitorCapacity(usize),

    #[error("Sink {0} is not installed")]
    UnknownSink(SinkId),

    #[error("Overlay resources could not be initialized")]
    OverlayInitialization,

    #[error("Unknown logging filter '{0}'")]
    UnknownLoggingFilter(String),

    #[error("Process sampling failed: {0}")]
    ProcessSampling(&'static str),

    #[error("IO error: {0}")]
    IoError(#[source] Arc<std::io::Error>),
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::SinkCapacity(a), Self::SinkCapacity(b)) => a == b,
            (Self::MonitorCapacity(a), Self::MonitorCapacity(b)) => a == b,
            (Self::UnknownSink(a), Self::UnknownSink(b)) => a == b,
            (Self::OverlayInitialization, Self::OverlayInitialization) => true,
            (Self::UnknownLoggingFilter(a), Self::UnknownLoggingFilter(b)) => a == b,
            (Self::ProcessSampling(a), Self::ProcessSampling(b)) => a == b,
            (Self::IoError(a), Self::IoError(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(Arc::new(e))
    }
}
