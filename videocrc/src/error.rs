use std::io;
use std::os::fd::RawFd;
use std::path::PathBuf;

use crate::element::ElementState;

/// Broad category of an [`Error`], for callers that only need to decide
/// whether to skip the frame, stop the stream or fix their configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid state transition, missing or unusable stream parameters.
    Configuration,
    /// An external buffer could not be mapped into the process.
    Mapping,
    /// The geometry would read outside the frame buffer.
    Bounds,
    /// The CRC log could not be opened, written or flushed.
    Sink,
    /// A CRC log line could not be parsed.
    Parse,
    /// Other I/O failure.
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot {action} while the element is {state}")]
    InvalidState {
        action: &'static str,
        state: ElementState,
    },

    #[error("planar frame received before the video geometry was negotiated")]
    MissingGeometry,

    #[error("video geometry {width}x{height} cannot be addressed")]
    InvalidGeometry { width: usize, height: usize },

    #[error("failed to map {len} bytes at offset {offset} from fd {fd}")]
    Mapping {
        fd: RawFd,
        len: usize,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("frame walk needs {needed} bytes but the buffer holds {available}")]
    OutOfBounds { needed: usize, available: usize },

    #[error("failed to open CRC log {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write CRC record")]
    Sink(#[source] io::Error),

    #[error("malformed CRC record {0:?}")]
    MalformedRecord(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidState { .. } => ErrorKind::Configuration,
            Error::MissingGeometry | Error::InvalidGeometry { .. } => ErrorKind::Configuration,
            Error::Mapping { .. } => ErrorKind::Mapping,
            Error::OutOfBounds { .. } => ErrorKind::Bounds,
            Error::Open { .. } | Error::Sink(_) => ErrorKind::Sink,
            Error::MalformedRecord(_) => ErrorKind::Parse,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
