//! # VideoCRC - per-frame CRC-32 for video streams
//!
//! VideoCRC computes a CRC-32 for every frame of a video stream and logs the
//! sequence, so that decoder or encoder output can be compared bit for bit
//! against a reference run:
//!
//! - **Configurable polynomial**: lookup table generated for any 32-bit polynomial
//! - **Device buffers**: file-descriptor backed frames are mapped per frame
//!   and unmapped on every exit path
//! - **Plane-aware walk**: strided NV12 frames are hashed luma first, then
//!   chroma U and chroma V, skipping row and plane padding
//! - **Encoded buffers**: bitstreams are hashed flat, byte by byte
//! - **CRC log**: `VideoFrame <n> crc <XXXXXXXX>` lines on the log channel
//!   and optionally in a file
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Host pipeline                        │
//! ├─────────────────────────────────────────────────────────┤
//! │                    VideoCrc element                     │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────┐    │
//! │  │    Config   │ │   Geometry  │ │  Record emitter │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────┘    │
//! ├─────────────────────────────────────────────────────────┤
//! │                    Walk layer                           │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────┐    │
//! │  │ Planar walk │ │  Flat walk  │ │    CRC table    │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────┘    │
//! ├─────────────────────────────────────────────────────────┤
//! │                    Buffer layer                         │
//! │  ┌─────────────────────┐ ┌─────────────────────────┐    │
//! │  │  Mapped (fd, mmap)  │ │  Direct (borrowed)      │    │
//! │  └─────────────────────┘ └─────────────────────────┘    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use videocrc::{CrcConfig, FrameBuffer, ExternalBuffer, VideoCrc, VideoGeometry};
//!
//! let mut element = VideoCrc::new(CrcConfig::default().with_location("crc.log"));
//! element.set_geometry(VideoGeometry::nv12(1920, 1080)?);
//! element.start()?;
//!
//! let buffer = ExternalBuffer::new(dmabuf.as_fd(), len, 0);
//! let record = element.process(FrameBuffer::External(buffer))?;
//!
//! element.stop()?;
//! ```

#![deny(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod core;
pub mod element;
pub mod error;
pub mod geometry;
pub mod record;
pub mod walker;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use crate::core::{Crc32, CrcTable, DEFAULT_POLYNOMIAL, build_table};
pub use buffer::{ByteView, ExternalBuffer, FdMapper, FrameBuffer, Mapper, resolve};
pub use config::CrcConfig;
pub use element::{ElementState, FrameStats, VideoCrc};
pub use error::{Error, ErrorKind, Result};
pub use geometry::VideoGeometry;
pub use record::{Comparison, FrameRecord, RecordEmitter, RecordSink, compare_records, parse_log};
pub use walker::{
    FrameLayout, PlanarDigest, SegmentMode, compute_flat, compute_planar, compute_planar_with,
};
