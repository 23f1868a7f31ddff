//! The per-stream CRC element.
//!
//! [`VideoCrc`] holds everything a stream needs between frames: the
//! configuration, the lookup table for the active polynomial, the negotiated
//! geometry and the record emitter. Frames are processed one at a time on
//! the caller's thread; a frame either yields a [`FrameRecord`] or an error,
//! never both.

use core::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{debug, error, warn};

use crate::buffer::{self, FdMapper, FrameBuffer, Mapper};
use crate::config::CrcConfig;
use crate::core::CrcTable;
use crate::error::{Error, Result};
use crate::geometry::VideoGeometry;
use crate::record::{FrameRecord, RecordEmitter, RecordSink};
use crate::walker::{self, FrameLayout, SegmentMode};

/// Element lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// Not started; configuration may change.
    Idle,

    /// Started; frames are accepted.
    Running,
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementState::Idle => write!(f, "idle"),
            ElementState::Running => write!(f, "running"),
        }
    }
}

/// Counters for the current run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames that produced a record.
    pub frames_processed: u64,

    /// Frames rejected by mapping, geometry or bounds errors.
    pub frames_failed: u64,

    /// Size of the byte views of processed frames.
    pub bytes_hashed: u64,

    /// Records that could not be written to the CRC log.
    pub sink_errors: u64,
}

/// CRC element for one video stream.
///
/// # Example
///
/// ```rust
/// use videocrc::{CrcConfig, FrameBuffer, VideoCrc};
///
/// let mut element = VideoCrc::new(CrcConfig::default());
/// element.start()?;
///
/// let record = element.process(FrameBuffer::Direct(&[0x00, 0x01, 0x02, 0x03]))?;
/// assert_eq!(record.to_string(), "VideoFrame 1 crc 5396EBAE");
///
/// element.stop()?;
/// # Ok::<(), videocrc::Error>(())
/// ```
pub struct VideoCrc<M = FdMapper> {
    config: CrcConfig,
    table: CrcTable,
    geometry: Option<VideoGeometry>,
    state: ElementState,
    emitter: RecordEmitter,
    mapper: M,
    crc: u32,
    stats: FrameStats,
}

impl VideoCrc<FdMapper> {
    /// Creates an idle element that maps external buffers by file descriptor.
    pub fn new(config: CrcConfig) -> Self {
        Self::with_mapper(config, FdMapper)
    }
}

impl<M: Mapper> VideoCrc<M> {
    pub fn with_mapper(config: CrcConfig, mapper: M) -> Self {
        debug!(
            "Initialize CRC table using polynomial {:08X}",
            config.polynomial
        );
        Self {
            table: CrcTable::new(config.polynomial),
            config,
            geometry: None,
            state: ElementState::Idle,
            emitter: RecordEmitter::new(),
            mapper,
            crc: 0,
            stats: FrameStats::default(),
        }
    }

    pub fn config(&self) -> &CrcConfig {
        &self.config
    }

    pub fn polynomial(&self) -> u32 {
        self.config.polynomial
    }

    /// Changes the polynomial and rebuilds the table if it differs.
    pub fn set_polynomial(&mut self, polynomial: u32) -> Result<()> {
        self.ensure_idle("change the polynomial")?;
        if polynomial != self.table.polynomial() {
            debug!("Initialize CRC table using polynomial {:08X}", polynomial);
            self.table = CrcTable::new(polynomial);
        }
        self.config.polynomial = polynomial;
        Ok(())
    }

    pub fn location(&self) -> Option<&Path> {
        self.config.location.as_deref()
    }

    /// Sets or clears the CRC log path.
    pub fn set_location(&mut self, location: Option<PathBuf>) -> Result<()> {
        self.ensure_idle("change the location")?;
        debug!("location: {:?}", location);
        self.config.location = location;
        Ok(())
    }

    pub fn segment_mode(&self) -> SegmentMode {
        self.config.segment_mode
    }

    pub fn set_segment_mode(&mut self, mode: SegmentMode) -> Result<()> {
        self.ensure_idle("change the segment mode")?;
        self.config.segment_mode = mode;
        Ok(())
    }

    /// Records the negotiated geometry. Renegotiation replaces it.
    pub fn set_geometry(&mut self, geometry: VideoGeometry) {
        debug!(
            "width: {}, height: {}, stride_w: {}, stride_h: {}, offset: {}, size: {}",
            geometry.width,
            geometry.height,
            geometry.stride_w,
            geometry.stride_h,
            geometry.chroma_offset,
            geometry.size
        );
        if geometry.chroma_offset != geometry.chroma_base() {
            debug!(
                "negotiated chroma offset {} differs from the aligned plane offset {}",
                geometry.chroma_offset,
                geometry.chroma_base()
            );
        }
        self.geometry = Some(geometry);
    }

    pub fn geometry(&self) -> Option<&VideoGeometry> {
        self.geometry.as_ref()
    }

    /// Table for the active polynomial.
    pub fn table(&self) -> &CrcTable {
        &self.table
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    pub fn state(&self) -> ElementState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ElementState::Running
    }

    /// Checksum of the last processed frame.
    pub fn last_crc(&self) -> u32 {
        self.crc
    }

    pub fn frame_count(&self) -> u64 {
        self.emitter.frame_count()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Zeroes the frame counter, the running checksum and the statistics.
    ///
    /// Only allowed while idle; a running stream keeps its numbering.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_idle("reset")?;
        self.clear();
        Ok(())
    }

    fn clear(&mut self) {
        self.emitter.reset();
        self.crc = 0;
        self.stats = FrameStats::default();
    }

    /// Starts a run, creating (or truncating) the CRC log if a location is set.
    pub fn start(&mut self) -> Result<()> {
        self.ensure_idle("start")?;
        let sink = match &self.config.location {
            Some(path) => {
                let file = File::create(path).map_err(|source| Error::Open {
                    path: path.clone(),
                    source,
                })?;
                Some(Box::new(BufWriter::new(file)) as Box<dyn RecordSink + Send>)
            }
            None => None,
        };
        self.begin(sink)
    }

    /// Starts a run writing records to `sink` instead of the configured
    /// location.
    pub fn start_with_sink(&mut self, sink: Box<dyn RecordSink + Send>) -> Result<()> {
        self.begin(Some(sink))
    }

    fn begin(&mut self, sink: Option<Box<dyn RecordSink + Send>>) -> Result<()> {
        self.ensure_idle("start")?;
        self.clear();
        if let Some(sink) = sink {
            self.emitter.attach(sink);
        }
        self.state = ElementState::Running;

        debug!(
            "start: polynomial {:08X}, segments {}, log {:?}",
            self.table.polynomial(),
            self.config.segment_mode,
            self.config.location
        );
        Ok(())
    }

    /// Stops the run, flushing and closing the CRC log. Stopping an idle
    /// element does nothing.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == ElementState::Idle {
            return Ok(());
        }

        debug!("stop");
        self.state = ElementState::Idle;
        self.emitter.close()
    }

    /// Processes one frame, choosing the layout from the buffer's provenance.
    pub fn process(&mut self, buffer: FrameBuffer<'_>) -> Result<FrameRecord> {
        let layout = buffer.layout();
        self.process_as(buffer, layout)
    }

    /// Processes one frame with an explicit layout.
    ///
    /// On error nothing is emitted and the frame counter is unchanged; the
    /// caller decides whether to continue with the next frame.
    pub fn process_as(
        &mut self,
        buffer: FrameBuffer<'_>,
        layout: FrameLayout,
    ) -> Result<FrameRecord> {
        self.ensure_running("process a frame")?;
        self.crc = 0;

        let (crc, viewed) = match self.checksum(buffer, layout) {
            Ok(result) => result,
            Err(e) => {
                self.stats.frames_failed += 1;
                warn!("frame {} dropped: {}", self.frame_count() + 1, e);
                return Err(e);
            }
        };

        self.crc = crc;
        self.stats.frames_processed += 1;
        self.stats.bytes_hashed += viewed as u64;

        let emission = self.emitter.emit(crc);
        if let Some(e) = emission.sink_error {
            self.stats.sink_errors += 1;
            error!("failed to log frame {}: {}", emission.record.index, e);
        }
        Ok(emission.record)
    }

    /// Resolves the buffer and walks it. The view, and with it any mapping,
    /// is released when this returns.
    fn checksum(&self, buffer: FrameBuffer<'_>, layout: FrameLayout) -> Result<(u32, usize)> {
        let geometry = match layout {
            FrameLayout::Planar => Some(self.geometry.as_ref().ok_or(Error::MissingGeometry)?),
            FrameLayout::Bitstream => None,
        };

        let view = buffer::resolve(&self.mapper, buffer)?;
        let crc = match geometry {
            Some(geometry) => {
                let mode = self.config.segment_mode;
                walker::compute_planar_with(&view, geometry, &self.table, mode)?.reported()
            }
            None => walker::compute_flat(&view, &self.table),
        };
        Ok((crc, view.len()))
    }

    fn ensure_idle(&self, action: &'static str) -> Result<()> {
        match self.state {
            ElementState::Idle => Ok(()),
            state => Err(Error::InvalidState { action, state }),
        }
    }

    fn ensure_running(&self, action: &'static str) -> Result<()> {
        match self.state {
            ElementState::Running => Ok(()),
            state => Err(Error::InvalidState { action, state }),
        }
    }
}

impl<M> fmt::Debug for VideoCrc<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoCrc")
            .field("config", &self.config)
            .field("geometry", &self.geometry)
            .field("state", &self.state)
            .field("emitter", &self.emitter)
            .field("crc", &format_args!("{:08X}", self.crc))
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
