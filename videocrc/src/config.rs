use std::path::PathBuf;

use crate::core::DEFAULT_POLYNOMIAL;
use crate::walker::SegmentMode;

/// Settings of a [`VideoCrc`](crate::VideoCrc) element.
///
/// Every field may only change while the element is idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcConfig {
    /// CRC polynomial used to build the lookup table.
    pub polynomial: u32,
    /// File the per-frame CRC lines are written to, if any.
    pub location: Option<PathBuf>,
    pub segment_mode: SegmentMode,
}

impl CrcConfig {
    pub fn new() -> Self {
        Self {
            polynomial: DEFAULT_POLYNOMIAL,
            location: None,
            segment_mode: SegmentMode::default(),
        }
    }

    pub fn with_polynomial(mut self, polynomial: u32) -> Self {
        self.polynomial = polynomial;
        self
    }

    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_segment_mode(mut self, mode: SegmentMode) -> Self {
        self.segment_mode = mode;
        self
    }
}

impl Default for CrcConfig {
    fn default() -> Self {
        Self::new()
    }
}
