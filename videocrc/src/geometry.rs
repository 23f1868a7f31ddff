//! Negotiated video geometry.
//!
//! Planar frames are laid out with the luma row pitch aligned to
//! [`STRIDE_ALIGN`] and the plane height aligned to [`HEIGHT_ALIGN`]; the
//! interleaved chroma plane starts right after the padded luma plane.

use crate::error::{Error, Result};

/// Row pitch alignment in bytes.
pub const STRIDE_ALIGN: usize = 128;

/// Plane height alignment in rows.
pub const HEIGHT_ALIGN: usize = 32;

/// Rounds `value` up to a multiple of `to`, which must be a power of two.
/// Returns `None` when the result does not fit in a `usize`.
#[inline]
pub const fn align(value: usize, to: usize) -> Option<usize> {
    match value.checked_add(to - 1) {
        Some(padded) => Some(padded & !(to - 1)),
        None => None,
    }
}

/// Padded strides and the size of the padded luma plane.
fn padded_planes(width: usize, height: usize) -> Option<(usize, usize, usize)> {
    let stride_w = align(width, STRIDE_ALIGN)?;
    let stride_h = align(height, HEIGHT_ALIGN)?;
    let luma = stride_w.checked_mul(stride_h)?;
    // the chroma plane is half the luma plane; the walk must be addressable
    luma.checked_add(luma / 2)?;
    Some((stride_w, stride_h, luma))
}

/// Frame geometry as resolved by upstream negotiation.
///
/// Read-only once set on a stream. Consistency with the buffers actually
/// delivered is the caller's contract; the walker still refuses to read
/// past the end of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoGeometry {
    /// Display width in pixels.
    pub width: usize,
    /// Display height in pixels.
    pub height: usize,
    /// Padded row pitch, `align(width, 128)`.
    pub stride_w: usize,
    /// Padded plane height, `align(height, 32)`.
    pub stride_h: usize,
    /// Byte offset of the second plane as reported by negotiation.
    pub chroma_offset: usize,
    /// Total backing size as reported by negotiation.
    pub size: usize,
}

impl VideoGeometry {
    /// Builds a geometry from negotiated values, deriving the padded strides.
    ///
    /// Fails with [`Error::InvalidGeometry`] when the padded layout cannot be
    /// addressed.
    pub fn new(width: usize, height: usize, chroma_offset: usize, size: usize) -> Result<Self> {
        let (stride_w, stride_h, _) =
            padded_planes(width, height).ok_or(Error::InvalidGeometry { width, height })?;

        Ok(Self {
            width,
            height,
            stride_w,
            stride_h,
            chroma_offset,
            size,
        })
    }

    /// Geometry of an NV12 frame stored with aligned strides.
    pub fn nv12(width: usize, height: usize) -> Result<Self> {
        let (stride_w, stride_h, luma) =
            padded_planes(width, height).ok_or(Error::InvalidGeometry { width, height })?;

        Ok(Self {
            width,
            height,
            stride_w,
            stride_h,
            chroma_offset: luma,
            size: luma + luma / 2,
        })
    }

    /// Offset the planar walk reads chroma from.
    #[inline]
    pub fn chroma_base(&self) -> usize {
        self.stride_w * self.stride_h
    }

    /// Luma bytes hashed per row. Luma is consumed in pairs, so an odd
    /// trailing column is not part of the walk.
    #[inline]
    pub fn luma_row_bytes(&self) -> usize {
        self.width & !1
    }

    /// Chroma samples (U/V pairs) hashed per chroma row.
    #[inline]
    pub fn chroma_pairs(&self) -> usize {
        self.width.div_ceil(2)
    }

    #[inline]
    pub fn chroma_rows(&self) -> usize {
        self.height / 2
    }

    /// One past the highest byte offset the planar walk touches, or 0 when
    /// the walk reads nothing.
    pub fn planar_extent(&self) -> usize {
        let luma = match (self.height, self.luma_row_bytes()) {
            (0, _) | (_, 0) => 0,
            (rows, bytes) => (rows - 1) * self.stride_w + bytes,
        };
        let chroma = match (self.chroma_rows(), self.chroma_pairs()) {
            (0, _) | (_, 0) => 0,
            (rows, pairs) => self.chroma_base() + (rows - 1) * self.stride_w + pairs * 2,
        };
        luma.max(chroma)
    }
}
