//! Frame checksum walks.
//!
//! Raw frames are walked plane by plane over a strided semi-planar 4:2:0
//! layout:
//!
//! ```text
//!  0                       width        stride_w
//!  ┌──────────────────────┬────────────┐
//!  │ Y Y Y Y ...          │  padding   │  height rows
//!  ├──────────────────────┴────────────┤
//!  │            padding rows           │  up to stride_h
//!  ├──────────────────────┬────────────┤  stride_w * stride_h
//!  │ U V U V ...          │  padding   │  height / 2 rows
//!  └──────────────────────┴────────────┘
//! ```
//!
//! Each plane segment (Y, then every U, then every V) runs through its own
//! CRC register and is complemented when it ends. Encoded frames are walked
//! flat, byte by byte.

use core::fmt;
use core::str::FromStr;

use crate::core::{Crc32, CrcTable};
use crate::error::{Error, Result};
use crate::geometry::VideoGeometry;

/// How a frame's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLayout {
    /// Raw semi-planar YUV 4:2:0 samples.
    Planar,
    /// Opaque encoded bitstream.
    Bitstream,
}

/// How the three planar segments combine into the reported checksum.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    /// Every segment starts from a zeroed register and the last segment (V)
    /// is reported. Luma and U only show up in [`PlanarDigest`].
    #[default]
    LastSegment,
    /// The register carries over from one segment to the next, so the
    /// reported value covers all three planes. Logs written by a
    /// single-register checksum element use this mode.
    Chained,
}

impl fmt::Display for SegmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentMode::LastSegment => write!(f, "last"),
            SegmentMode::Chained => write!(f, "chained"),
        }
    }
}

impl FromStr for SegmentMode {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "last" | "last-segment" => Ok(SegmentMode::LastSegment),
            "chained" => Ok(SegmentMode::Chained),
            other => Err(format!("unknown segment mode `{other}`")),
        }
    }
}

/// Complemented value of every planar segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanarDigest {
    pub luma: u32,
    pub chroma_u: u32,
    pub chroma_v: u32,
}

impl PlanarDigest {
    /// The frame checksum: the value of the last segment walked.
    #[inline]
    pub fn reported(&self) -> u32 {
        self.chroma_v
    }
}

/// Checksum of an opaque buffer, every byte in order.
pub fn compute_flat(view: &[u8], table: &CrcTable) -> u32 {
    Crc32::compute(table, view)
}

/// Checksum of a raw planar frame with independent segments.
pub fn compute_planar(view: &[u8], geometry: &VideoGeometry, table: &CrcTable) -> Result<u32> {
    let digest = compute_planar_with(view, geometry, table, SegmentMode::LastSegment)?;
    Ok(digest.reported())
}

/// Walks luma, chroma U and chroma V of a raw planar frame.
///
/// Fails before reading anything if the geometry reaches past the end of
/// `view`.
pub fn compute_planar_with(
    view: &[u8],
    geometry: &VideoGeometry,
    table: &CrcTable,
    mode: SegmentMode,
) -> Result<PlanarDigest> {
    let needed = geometry.planar_extent();
    if needed > view.len() {
        return Err(Error::OutOfBounds {
            needed,
            available: view.len(),
        });
    }

    let seed = |previous: u32| match mode {
        SegmentMode::LastSegment => Crc32::new(table),
        SegmentMode::Chained => Crc32::from_state(table, previous),
    };

    let luma = walk_luma(view, geometry, Crc32::new(table));
    let chroma_u = walk_chroma(view, geometry, Chroma::U, seed(luma));
    let chroma_v = walk_chroma(view, geometry, Chroma::V, seed(chroma_u));

    Ok(PlanarDigest {
        luma,
        chroma_u,
        chroma_v,
    })
}

#[derive(Clone, Copy)]
enum Chroma {
    U = 0,
    V = 1,
}

fn walk_luma(view: &[u8], geometry: &VideoGeometry, mut crc: Crc32<'_>) -> u32 {
    let row_bytes = geometry.luma_row_bytes();
    for row in 0..geometry.height {
        let start = row * geometry.stride_w;
        crc.update(&view[start..start + row_bytes]);
    }
    crc.finalize()
}

fn walk_chroma(view: &[u8], geometry: &VideoGeometry, plane: Chroma, mut crc: Crc32<'_>) -> u32 {
    let pairs = geometry.chroma_pairs();
    if pairs == 0 {
        return crc.finalize();
    }

    for row in 0..geometry.chroma_rows() {
        let start = geometry.chroma_base() + row * geometry.stride_w + plane as usize;
        let line = &view[start..start + pairs * 2 - 1];
        for &sample in line.iter().step_by(2) {
            crc.push(sample);
        }
    }
    crc.finalize()
}

#[cfg(test)]
mod tests {
    use super::SegmentMode::{Chained, LastSegment};
    use super::*;

    const PADDING: u8 = 0xEE;

    /// NV12 frame with stride padding filled with `PADDING`.
    fn frame(geometry: &VideoGeometry, luma: &[&[u8]], chroma: &[&[u8]]) -> Vec<u8> {
        let mut data = vec![PADDING; geometry.size];
        for (row, bytes) in luma.iter().enumerate() {
            let start = row * geometry.stride_w;
            data[start..start + bytes.len()].copy_from_slice(bytes);
        }
        for (row, bytes) in chroma.iter().enumerate() {
            let start = geometry.chroma_base() + row * geometry.stride_w;
            data[start..start + bytes.len()].copy_from_slice(bytes);
        }
        data
    }

    #[test]
    fn test_flat_empty() {
        assert_eq!(compute_flat(&[], &CrcTable::default()), 0xFFFF_FFFF);
        assert_eq!(compute_flat(&[], &CrcTable::new(0x8005)), 0xFFFF_FFFF);
    }

    #[test]
    fn test_flat_known_value() {
        let table = CrcTable::default();
        assert_eq!(compute_flat(&[0, 1, 2, 3], &table), 0x5396_EBAE);
        assert_eq!(compute_flat(&[3, 2, 1, 0], &table), 0x4E20_D543);
    }

    #[test]
    fn test_planar_single_row_excludes_padding() {
        let table = CrcTable::default();
        let geometry = VideoGeometry::nv12(2, 1).unwrap();
        let mut data = frame(&geometry, &[&[0x10, 0x20]], &[]);

        let digest = compute_planar_with(&data, &geometry, &table, LastSegment).unwrap();
        // (0x10, 0x20) folded from zero, then complemented
        assert_eq!(digest.luma, 0x778D_D20C);
        // height 1 has no chroma rows: both chroma loops are empty
        assert_eq!(digest.chroma_u, 0xFFFF_FFFF);
        assert_eq!(digest.chroma_v, 0xFFFF_FFFF);
        let reported = compute_planar(&data, &geometry, &table).unwrap();
        assert_eq!(reported, 0xFFFF_FFFF);

        data[2] = 0x00;
        data[127] = 0x55;
        data[geometry.chroma_base()] = 0x99;
        let again = compute_planar_with(&data, &geometry, &table, LastSegment).unwrap();
        assert_eq!(again, digest);
    }

    #[test]
    fn test_planar_segments_independent() {
        let table = CrcTable::default();
        let geometry = VideoGeometry::nv12(4, 2).unwrap();
        let data = frame(
            &geometry,
            &[&[1, 2, 3, 4], &[5, 6, 7, 8]],
            &[&[0xA0, 0xB0, 0xA1, 0xB1]],
        );

        let digest = compute_planar_with(&data, &geometry, &table, LastSegment).unwrap();
        assert_eq!(digest.luma, compute_flat(&[1, 2, 3, 4, 5, 6, 7, 8], &table));
        assert_eq!(digest.luma, 0x82F0_C97E);
        assert_eq!(digest.chroma_u, compute_flat(&[0xA0, 0xA1], &table));
        assert_eq!(digest.chroma_u, 0xA83E_5AF8);
        assert_eq!(digest.chroma_v, compute_flat(&[0xB0, 0xB1], &table));
        assert_eq!(digest.chroma_v, 0xF47E_1A9B);
        let reported = compute_planar(&data, &geometry, &table).unwrap();
        assert_eq!(reported, 0xF47E_1A9B);
    }

    #[test]
    fn test_planar_chained() {
        let table = CrcTable::default();
        let geometry = VideoGeometry::nv12(4, 2).unwrap();
        let data = frame(
            &geometry,
            &[&[1, 2, 3, 4], &[5, 6, 7, 8]],
            &[&[0xA0, 0xB0, 0xA1, 0xB1]],
        );

        let digest = compute_planar_with(&data, &geometry, &table, Chained).unwrap();
        assert_eq!(digest.luma, 0x82F0_C97E);
        assert_eq!(digest.chroma_u, 0xCA86_E166);
        assert_eq!(digest.chroma_v, 0x8FE2_DE4E);
    }

    #[test]
    fn test_chained_without_chroma_reports_luma() {
        let table = CrcTable::default();
        let geometry = VideoGeometry::nv12(2, 1).unwrap();
        let data = frame(&geometry, &[&[0x10, 0x20]], &[]);

        let digest = compute_planar_with(&data, &geometry, &table, Chained).unwrap();
        assert_eq!(digest.chroma_u, !0x778D_D20C);
        assert_eq!(digest.reported(), 0x778D_D20C);
    }

    #[test]
    fn test_planar_luma_change_only_affects_luma() {
        let table = CrcTable::default();
        let geometry = VideoGeometry::nv12(4, 2).unwrap();
        let a = frame(&geometry, &[&[1, 2, 3, 4], &[5, 6, 7, 8]], &[&[9; 4]]);
        let b = frame(&geometry, &[&[1, 2, 3, 4], &[5, 6, 7, 0]], &[&[9; 4]]);

        let da = compute_planar_with(&a, &geometry, &table, LastSegment).unwrap();
        let db = compute_planar_with(&b, &geometry, &table, LastSegment).unwrap();
        assert_ne!(da.luma, db.luma);
        assert_eq!(da.reported(), db.reported());

        let ca = compute_planar_with(&a, &geometry, &table, Chained).unwrap();
        let cb = compute_planar_with(&b, &geometry, &table, Chained).unwrap();
        assert_ne!(ca.reported(), cb.reported());
    }

    #[test]
    fn test_planar_empty_geometry() {
        let table = CrcTable::default();
        let geometry = VideoGeometry::nv12(0, 0).unwrap();
        let digest = compute_planar_with(&[], &geometry, &table, LastSegment).unwrap();
        assert_eq!(digest.luma, 0xFFFF_FFFF);
        assert_eq!(digest.reported(), 0xFFFF_FFFF);
    }

    #[test]
    fn test_planar_out_of_bounds() {
        let table = CrcTable::default();
        let geometry = VideoGeometry::nv12(4, 2).unwrap();
        let short = vec![0u8; geometry.chroma_base() + 3];

        let err = compute_planar(&short, &geometry, &table).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfBounds {
                needed: 4100,
                available: 4099,
            }
        ));
    }

    #[test]
    fn test_segment_mode_parse() {
        assert_eq!("last".parse::<SegmentMode>().unwrap(), LastSegment);
        assert_eq!("Chained".parse::<SegmentMode>().unwrap(), Chained);
        assert!("sum".parse::<SegmentMode>().is_err());
        assert_eq!(Chained.to_string(), "chained");
    }
}
