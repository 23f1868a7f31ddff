//! CRC-32 lookup table generation.
//!
//! Tables are built MSB-first: each candidate byte is placed in the top
//! eight bits of the remainder and shifted left through the polynomial.
//! With the default polynomial this yields the table used by
//! CRC-32/MPEG-2 and POSIX `cksum`.

use core::fmt;
use core::ops::Index;

/// Default CRC polynomial (IEEE 802.3 generator, normal form).
pub const DEFAULT_POLYNOMIAL: u32 = 0x04C1_1DB7;

/// Register width in bits.
const WIDTH: u32 = u32::BITS;

const TOPBIT: u32 = 1 << (WIDTH - 1);

/// Builds the 256-entry lookup table for `polynomial`.
pub const fn build_table(polynomial: u32) -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;

    while i < 256 {
        let mut remainder = (i as u32) << (WIDTH - 8);
        let mut j = 0;

        while j < 8 {
            if remainder & TOPBIT != 0 {
                remainder = (remainder << 1) ^ polynomial;
            } else {
                remainder <<= 1;
            }
            j += 1;
        }

        table[i] = remainder;
        i += 1;
    }

    table
}

/// Lookup table bound to the polynomial it was generated from.
///
/// The table is immutable once built; a polynomial change produces a new
/// table. It is `Sync`, so independent streams may share one.
#[derive(Clone, PartialEq, Eq)]
pub struct CrcTable {
    polynomial: u32,
    entries: [u32; 256],
}

impl CrcTable {
    /// Generates the table for `polynomial`.
    pub const fn new(polynomial: u32) -> Self {
        Self {
            polynomial,
            entries: build_table(polynomial),
        }
    }

    /// Polynomial this table was generated from.
    #[inline]
    pub const fn polynomial(&self) -> u32 {
        self.polynomial
    }

    #[inline]
    pub const fn entries(&self) -> &[u32; 256] {
        &self.entries
    }

    /// Folds one byte into the running register.
    #[inline]
    pub const fn fold(&self, crc: u32, byte: u8) -> u32 {
        let pos = ((crc >> 24) ^ byte as u32) & 0xFF;
        (crc << 8) ^ self.entries[pos as usize]
    }
}

impl Default for CrcTable {
    fn default() -> Self {
        Self::new(DEFAULT_POLYNOMIAL)
    }
}

impl Index<usize> for CrcTable {
    type Output = u32;

    fn index(&self, index: usize) -> &u32 {
        &self.entries[index]
    }
}

impl fmt::Debug for CrcTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrcTable")
            .field("polynomial", &format_args!("{:#010X}", self.polynomial))
            .finish_non_exhaustive()
    }
}
