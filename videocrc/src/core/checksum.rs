//! Table-driven CRC-32 register.
//!
//! The register starts at zero, shifts bytes in MSB-first and is
//! complemented on finalization. With the default polynomial this is
//! CRC-32/CKSUM without the length suffix.
//!
//! # Example
//!
//! ```rust
//! use videocrc::{Crc32, CrcTable};
//!
//! let table = CrcTable::default();
//! let checksum = Crc32::compute(&table, b"123456789");
//!
//! assert_eq!(checksum, 0x765E_7680);
//! assert!(Crc32::verify(&table, b"123456789", checksum));
//! ```

use super::table::CrcTable;

/// CRC-32 calculator bound to a lookup table.
#[derive(Debug, Clone, Copy)]
pub struct Crc32<'t> {
    table: &'t CrcTable,
    state: u32,
}

impl<'t> Crc32<'t> {
    /// Creates a calculator with a zeroed register.
    #[inline]
    pub const fn new(table: &'t CrcTable) -> Self {
        Self { table, state: 0 }
    }

    /// Creates a calculator continuing from a saved register value.
    #[inline]
    pub const fn from_state(table: &'t CrcTable, state: u32) -> Self {
        Self { table, state }
    }

    /// Folds a single byte into the register.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.state = self.table.fold(self.state, byte);
    }

    /// Updates the CRC with the given data.
    ///
    /// May be called repeatedly to process data in chunks.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.push(byte);
        }
    }

    /// Finalizes and returns the complemented register.
    #[inline]
    pub const fn finalize(self) -> u32 {
        !self.state
    }

    /// Computes the checksum of `data` in one call.
    #[inline]
    pub fn compute(table: &CrcTable, data: &[u8]) -> u32 {
        let mut crc = Crc32::new(table);
        crc.update(data);
        crc.finalize()
    }

    /// Computes one checksum over several slices without copying.
    #[inline]
    pub fn compute_slices(table: &CrcTable, slices: &[&[u8]]) -> u32 {
        let mut crc = Crc32::new(table);
        for slice in slices {
            crc.update(slice);
        }
        crc.finalize()
    }

    #[inline]
    pub fn verify(table: &CrcTable, data: &[u8], expected: u32) -> bool {
        Self::compute(table, data) == expected
    }

    #[inline]
    pub fn reset(&mut self) {
        self.state = 0;
    }

    /// Returns the raw (uncomplemented) register.
    #[inline]
    pub const fn state(&self) -> u32 {
        self.state
    }

    pub const fn table(&self) -> &'t CrcTable {
        self.table
    }
}
