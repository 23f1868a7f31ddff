//! CRC building blocks.
//!
//! - Table: 256-entry lookup table generated from a polynomial
//! - Checksum: the running register that folds bytes through a table

mod checksum;
mod table;

pub use checksum::Crc32;
pub use table::{CrcTable, DEFAULT_POLYNOMIAL, build_table};
