use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use videocrc::{DEFAULT_POLYNOMIAL, SegmentMode};

#[derive(Parser, Debug)]
#[command(
    name = "videocrc",
    version,
    about = "Compute a CRC-32 for every frame of a raw NV12 or encoded video file"
)]
pub struct Cli {
    /// Input file: NV12 frames stored with 128-byte row pitch and 32-row
    /// plane alignment, or an encoded bitstream with --encoded
    pub input: PathBuf,

    /// Frame width in pixels
    #[arg(long, required_unless_present = "encoded")]
    pub width: Option<usize>,

    /// Frame height in pixels
    #[arg(long, required_unless_present = "encoded")]
    pub height: Option<usize>,

    /// How frames reach the checksum: mapped from the file descriptor
    /// (needs read/write access to the input) or read into memory
    #[arg(long, value_enum, default_value_t = Access::Mmap)]
    pub access: Access,

    /// Treat the input as an opaque bitstream and hash it flat
    #[arg(long)]
    pub encoded: bool,

    /// Bytes per frame in --encoded mode
    #[arg(long, default_value_t = 4096)]
    pub chunk_size: usize,

    /// CRC polynomial, hex (0x...) or decimal
    #[arg(
        long,
        value_parser = parse_polynomial,
        default_value_t = DEFAULT_POLYNOMIAL
    )]
    pub polynomial: u32,

    /// Write the CRC log to this file
    #[arg(short, long)]
    pub location: Option<PathBuf>,

    /// How planar segments combine: `last` or `chained`
    #[arg(long, default_value_t = SegmentMode::LastSegment)]
    pub segments: SegmentMode,

    /// Reference CRC log to compare against; exits non-zero on mismatch
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long)]
    pub limit: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Access {
    /// Map each frame from the file descriptor
    Mmap,
    /// Read each frame into a buffer
    Read,
}

fn parse_polynomial(value: &str) -> Result<u32, String> {
    let digits = value.replace('_', "").to_ascii_lowercase();
    let parsed = match digits.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => digits.parse(),
    };
    parsed.map_err(|e| format!("invalid polynomial `{value}`: {e}"))
}
