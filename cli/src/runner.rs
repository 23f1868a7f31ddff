use std::fs::{File, OpenOptions};
use std::io::{self, BufReader};
use std::os::fd::AsFd;
use std::os::unix::fs::FileExt;

use log::{info, warn};
use videocrc::{Comparison, CrcConfig, Error, ExternalBuffer, FrameBuffer, FrameLayout, Result};
use videocrc::{FrameRecord, FrameStats, VideoCrc, VideoGeometry, compare_records, parse_log};

use crate::args::{Access, Cli};

/// Outcome of one pass over the input file.
#[derive(Debug)]
pub struct Summary {
    pub records: Vec<FrameRecord>,
    pub stats: FrameStats,
    pub comparison: Option<Comparison>,
}

/// Feeds every frame of the input file through a fresh element.
pub fn run(cli: &Cli) -> Result<Summary> {
    let mut config = CrcConfig::new()
        .with_polynomial(cli.polynomial)
        .with_segment_mode(cli.segments);
    if let Some(location) = &cli.location {
        config = config.with_location(location);
    }
    let mut element = VideoCrc::new(config);

    let (layout, frame_len) = if cli.encoded {
        (FrameLayout::Bitstream, cli.chunk_size)
    } else {
        let (Some(width), Some(height)) = (cli.width, cli.height) else {
            return Err(invalid_input("raw input needs --width and --height"));
        };
        let geometry = VideoGeometry::nv12(width, height)?;
        element.set_geometry(geometry);
        (FrameLayout::Planar, geometry.size)
    };
    if frame_len == 0 {
        return Err(invalid_input("frame size is zero"));
    }

    let input = OpenOptions::new()
        .read(true)
        .write(cli.access == Access::Mmap)
        .open(&cli.input)?;
    let input_len = input.metadata()?.len();

    element.start()?;
    info!(
        "Hashing {:?}: {} bytes, {} bytes per frame, {:?} access, segments {}",
        cli.input, input_len, frame_len, cli.access, cli.segments
    );

    let records = hash_frames(&mut element, &input, input_len, frame_len, layout, cli);
    let stats = element.stats();
    element.stop()?;

    let comparison = match &cli.reference {
        Some(path) => {
            let reference = parse_log(BufReader::new(File::open(path)?))?;
            Some(compare_records(&reference, &records))
        }
        None => None,
    };

    Ok(Summary {
        records,
        stats,
        comparison,
    })
}

/// Walks the file frame by frame. A frame that fails is logged and skipped.
fn hash_frames(
    element: &mut VideoCrc,
    input: &File,
    input_len: u64,
    frame_len: usize,
    layout: FrameLayout,
    cli: &Cli,
) -> Vec<FrameRecord> {
    let mut records = Vec::new();
    let mut scratch = Vec::new();
    let mut offset = 0u64;
    let mut frames = 0u64;

    while offset < input_len {
        if cli.limit.is_some_and(|limit| frames >= limit) {
            break;
        }
        let len = (input_len - offset).min(frame_len as u64) as usize;

        let result = match cli.access {
            Access::Mmap => {
                let buffer = ExternalBuffer::new(input.as_fd(), len, offset);
                element.process_as(FrameBuffer::External(buffer), layout)
            }
            Access::Read => {
                scratch.resize(len, 0);
                match input.read_exact_at(&mut scratch, offset) {
                    Ok(()) => element.process_as(FrameBuffer::Direct(&scratch), layout),
                    Err(e) => Err(e.into()),
                }
            }
        };

        match result {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping frame at offset {}: {}", offset, e),
        }

        offset += len as u64;
        frames += 1;
    }

    records
}

fn invalid_input(message: &str) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::InvalidInput, message.to_owned()))
}
