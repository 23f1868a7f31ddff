//! Per-frame CRC records.
//!
//! Every processed frame produces one [`FrameRecord`], rendered as
//!
//! ```text
//! VideoFrame <index> crc <8-digit uppercase hex>
//! ```
//!
//! on the log channel and, when a sink is attached, as one line of the CRC
//! log file. The same format is parsed back to compare a run against a
//! reference log.

use core::fmt;
use core::str::FromStr;
use std::io::{self, BufRead};

use log::info;

use crate::error::{Error, Result};

/// Checksum of one frame, tagged with its 1-based position in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRecord {
    pub index: u64,
    pub crc: u32,
}

impl FrameRecord {
    pub fn new(index: u64, crc: u32) -> Self {
        Self { index, crc }
    }
}

impl fmt::Display for FrameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VideoFrame {} crc {:08X}", self.index, self.crc)
    }
}

impl FromStr for FrameRecord {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let malformed = || Error::MalformedRecord(line.to_owned());
        let mut fields = line.split_whitespace();

        if fields.next() != Some("VideoFrame") {
            return Err(malformed());
        }
        let index = fields
            .next()
            .and_then(|field| field.parse::<u64>().ok())
            .ok_or_else(malformed)?;
        if fields.next() != Some("crc") {
            return Err(malformed());
        }
        let crc = fields
            .next()
            .filter(|field| field.len() <= 8)
            .and_then(|field| u32::from_str_radix(field, 16).ok())
            .ok_or_else(malformed)?;
        if fields.next().is_some() {
            return Err(malformed());
        }

        Ok(FrameRecord { index, crc })
    }
}

/// Append-only destination for CRC log lines.
pub trait RecordSink {
    /// Appends one newline-terminated record.
    fn append(&mut self, record: &FrameRecord) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

impl<W: io::Write> RecordSink for W {
    fn append(&mut self, record: &FrameRecord) -> io::Result<()> {
        writeln!(self, "{record}")
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(self)
    }
}

/// Result of emitting one record.
///
/// The record is valid even when the sink write failed.
#[derive(Debug)]
pub struct Emission {
    pub record: FrameRecord,
    pub sink_error: Option<Error>,
}

/// Numbers checksums in arrival order and publishes them.
///
/// The emitter is the single owner of the sink, so lines are written in
/// the order frames were emitted.
#[derive(Default)]
pub struct RecordEmitter {
    frame_num: u64,
    sink: Option<Box<dyn RecordSink + Send>>,
}

impl RecordEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Box<dyn RecordSink + Send>) -> Self {
        Self {
            frame_num: 0,
            sink: Some(sink),
        }
    }

    /// Replaces the sink, returning the previous one unflushed.
    pub fn attach(
        &mut self,
        sink: Box<dyn RecordSink + Send>,
    ) -> Option<Box<dyn RecordSink + Send>> {
        self.sink.replace(sink)
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Number of records emitted since the last reset.
    pub fn frame_count(&self) -> u64 {
        self.frame_num
    }

    pub fn reset(&mut self) {
        self.frame_num = 0;
    }

    /// Assigns the next frame index to `crc`, logs the record and appends it
    /// to the sink.
    pub fn emit(&mut self, crc: u32) -> Emission {
        self.frame_num += 1;
        let record = FrameRecord::new(self.frame_num, crc);

        info!("{record}");

        let failure = match self.sink.as_mut() {
            Some(sink) => sink.append(&record).err().map(Error::Sink),
            None => None,
        };

        Emission {
            record,
            sink_error: failure,
        }
    }

    /// Flushes and drops the sink.
    pub fn close(&mut self) -> Result<()> {
        match self.sink.take() {
            Some(mut sink) => sink.flush().map_err(Error::Sink),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for RecordEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordEmitter")
            .field("frame_num", &self.frame_num)
            .field("has_sink", &self.has_sink())
            .finish()
    }
}

/// Reads a CRC log, skipping blank lines.
pub fn parse_log<R: BufRead>(reader: R) -> Result<Vec<FrameRecord>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        records.push(line.parse()?);
    }
    Ok(records)
}

/// A frame whose checksum differs from the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub index: u64,
    pub expected: u32,
    pub actual: u32,
}

/// Outcome of comparing a run against a reference log.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Frames present in both with equal checksums.
    pub matched: usize,
    pub mismatches: Vec<Mismatch>,
    /// Reference frames the run did not produce.
    pub missing: Vec<u64>,
    /// Frames the run produced beyond the reference.
    pub extra: Vec<u64>,
}

impl Comparison {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty() && self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Compares two record sequences frame by frame, keyed by frame index.
pub fn compare_records(reference: &[FrameRecord], actual: &[FrameRecord]) -> Comparison {
    let mut comparison = Comparison::default();

    for expected in reference {
        match actual.iter().find(|r| r.index == expected.index) {
            Some(record) if record.crc == expected.crc => comparison.matched += 1,
            Some(record) => comparison.mismatches.push(Mismatch {
                index: expected.index,
                expected: expected.crc,
                actual: record.crc,
            }),
            None => comparison.missing.push(expected.index),
        }
    }

    comparison.extra = actual
        .iter()
        .map(|record| record.index)
        .filter(|index| !reference.iter().any(|r| r.index == *index))
        .collect();

    comparison
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Sink whose contents stay readable after it is handed to an emitter.
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedSink {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    struct BrokenSink;

    impl io::Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn test_display() {
        let record = FrameRecord::new(1, 0x5396_EBAE);
        assert_eq!(record.to_string(), "VideoFrame 1 crc 5396EBAE");
        let record = FrameRecord::new(42, 0xAB);
        assert_eq!(record.to_string(), "VideoFrame 42 crc 000000AB");
    }

    #[test]
    fn test_parse() {
        let record: FrameRecord = "VideoFrame 7 crc 0000ABCD".parse().unwrap();
        assert_eq!(record, FrameRecord::new(7, 0xABCD));

        let malformed = [
            "VideoFrame 7 crc",
            "VideoFrame x crc 0000ABCD",
            "AudioFrame 7 crc 0000ABCD",
            "VideoFrame 7 crc 1234567890",
            "VideoFrame 7 crc 0000ABCD trailing",
        ];
        for line in malformed {
            assert!(line.parse::<FrameRecord>().is_err(), "{line}");
        }
    }

    #[test]
    fn test_emit_numbers_from_one() {
        let sink = SharedSink::default();
        let mut emitter = RecordEmitter::with_sink(Box::new(sink.clone()));

        let indices: Vec<u64> = (0..5).map(|crc| emitter.emit(crc).record.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
        assert_eq!(emitter.frame_count(), 5);

        emitter.close().unwrap();
        assert!(!emitter.has_sink());
        let text = sink.text();
        assert_eq!(text.lines().count(), 5);
        assert!(text.starts_with("VideoFrame 1 crc 00000000\nVideoFrame 2 crc 00000001\n"));
    }

    #[test]
    fn test_emit_without_sink() {
        let mut emitter = RecordEmitter::new();
        let emission = emitter.emit(0xDEAD_BEEF);
        assert_eq!(emission.record, FrameRecord::new(1, 0xDEAD_BEEF));
        assert!(emission.sink_error.is_none());
        assert!(emitter.close().is_ok());
    }

    #[test]
    fn test_sink_failure_keeps_record() {
        let mut emitter = RecordEmitter::with_sink(Box::new(BrokenSink));

        let emission = emitter.emit(0x1234);
        assert_eq!(emission.record, FrameRecord::new(1, 0x1234));
        assert!(matches!(emission.sink_error, Some(Error::Sink(_))));

        assert_eq!(emitter.emit(0x5678).record.index, 2);
        assert!(emitter.close().is_err());
    }

    #[test]
    fn test_reset() {
        let mut emitter = RecordEmitter::new();
        emitter.emit(1);
        emitter.emit(2);
        emitter.reset();
        assert_eq!(emitter.emit(3).record.index, 1);
    }

    #[test]
    fn test_parse_log() {
        let log = "VideoFrame 1 crc 00000001\n\nVideoFrame 2 crc 00000002\n";
        let records = parse_log(Cursor::new(log)).unwrap();
        let expected = vec![FrameRecord::new(1, 1), FrameRecord::new(2, 2)];
        assert_eq!(records, expected);

        let err = parse_log(Cursor::new("VideoFrame 1 crc zz\n")).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord(_)));
    }

    #[test]
    fn test_compare_records() {
        let r = FrameRecord::new;
        let reference = [r(1, 10), r(2, 20), r(3, 30)];
        let actual = [r(1, 10), r(2, 21), r(4, 40)];

        let comparison = compare_records(&reference, &actual);
        assert_eq!(comparison.matched, 1);
        assert_eq!(
            comparison.mismatches,
            vec![Mismatch {
                index: 2,
                expected: 20,
                actual: 21,
            }]
        );
        assert_eq!(comparison.missing, vec![3]);
        assert_eq!(comparison.extra, vec![4]);
        assert!(!comparison.is_clean());

        assert!(compare_records(&reference, &reference).is_clean());
    }
}
