//! Test doubles shared by the unit tests.

use std::cell::Cell;
use std::io;
use std::os::fd::AsRawFd;
use std::rc::Rc;

use crate::buffer::{ExternalBuffer, Mapper};
use crate::error::{Error, Result};

/// Serves mappings from an in-memory backing store and counts map/unmap calls.
pub(crate) struct CountingMapper {
    backing: Vec<u8>,
    maps: Rc<Cell<usize>>,
    unmaps: Rc<Cell<usize>>,
}

impl CountingMapper {
    pub(crate) fn new(backing: Vec<u8>) -> Self {
        Self {
            backing,
            maps: Rc::new(Cell::new(0)),
            unmaps: Rc::new(Cell::new(0)),
        }
    }

    pub(crate) fn maps(&self) -> usize {
        self.maps.get()
    }

    pub(crate) fn unmaps(&self) -> usize {
        self.unmaps.get()
    }
}

#[derive(Debug)]
pub(crate) struct CountedRegion {
    bytes: Vec<u8>,
    unmaps: Rc<Cell<usize>>,
}

impl AsRef<[u8]> for CountedRegion {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for CountedRegion {
    fn drop(&mut self) {
        self.unmaps.set(self.unmaps.get() + 1);
    }
}

impl Mapper for CountingMapper {
    type Region = CountedRegion;

    fn map(&self, buffer: &ExternalBuffer<'_>) -> Result<CountedRegion> {
        let start = buffer.offset() as usize;
        let end = start + buffer.len();
        if buffer.is_empty() || end > self.backing.len() {
            return Err(Error::Mapping {
                fd: buffer.fd().as_raw_fd(),
                len: buffer.len(),
                offset: buffer.offset(),
                source: io::Error::from(io::ErrorKind::InvalidInput),
            });
        }

        self.maps.set(self.maps.get() + 1);
        Ok(CountedRegion {
            bytes: self.backing[start..end].to_vec(),
            unmaps: Rc::clone(&self.unmaps),
        })
    }
}
