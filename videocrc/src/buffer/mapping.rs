use std::io;
use std::os::fd::{AsRawFd, RawFd};

use log::trace;
use memmap2::{MmapMut, MmapOptions};

use super::ExternalBuffer;
use crate::error::{Error, Result};

/// Maps external (device) buffers into the process.
///
/// The returned region owns the mapping and releases it when dropped, so
/// every exit path of a frame computation unmaps exactly once.
pub trait Mapper {
    /// Mapped region; only ever read through `as_ref`.
    type Region: AsRef<[u8]>;

    /// Maps `buffer.len()` bytes at `buffer.offset()` from the buffer's handle.
    fn map(&self, buffer: &ExternalBuffer<'_>) -> Result<Self::Region>;
}

/// Maps file descriptors with a shared read/write mapping.
///
/// The write permission matches what device allocators expect; the
/// checksum path never writes through the mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct FdMapper;

impl Mapper for FdMapper {
    type Region = MappedRegion;

    #[allow(unsafe_code)]
    fn map(&self, buffer: &ExternalBuffer<'_>) -> Result<MappedRegion> {
        let fd = buffer.fd().as_raw_fd();
        let mapping_error = |source| Error::Mapping {
            fd,
            len: buffer.len(),
            offset: buffer.offset(),
            source,
        };

        if buffer.len() == 0 {
            return Err(mapping_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "zero-length mapping",
            )));
        }

        // SAFETY: the buffer owner keeps the descriptor and its backing
        // memory alive for the duration of the frame, and the region is only
        // exposed as a shared slice.
        let map = unsafe {
            MmapOptions::new()
                .offset(buffer.offset())
                .len(buffer.len())
                .map_mut(fd)
        };
        let map = map.map_err(mapping_error)?;

        trace!(
            "mapped {} bytes at offset {} from fd {}",
            map.len(),
            buffer.offset(),
            fd
        );
        Ok(MappedRegion { map, fd })
    }
}

/// A live shared mapping of an external buffer.
#[derive(Debug)]
pub struct MappedRegion {
    map: MmapMut,
    fd: RawFd,
}

impl MappedRegion {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl AsRef<[u8]> for MappedRegion {
    fn as_ref(&self) -> &[u8] {
        &self.map
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // `MmapMut` unmaps right after this.
        trace!("unmapping {} bytes from fd {}", self.map.len(), self.fd);
    }
}
