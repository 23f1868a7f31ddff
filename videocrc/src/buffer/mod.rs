//! Frame buffer access.
//!
//! A frame arrives in one of two shapes, decided by where it came from:
//! - External: device memory handed over as a file descriptor, mapped per
//!   frame and unmapped when the view is dropped
//! - Direct: a byte slice the caller already owns
//!
//! [`resolve`] turns either into a [`ByteView`] the walkers read from.

mod mapping;

use core::ops::Deref;
use std::os::fd::BorrowedFd;

pub use mapping::{FdMapper, MappedRegion, Mapper};

use crate::error::{Error, Result};
use crate::walker::FrameLayout;

/// Descriptor of a buffer living in device memory.
#[derive(Debug, Clone, Copy)]
pub struct ExternalBuffer<'fd> {
    fd: BorrowedFd<'fd>,
    len: usize,
    offset: u64,
}

impl<'fd> ExternalBuffer<'fd> {
    pub fn new(fd: BorrowedFd<'fd>, len: usize, offset: u64) -> Self {
        Self { fd, len, offset }
    }

    pub fn fd(&self) -> BorrowedFd<'fd> {
        self.fd
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// One frame's backing memory.
#[derive(Debug, Clone, Copy)]
pub enum FrameBuffer<'a> {
    /// Decoder output in device memory; must be mapped before access.
    External(ExternalBuffer<'a>),
    /// Encoder output already addressable by the process.
    Direct(&'a [u8]),
}

impl FrameBuffer<'_> {
    pub fn len(&self) -> usize {
        match self {
            FrameBuffer::External(buffer) => buffer.len(),
            FrameBuffer::Direct(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Layout implied by provenance: decoded device buffers hold raw planes,
    /// directly addressable buffers hold an encoded bitstream.
    pub fn layout(&self) -> FrameLayout {
        match self {
            FrameBuffer::External(_) => FrameLayout::Planar,
            FrameBuffer::Direct(_) => FrameLayout::Bitstream,
        }
    }
}

/// Read-only byte view over a resolved frame buffer.
///
/// A mapped view owns its mapping; dropping the view unmaps it.
#[derive(Debug)]
pub enum ByteView<'a, R> {
    Mapped(R),
    Borrowed(&'a [u8]),
}

impl<R: AsRef<[u8]>> ByteView<'_, R> {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ByteView::Mapped(region) => region.as_ref(),
            ByteView::Borrowed(bytes) => bytes,
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, ByteView::Mapped(_))
    }

    /// Returns `len` bytes starting at `offset`, or a bounds error.
    pub fn read(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let bytes = self.as_bytes();
        let end = offset.checked_add(len).ok_or(Error::OutOfBounds {
            needed: usize::MAX,
            available: bytes.len(),
        })?;

        bytes.get(offset..end).ok_or(Error::OutOfBounds {
            needed: end,
            available: bytes.len(),
        })
    }
}

impl<R: AsRef<[u8]>> Deref for ByteView<'_, R> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Resolves a frame buffer into a byte view, mapping external buffers
/// through `mapper`.
pub fn resolve<'a, M: Mapper>(
    mapper: &M,
    buffer: FrameBuffer<'a>,
) -> Result<ByteView<'a, M::Region>> {
    match buffer {
        FrameBuffer::External(external) => mapper.map(&external).map(ByteView::Mapped),
        FrameBuffer::Direct(bytes) => Ok(ByteView::Borrowed(bytes)),
    }
}
