use std::io::{self, Read, Seek, Write};

/// Byte-level stream driven by a [`crate::StateWrapper`].
///
/// Transfers are all-or-nothing: a read that cannot fill the whole buffer, or a write that
/// cannot store the whole buffer, must return an error rather than report partial progress.
pub trait ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<()>;
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.read(&mut buf)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, value: u8) -> io::Result<()> {
        self.write(&[value])
    }

    /// Current byte offset. Only used for diagnostics.
    fn position(&mut self) -> u64;
}

fn unexpected_eof() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "short read")
}

/// Growable in-memory stream.
///
/// Writes overwrite existing bytes at the cursor and extend the buffer past its end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStream {
    data: Vec<u8>,
    pos: usize,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Moves the cursor. Positions past the end are allowed; reads there fail and writes
    /// zero-fill the gap.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for MemoryStream {
    fn from(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteStream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let end = self
            .pos
            .checked_add(buf.len())
            .filter(|&end| end <= self.data.len())
            .ok_or_else(unexpected_eof)?;
        buf.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        let end = self.pos.checked_add(buf.len()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "stream position overflow")
        })?;
        if end > self.data.len() {
            self.data
                .try_reserve(end - self.data.len())
                .map_err(|_| io::Error::new(io::ErrorKind::OutOfMemory, "stream too large"))?;
            self.data.resize(end, 0);
        }
        self.data[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        Ok(())
    }

    fn position(&mut self) -> u64 {
        self.pos as u64
    }
}

/// Read-only stream over borrowed bytes, e.g. a save state already loaded into memory.
#[derive(Debug, Clone)]
pub struct SliceStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }
}

impl ByteStream for SliceStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let rest = self.remaining();
        if rest.len() < buf.len() {
            return Err(unexpected_eof());
        }
        buf.copy_from_slice(&rest[..buf.len()]);
        self.pos += buf.len();
        Ok(())
    }

    fn write(&mut self, _buf: &[u8]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "slice stream is read-only",
        ))
    }

    fn position(&mut self) -> u64 {
        self.pos as u64
    }
}

/// Adapter for `std::io` streams (files, cursors, ...).
#[derive(Debug)]
pub struct IoStream<T> {
    inner: T,
}

impl<T> IoStream<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write + Seek> ByteStream for IoStream<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.inner.read_exact(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)
    }

    fn position(&mut self) -> u64 {
        self.inner.stream_position().unwrap_or(0)
    }
}
