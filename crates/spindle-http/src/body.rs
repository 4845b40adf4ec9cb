//! Blocking body transfer between host streams and buffers.
//!
//! Reads drain an incoming body with bounded blocking reads until the host
//! reports the stream closed. Writes split a buffer into bounded chunks via
//! [`ChunkedBytes`], which slices the `Bytes` without copying.

use bytes::{Bytes, BytesMut};

use crate::host::{IncomingBody, InputStream, OutgoingBody, OutputStream, StreamError};
use crate::{Error, Result};

/// Default maximum bytes requested per blocking read (16 KiB).
pub const DEFAULT_READ_CHUNK_SIZE: u64 = 16 * 1024;

/// Maximum bytes the host accepts per blocking write-and-flush.
pub const MAX_BLOCKING_WRITE_SIZE: usize = 4096;

/// Yields a `Bytes` buffer in fixed-size chunks without copying.
///
/// Each chunk is a `Bytes::slice()` sharing the original allocation.
pub struct ChunkedBytes {
    buf: Bytes,
    chunk_size: usize,
    offset: usize,
}

impl ChunkedBytes {
    pub fn new(buf: Bytes, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be > 0");
        Self {
            buf,
            chunk_size,
            offset: 0,
        }
    }
}

impl Iterator for ChunkedBytes {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        if self.offset >= self.buf.len() {
            return None;
        }
        let end = std::cmp::min(self.offset + self.chunk_size, self.buf.len());
        let chunk = self.buf.slice(self.offset..end);
        self.offset = end;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buf.len().saturating_sub(self.offset).div_ceil(self.chunk_size);
        (remaining, Some(remaining))
    }
}

/// Drain `body` into a buffer, then release its stream and finish it.
///
/// A read failure other than `Closed` aborts the loop; the stream and body
/// are dropped in that order on the way out.
pub(crate) fn read_to_end<B: IncomingBody>(body: B, chunk_size: u64) -> Result<Bytes> {
    let stream = body.stream()?;
    let mut buf = BytesMut::new();
    loop {
        match stream.blocking_read(chunk_size) {
            Ok(chunk) => buf.extend_from_slice(&chunk),
            Err(StreamError::Closed) => break,
            Err(StreamError::LastOperationFailed(e)) => return Err(Error::Stream(e)),
        }
    }
    drop(stream);
    body.finish();
    Ok(buf.freeze())
}

/// Write `data` to `body` in chunks of at most `chunk_size` bytes, then
/// release the stream and finish the body without trailers.
///
/// Returns the number of write calls issued.
pub(crate) fn write_all<B: OutgoingBody>(
    body: B,
    data: Option<Bytes>,
    chunk_size: usize,
) -> Result<usize> {
    let stream = body.write()?;
    let mut writes = 0;
    if let Some(data) = data {
        for chunk in ChunkedBytes::new(data, chunk_size) {
            stream
                .blocking_write_and_flush(&chunk)
                .map_err(|e| match e {
                    StreamError::Closed => Error::Stream("output stream closed".to_string()),
                    StreamError::LastOperationFailed(e) => Error::Stream(e),
                })?;
            writes += 1;
        }
    }
    drop(stream);
    body.finish()?;
    Ok(writes)
}
