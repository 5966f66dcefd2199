use std::io::{ErrorKind, Read};

use crate::types::{ParseError, Position};

/// Largest single read issued to the source.
const READ_CHUNK: usize = 64 * 1024;

/// A forward-only reader over a byte source that tracks how many bytes have
/// been consumed.
///
/// Bytes are pulled from the source only when a read or peek asks for them,
/// so at most one requested span (a header or a record body) is buffered.
/// If the source returns `WouldBlock` part-way through a span, the bytes
/// already pulled stay buffered and the next attempt picks up from there.
pub struct ByteCursor<R> {
    inner: R,
    buf: Vec<u8>,
    offset: u64,
}

impl<R: Read> ByteCursor<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            offset: 0,
        }
    }

    /// Number of bytes consumed since the start of the stream.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of bytes pulled from the source but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Pull from the source until `n` bytes are buffered or the source is
    /// exhausted. Returns the number of buffered bytes.
    ///
    /// The buffer grows by at most `READ_CHUNK` per read, so a large declared
    /// length costs memory only as its bytes arrive.
    fn fill(&mut self, n: usize) -> std::io::Result<usize> {
        while self.buf.len() < n {
            let start = self.buf.len();
            let want = (n - start).min(READ_CHUNK);
            self.buf.resize(start + want, 0);
            match self.inner.read(&mut self.buf[start..]) {
                Ok(read) => {
                    self.buf.truncate(start + read);
                    if read == 0 {
                        break;
                    }
                }
                Err(e) => {
                    self.buf.truncate(start);
                    if e.kind() != ErrorKind::Interrupted {
                        return Err(e);
                    }
                }
            }
        }
        Ok(self.buf.len())
    }

    /// Look at the next `n` bytes without consuming them.
    ///
    /// Returns `EndOfStream` if the source has no more bytes at all and
    /// `Truncated` if it ends after some but fewer than `n` bytes.
    pub fn peek(&mut self, n: usize, field: &'static str) -> Result<&[u8], ParseError> {
        let available = self.fill(n)?;
        if available == 0 && n > 0 {
            return Err(ParseError::EndOfStream);
        }
        if available < n {
            return Err(ParseError::Truncated(Position {
                offset: self.offset + available as u64,
                record_type: None,
                field,
            }));
        }
        Ok(&self.buf[..n])
    }

    /// Consume exactly `n` bytes.
    pub fn read_exact(&mut self, n: usize, field: &'static str) -> Result<Vec<u8>, ParseError> {
        self.peek(n, field)?;
        self.offset += n as u64;
        if self.buf.len() == n {
            Ok(std::mem::take(&mut self.buf))
        } else {
            Ok(self.buf.drain(..n).collect())
        }
    }

    /// Consume up to `n` bytes and discard them, returning how many were
    /// skipped before the source ran out.
    ///
    /// Discarded bytes are read in `READ_CHUNK` pieces and never buffered
    /// whole. On an I/O error the bytes skipped so far are already counted in
    /// [`ByteCursor::offset`].
    pub fn skip(&mut self, n: u64) -> Result<u64, ParseError> {
        let mut skipped = 0;
        while skipped < n {
            let filled = if self.buf.is_empty() {
                let want = (n - skipped).min(READ_CHUNK as u64) as usize;
                self.fill(want)
            } else {
                Ok(self.buf.len())
            };
            let take = (self.buf.len() as u64).min(n - skipped) as usize;
            self.buf.drain(..take);
            self.offset += take as u64;
            skipped += take as u64;
            match filled {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Trickle;
    use assert_matches::assert_matches;

    #[test]
    fn test_read_exact_tracks_offset() {
        let mut c = ByteCursor::new(&[1u8, 2, 3, 4, 5][..]);
        assert_eq!(c.read_exact(2, "a").unwrap(), vec![1, 2]);
        assert_eq!(c.offset(), 2);
        assert_eq!(c.read_exact(3, "b").unwrap(), vec![3, 4, 5]);
        assert_eq!(c.offset(), 5);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut c = ByteCursor::new(&[9u8, 8, 7][..]);
        assert_eq!(c.peek(2, "a").unwrap(), &[9, 8]);
        assert_eq!(c.offset(), 0);
        assert_eq!(c.read_exact(3, "a").unwrap(), vec![9, 8, 7]);
    }

    #[test]
    fn test_clean_eof_vs_truncated() {
        let mut c = ByteCursor::new(&[][..]);
        assert_matches!(c.read_exact(4, "header"), Err(ParseError::EndOfStream));

        let mut c = ByteCursor::new(&[1u8, 2][..]);
        let err = c.read_exact(4, "header").unwrap_err();
        assert_matches!(err, ParseError::Truncated(pos) if pos.offset == 2 && pos.field == "header");
    }

    #[test]
    fn test_would_block_keeps_partial_bytes() {
        let mut c = ByteCursor::new(Trickle::new(vec![vec![1, 2], vec![3, 4]]));
        let err = c.read_exact(4, "header").unwrap_err();
        assert_matches!(err, ParseError::Io(ref e) if e.kind() == ErrorKind::WouldBlock);
        assert_eq!(c.buffered(), 2);
        assert_eq!(c.offset(), 0);
        assert_eq!(c.read_exact(4, "header").unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(c.offset(), 4);
    }

    #[test]
    fn test_skip_short() {
        let mut c = ByteCursor::new(&[1u8, 2, 3][..]);
        assert_eq!(c.skip(10).unwrap(), 3);
        assert_eq!(c.offset(), 3);
        assert_matches!(c.peek(1, "x"), Err(ParseError::EndOfStream));
    }

    #[test]
    fn test_skip_large_span_in_pieces() {
        let data = vec![0x5Au8; 3 * READ_CHUNK + 17];
        let mut c = ByteCursor::new(&data[..]);
        assert_eq!(c.skip(3 * READ_CHUNK as u64).unwrap(), 3 * READ_CHUNK as u64);
        assert_eq!(c.buffered(), 0);
        assert_eq!(c.read_exact(17, "tail").unwrap(), vec![0x5A; 17]);
    }

    #[test]
    fn test_skip_resumes_after_would_block() {
        let mut c = ByteCursor::new(Trickle::new(vec![vec![1, 2, 3], vec![4, 5, 6]]));
        let err = c.skip(5).unwrap_err();
        assert_matches!(err, ParseError::Io(ref e) if e.kind() == ErrorKind::WouldBlock);
        assert_eq!(c.offset(), 3);
        assert_eq!(c.skip(2).unwrap(), 2);
        assert_eq!(c.read_exact(1, "last").unwrap(), vec![6]);
    }

    #[test]
    fn test_large_declared_length_does_not_preallocate() {
        // Only 4 bytes exist behind a request for 16 MiB.
        let mut c = ByteCursor::new(&[1u8, 2, 3, 4][..]);
        assert_matches!(c.peek(16 * 1024 * 1024, "body"), Err(ParseError::Truncated(_)));
        assert_eq!(c.buffered(), 4);
        assert!(c.buf.capacity() < 16 * 1024 * 1024);
    }
}
