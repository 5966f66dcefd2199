//! Byte builders and sources shared by the unit tests.

use std::io::{ErrorKind, Read};

/// Encode a flag set followed by its parameter block.
pub(crate) fn params(flags: &[u16], block: &[u8]) -> Vec<u8> {
    let mut groups = vec![0u8];
    for &f in flags {
        let idx = ((f - 1) / 7) as usize;
        if groups.len() <= idx {
            groups.resize(idx + 1, 0);
        }
        groups[idx] |= 1u8 << ((f - 1) % 7);
    }
    let last = groups.len() - 1;
    for g in &mut groups[..last] {
        *g |= 0x80;
    }
    let mut out = groups;
    if !flags.is_empty() {
        out.extend_from_slice(&(block.len() as u16).to_be_bytes());
        out.extend_from_slice(block);
    }
    out
}

/// An inline IPv4 address field.
pub(crate) fn literal_v4(a: [u8; 4]) -> Vec<u8> {
    let mut out = vec![4, 0x01];
    out.extend_from_slice(&a);
    out
}

/// A back-reference address field naming wire id `id`.
pub(crate) fn reference(id: u32) -> Vec<u8> {
    let mut out = vec![0];
    out.extend_from_slice(&id.to_be_bytes());
    out
}

/// A complete record: header followed by body.
pub(crate) fn record(type_code: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0x1205u16.to_be_bytes());
    out.extend_from_slice(&type_code.to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// A source that hands out its data chunk by chunk and fails with
/// `WouldBlock` once after each chunk is used up, like a non-blocking pipe
/// whose writer is slower than the reader.
pub(crate) struct Trickle {
    chunks: Vec<Vec<u8>>,
    stall: bool,
}

impl Trickle {
    pub(crate) fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks,
            stall: false,
        }
    }

    /// Split `data` into chunks ending at each of `cuts`.
    pub(crate) fn split(data: &[u8], cuts: &[usize]) -> Self {
        let mut chunks = Vec::new();
        let mut start = 0;
        for &cut in cuts {
            chunks.push(data[start..cut].to_vec());
            start = cut;
        }
        chunks.push(data[start..].to_vec());
        Self::new(chunks)
    }
}

impl Read for Trickle {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        if self.stall {
            self.stall = false;
            return Err(ErrorKind::WouldBlock.into());
        }
        if self.chunks.is_empty() {
            return Ok(0);
        }
        let chunk = self.chunks.remove(0);
        let n = chunk.len().min(out.len());
        out[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.chunks.insert(0, chunk[n..].to_vec());
        } else {
            self.stall = true;
        }
        Ok(n)
    }
}
