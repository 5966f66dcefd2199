use std::io::Read;

use crate::address::AddressTable;
use crate::cursor::ByteCursor;
use crate::reader::BodyReader;
use crate::registry::Registry;
use crate::types::{OpaqueRecord, ParseError, Position, Record};

pub const MAGIC: u16 = 0x1205;
pub const HEADER_SIZE: usize = 8;

/// Parsed record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub magic: u16,
    pub type_code: u16,
    /// Exact number of body bytes following the header.
    pub body_length: u32,
}

impl RecordHeader {
    fn from_bytes(b: &[u8]) -> Self {
        RecordHeader {
            magic: u16::from_be_bytes([b[0], b[1]]),
            type_code: u16::from_be_bytes([b[2], b[3]]),
            body_length: u32::from_be_bytes([b[4], b[5], b[6], b[7]]),
        }
    }
}

/// Limits applied while reading a stream.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Largest record body accepted, in bytes. A larger record is reported
    /// as `RecordTooLarge` and its body is discarded unread.
    pub max_record_len: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_record_len: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Ended,
    Aborted,
}

/// A decoding session over one warts stream.
///
/// Owns the cursor and the stream's address table. Records are pulled one at
/// a time with [`WartsReader::next_record`].
pub struct WartsReader<R> {
    cursor: ByteCursor<R>,
    table: AddressTable,
    registry: Registry,
    config: ReaderConfig,
    state: State,
    /// End offset of an oversized body still to be discarded.
    skip_to: Option<u64>,
}

impl<R: Read> WartsReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, ReaderConfig::default())
    }

    pub fn with_config(reader: R, config: ReaderConfig) -> Self {
        Self {
            cursor: ByteCursor::new(reader),
            table: AddressTable::new(),
            registry: Registry::standard(),
            config,
            state: State::Open,
            skip_to: None,
        }
    }

    /// Use `registry` instead of the standard decoders.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// The addresses seen so far in this stream.
    pub fn address_table(&self) -> &AddressTable {
        &self.table
    }

    /// Bytes consumed so far. Between successful calls this is a record
    /// boundary; after a `WouldBlock`, an oversized record or a fatal error it
    /// may sit inside a record.
    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    /// Read the next record from the stream.
    ///
    /// Returns `ParseError::EndOfStream` at a clean record boundary with no
    /// more input, and keeps returning it afterwards. An error inside a record
    /// body is returned for that record only: the body was consumed whole,
    /// so the next call starts at the following header. Errors in the header
    /// itself leave no boundary to resume from; they end the session and
    /// every later call returns `ParseError::SessionAborted`.
    ///
    /// A non-blocking source with nothing to read yields an `Io` error of
    /// kind `WouldBlock` (see [`ParseError::is_would_block`]). Nothing is
    /// lost: calling again once data arrives resumes the same record.
    pub fn next_record(&mut self) -> Result<Record, ParseError> {
        match self.state {
            State::Open => {}
            State::Ended => return Err(ParseError::EndOfStream),
            State::Aborted => return Err(ParseError::SessionAborted),
        }
        let result = self.read_record();
        match &result {
            Ok(_) => {}
            Err(ParseError::EndOfStream) => self.state = State::Ended,
            Err(e) if e.is_would_block() => {}
            Err(e) if e.is_fatal() => {
                log::error!("aborting warts stream at offset {}: {}", self.offset(), e);
                self.state = State::Aborted;
            }
            Err(e) => log::warn!("skipping malformed record: {}", e),
        }
        result
    }

    fn read_record(&mut self) -> Result<Record, ParseError> {
        self.finish_skip()?;

        let start = self.cursor.offset();
        let header = RecordHeader::from_bytes(self.cursor.peek(HEADER_SIZE, "record header")?);
        if header.magic != MAGIC {
            return Err(ParseError::BadMagic {
                offset: start,
                magic: header.magic,
            });
        }
        if header.body_length > self.config.max_record_len {
            // The header is already buffered; the body is discarded on the
            // way to the next header.
            self.cursor.skip(HEADER_SIZE as u64)?;
            self.skip_to = Some(start + HEADER_SIZE as u64 + header.body_length as u64);
            return Err(ParseError::RecordTooLarge {
                offset: start,
                length: header.body_length,
                limit: self.config.max_record_len,
            });
        }

        // Buffer header and body together so a source that stalls mid-record
        // can be retried without losing the header.
        let total = HEADER_SIZE + header.body_length as usize;
        let frame = match self.cursor.read_exact(total, "record body") {
            Ok(frame) => frame,
            Err(ParseError::Truncated(pos)) => {
                // The stream ended inside this body; drop what is left of it.
                self.cursor.skip(total as u64)?;
                return Err(ParseError::Truncated(Position {
                    record_type: Some(header.type_code),
                    ..pos
                }));
            }
            Err(e) => return Err(e),
        };
        let body = &frame[HEADER_SIZE..];
        let body_offset = start + HEADER_SIZE as u64;

        log::debug!(
            "record type 0x{:04x} at offset {} ({} bytes)",
            header.type_code,
            start,
            header.body_length
        );

        let Some(decode) = self.registry.get(header.type_code) else {
            log::debug!(
                "keeping unknown record of type 0x{:04x} ({} bytes) as opaque",
                header.type_code,
                header.body_length
            );
            return Ok(Record::Opaque(OpaqueRecord {
                type_code: header.type_code,
                body: body.to_vec(),
            }));
        };

        let mut r = BodyReader::new(body, body_offset, header.type_code);
        let record = decode(&mut r, &mut self.table)?;
        if !r.is_empty() {
            log::trace!(
                "{} trailing bytes in record type 0x{:04x}",
                r.remaining(),
                header.type_code
            );
        }
        Ok(record)
    }

    /// Discard the rest of an oversized body, if one is pending.
    fn finish_skip(&mut self) -> Result<(), ParseError> {
        let Some(end) = self.skip_to else {
            return Ok(());
        };
        let left = end.saturating_sub(self.cursor.offset());
        let skipped = self.cursor.skip(left)?;
        if skipped < left {
            log::debug!("stream ended inside an oversized record");
        }
        self.skip_to = None;
        Ok(())
    }
}

impl<R: Read> Iterator for WartsReader<R> {
    type Item = Result<Record, ParseError>;

    /// Yields records and errors, including `WouldBlock` stalls from a
    /// non-blocking source. Stops at end of stream, or after yielding a fatal
    /// error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Aborted {
            return None;
        }
        match self.next_record() {
            Err(ParseError::EndOfStream) => None,
            other => Some(other),
        }
    }
}

/// Parse the next record from a session.
pub fn parse_record<R: Read>(reader: &mut WartsReader<R>) -> Result<Record, ParseError> {
    reader.next_record()
}
