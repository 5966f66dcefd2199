use crate::address::{Address, AddressTable};
use crate::flags::FlagSet;
use crate::types::{IcmpExtension, ParseError, Position, Timeval};

/// A bounded reader over one record body (or a slice of one).
///
/// Every read is checked against the end of the slice; running past it is a
/// `Truncated` error carrying the absolute stream offset of the failing read.
#[derive(Debug)]
pub struct BodyReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Absolute stream offset of `data[0]`.
    base: u64,
    record_type: u16,
}

/// The flags of one parameter block, and a reader bounded to that block.
///
/// The parent reader has already been advanced past the whole block, so a
/// decoder that stops early (on a flag it does not know) leaves the parent
/// positioned at the first byte after the block.
#[derive(Debug)]
pub struct ParamBlock<'a> {
    pub flags: FlagSet,
    pub reader: BodyReader<'a>,
}

impl ParamBlock<'_> {
    /// The set flags from `first` upward, recorded when decoding stops at an
    /// unknown flag.
    pub fn skipped_from(&self, first: u16) -> Vec<u16> {
        let skipped: Vec<u16> = self.flags.iter().filter(|f| *f >= first).collect();
        log::debug!(
            "skipping unknown flags {:?} ({} bytes left in parameter block)",
            skipped,
            self.reader.remaining()
        );
        skipped
    }
}

impl<'a> BodyReader<'a> {
    pub fn new(data: &'a [u8], base: u64, record_type: u16) -> Self {
        Self {
            data,
            pos: 0,
            base,
            record_type,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn at(&self, pos: usize, field: &'static str) -> Position {
        Position {
            offset: self.base + pos as u64,
            record_type: Some(self.record_type),
            field,
        }
    }

    pub fn invalid(&self, field: &'static str, reason: impl Into<String>) -> ParseError {
        ParseError::InvalidFieldValue {
            at: self.at(self.pos, field),
            reason: reason.into(),
        }
    }

    pub fn legacy(&self, field: &'static str) -> ParseError {
        ParseError::UnsupportedLegacyAddress(self.at(self.pos, field))
    }

    /// Read n bytes as a slice of the body.
    pub fn bytes(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], ParseError> {
        if n > self.remaining() {
            return Err(ParseError::Truncated(self.at(self.data.len(), field)));
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    /// Split off the next `len` bytes as their own bounded reader.
    fn sub(&mut self, len: usize, field: &'static str) -> Result<BodyReader<'a>, ParseError> {
        if len > self.remaining() {
            return Err(self.invalid(
                field,
                format!("length {} exceeds the {} bytes remaining", len, self.remaining()),
            ));
        }
        let base = self.base + self.pos as u64;
        let data = self.bytes(len, field)?;
        Ok(BodyReader::new(data, base, self.record_type))
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8, ParseError> {
        Ok(self.bytes(1, field)?[0])
    }

    /// Read a big-endian u16.
    pub fn u16(&mut self, field: &'static str) -> Result<u16, ParseError> {
        let b = self.bytes(2, field)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian u32.
    pub fn u32(&mut self, field: &'static str) -> Result<u32, ParseError> {
        let b = self.bytes(4, field)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn timeval(&mut self, field: &'static str) -> Result<Timeval, ParseError> {
        let seconds = self.u32(field)?;
        let micros = self.u32(field)?;
        if micros >= 1_000_000 {
            return Err(self.invalid(field, format!("{} microseconds", micros)));
        }
        Ok(Timeval { seconds, micros })
    }

    /// Read a NUL-terminated string. Invalid UTF-8 is replaced.
    pub fn string(&mut self, field: &'static str) -> Result<String, ParseError> {
        let rest = &self.data[self.pos..];
        let Some(len) = rest.iter().position(|b| *b == 0) else {
            return Err(ParseError::Truncated(self.at(self.data.len(), field)));
        };
        let s = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.pos += len + 1;
        Ok(s)
    }

    /// Read the flag set of a parameter block and split off the block.
    pub fn params(&mut self) -> Result<ParamBlock<'a>, ParseError> {
        let (flags, len) = FlagSet::decode(self)?;
        let reader = match len {
            Some(len) => self.sub(len as usize, "param_len")?,
            None => BodyReader::new(&[], self.base + self.pos as u64, self.record_type),
        };
        Ok(ParamBlock { flags, reader })
    }

    /// Read an address field: either a literal, which is appended to the
    /// table, or a reference to an address appended earlier.
    pub fn address(
        &mut self,
        table: &mut AddressTable,
        field: &'static str,
    ) -> Result<Address, ParseError> {
        let start = self.pos;
        let len = self.u8(field)?;
        if len == 0 {
            // Wire ids count from 0, table indices from 1.
            let index = self.u32(field)?.saturating_add(1);
            return table
                .resolve(index)
                .copied()
                .map_err(|e| ParseError::BadReference {
                    at: self.at(start, field),
                    index: e.index,
                });
        }
        let family = self.u8(field)?;
        let raw = self.bytes(len as usize, field)?;
        let addr = Address::from_wire(family, raw).ok_or_else(|| ParseError::InvalidFieldValue {
            at: self.at(start, field),
            reason: format!("address family 0x{:02x} with {} bytes", family, len),
        })?;
        table.append(addr);
        Ok(addr)
    }

    /// Reject a deprecated global address id field.
    pub fn legacy_address(&mut self, field: &'static str) -> Result<(), ParseError> {
        let err = self.legacy(field);
        self.u32(field)?;
        Err(err)
    }

    /// Read a block of ICMP extensions (RFC 4884 objects), left undecoded.
    pub fn icmp_extensions(
        &mut self,
        field: &'static str,
    ) -> Result<Vec<IcmpExtension>, ParseError> {
        let total = self.u16(field)?;
        let mut block = self.sub(total as usize, field)?;
        let mut extensions = Vec::new();
        while !block.is_empty() {
            let len = block.u16(field)?;
            let class = block.u8(field)?;
            let kind = block.u8(field)?;
            if len as usize > block.remaining() {
                return Err(block.invalid(field, "extension overruns its block"));
            }
            let data = block.bytes(len as usize, field)?.to_vec();
            extensions.push(IcmpExtension { class, kind, data });
        }
        Ok(extensions)
    }
}
