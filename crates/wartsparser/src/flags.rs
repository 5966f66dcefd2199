//! Decoding of the variable-length flag set that prefixes every optional
//! parameter block.
//!
//! Each flag byte carries seven flags in its low bits; the high bit says
//! whether another flag byte follows. Flag numbers start at 1: bit `b` of
//! flag byte `i` is flag `i * 7 + b + 1`. When any flag is set, a `u16`
//! follows giving the length of the parameter block that holds the flagged
//! fields.

use crate::reader::BodyReader;
use crate::types::ParseError;

const CONTINUATION: u8 = 0x80;
const FLAG_BITS: u16 = 7;
/// Enough flag bytes to number every flag with a `u16`.
const MAX_FLAG_BYTES: usize = (u16::MAX / FLAG_BITS) as usize;

/// The set of optional fields present in one parameter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    /// One entry per flag byte, continuation bit stripped.
    groups: Vec<u8>,
}

impl FlagSet {
    /// Build a flag set from explicit flag numbers. Numbering starts at 1;
    /// a 0 names no flag and is ignored.
    pub fn from_numbers(numbers: &[u16]) -> Self {
        let mut groups = Vec::new();
        for &n in numbers.iter().filter(|n| **n > 0) {
            let idx = ((n - 1) / FLAG_BITS) as usize;
            if groups.len() <= idx {
                groups.resize(idx + 1, 0);
            }
            groups[idx] |= 1u8 << ((n - 1) % FLAG_BITS);
        }
        Self { groups }
    }

    /// Decode the flag bytes and, if any flag is set, the parameter block
    /// length that follows them.
    pub(crate) fn decode(r: &mut BodyReader<'_>) -> Result<(FlagSet, Option<u16>), ParseError> {
        let mut groups = Vec::new();
        loop {
            let byte = r.u8("flags")?;
            groups.push(byte & !CONTINUATION);
            if byte & CONTINUATION == 0 {
                break;
            }
            if groups.len() >= MAX_FLAG_BYTES {
                return Err(r.invalid("flags", "flag chain too long"));
            }
        }
        let flags = FlagSet { groups };
        if flags.is_empty() {
            return Ok((flags, None));
        }
        let param_len = r.u16("param_len")?;
        Ok((flags, Some(param_len)))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| *g == 0)
    }

    pub fn contains(&self, number: u16) -> bool {
        if number == 0 {
            return false;
        }
        let idx = ((number - 1) / FLAG_BITS) as usize;
        let bit = (number - 1) % FLAG_BITS;
        self.groups
            .get(idx)
            .map_or(false, |g| g & (1u8 << bit) != 0)
    }

    /// Iterate over the set flag numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.groups.iter().enumerate().flat_map(|(idx, g)| {
            (0..FLAG_BITS)
                .filter(move |&bit| g & (1u8 << bit) != 0)
                .map(move |bit| idx as u16 * FLAG_BITS + bit + 1)
        })
    }

    /// Number of flag bytes this set occupied on the wire.
    pub fn wire_len(&self) -> usize {
        self.groups.len().max(1)
    }
}
