use std::collections::HashMap;

use crate::address::AddressTable;
use crate::reader::BodyReader;
use crate::types::{ParseError, Record};
use crate::{meta, ping, trace};

// Record type codes (wire format).
pub const TYPE_LIST: u16 = 0x0001;
pub const TYPE_CYCLE_START: u16 = 0x0002;
pub const TYPE_CYCLE_DEFINITION: u16 = 0x0003;
pub const TYPE_CYCLE_STOP: u16 = 0x0004;
pub const TYPE_ADDRESS: u16 = 0x0005;
pub const TYPE_TRACEROUTE: u16 = 0x0006;
pub const TYPE_PING: u16 = 0x0007;

/// Decodes one record body. The reader covers exactly the body bytes.
pub type DecodeFn = fn(&mut BodyReader<'_>, &mut AddressTable) -> Result<Record, ParseError>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("a decoder for record type 0x{0:04x} is already registered")]
    Duplicate(u16),
}

/// Maps record type codes to their decoders. Read-only once built.
#[derive(Clone)]
pub struct Registry {
    decoders: HashMap<u16, DecodeFn>,
}

impl Registry {
    /// The decoders for every record type this crate understands.
    pub fn standard() -> Self {
        RegistryBuilder::standard().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, type_code: u16) -> Option<DecodeFn> {
        self.decoders.get(&type_code).copied()
    }

    pub fn contains(&self, type_code: u16) -> bool {
        self.decoders.contains_key(&type_code)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("types", &sorted_codes(&self.decoders))
            .finish()
    }
}

fn sorted_codes(decoders: &HashMap<u16, DecodeFn>) -> Vec<u16> {
    let mut codes: Vec<_> = decoders.keys().copied().collect();
    codes.sort_unstable();
    codes
}

#[derive(Default)]
pub struct RegistryBuilder {
    decoders: HashMap<u16, DecodeFn>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder pre-populated with the standard decoders.
    pub fn standard() -> Self {
        let decoders: [(u16, DecodeFn); 7] = [
            (TYPE_LIST, meta::decode_list),
            (TYPE_CYCLE_START, meta::decode_cycle_start),
            (TYPE_CYCLE_DEFINITION, meta::decode_cycle_definition),
            (TYPE_CYCLE_STOP, meta::decode_cycle_stop),
            (TYPE_ADDRESS, meta::decode_legacy_address),
            (TYPE_TRACEROUTE, trace::decode_traceroute),
            (TYPE_PING, ping::decode_ping),
        ];
        Self {
            decoders: decoders.into_iter().collect(),
        }
    }

    /// Add a decoder. A type code can only be registered once.
    pub fn register(mut self, type_code: u16, decoder: DecodeFn) -> Result<Self, RegistryError> {
        if self.decoders.contains_key(&type_code) {
            return Err(RegistryError::Duplicate(type_code));
        }
        self.decoders.insert(type_code, decoder);
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            decoders: self.decoders,
        }
    }
}

impl std::fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("types", &sorted_codes(&self.decoders))
            .finish()
    }
}
