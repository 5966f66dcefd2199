use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

// Address family tags (wire format).
pub(crate) const FAMILY_IPV4: u8 = 0x01;
pub(crate) const FAMILY_IPV6: u8 = 0x02;
pub(crate) const FAMILY_ETHERNET: u8 = 0x03;
pub(crate) const FAMILY_FIREWIRE: u8 = 0x04;

/// A network address as recorded in a warts stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
    Ethernet([u8; 6]),
    FireWire([u8; 8]),
}

impl Address {
    /// Build an address from its family tag and raw bytes.
    ///
    /// Returns `None` for an unknown family or a length that does not match
    /// the family.
    pub fn from_wire(family: u8, bytes: &[u8]) -> Option<Address> {
        match family {
            FAMILY_IPV4 => {
                let octets: [u8; 4] = bytes.try_into().ok()?;
                Some(Address::V4(Ipv4Addr::from(octets)))
            }
            FAMILY_IPV6 => {
                let octets: [u8; 16] = bytes.try_into().ok()?;
                Some(Address::V6(Ipv6Addr::from(octets)))
            }
            FAMILY_ETHERNET => Some(Address::Ethernet(bytes.try_into().ok()?)),
            FAMILY_FIREWIRE => Some(Address::FireWire(bytes.try_into().ok()?)),
            _ => None,
        }
    }

    pub fn family(&self) -> u8 {
        match self {
            Address::V4(_) => FAMILY_IPV4,
            Address::V6(_) => FAMILY_IPV6,
            Address::Ethernet(_) => FAMILY_ETHERNET,
            Address::FireWire(_) => FAMILY_FIREWIRE,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::V4(a) => fmt::Display::fmt(a, f),
            Address::V6(a) => fmt::Display::fmt(a, f),
            Address::Ethernet(b) => write_hex(f, b),
            Address::FireWire(b) => write_hex(f, b),
        }
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            f.write_str(":")?;
        }
        write!(f, "{:02x}", b)?;
    }
    Ok(())
}

/// A back-reference that does not name an address seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadReference {
    pub index: u32,
    pub len: usize,
}

/// The addresses decoded so far in one stream, in the order they appeared.
///
/// Indices start at 1; index 0 never names an address. The table only grows:
/// a later record may refer back to any earlier address.
#[derive(Debug, Default)]
pub struct AddressTable {
    entries: Vec<Address>,
}

impl AddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly decoded address and return its index.
    pub fn append(&mut self, address: Address) -> u32 {
        self.entries.push(address);
        self.entries.len() as u32
    }

    /// Look up a previously appended address.
    pub fn resolve(&self, index: u32) -> Result<&Address, BadReference> {
        let err = BadReference {
            index,
            len: self.entries.len(),
        };
        if index == 0 {
            return Err(err);
        }
        self.entries.get(index as usize - 1).ok_or(err)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.entries.iter()
    }
}
