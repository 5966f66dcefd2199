//! Decoder for warts, the binary format scamper uses to record network
//! measurements (traceroutes, pings, and the lists and cycles around them).
//!
//! # Protocol
//!
//! A warts stream is a sequence of records, each an 8-byte header followed
//! by a body of exactly the declared length. Integers are big-endian.
//!
//! | Offset | Size | Field       |
//! |--------|------|-------------|
//! | 0      | 2    | Magic 0x1205|
//! | 2      | 2    | Record type |
//! | 4      | 4    | Body length |
//! | 8      | N    | Body        |
//!
//! Optional fields inside a body are announced by a flag set followed by the
//! length of the parameter block holding them, so fields and record types
//! this crate does not know are skipped rather than misread. Addresses are
//! written in full the first time they appear in a stream and referenced by
//! index afterwards.
//!
//! # Usage
//!
//! ```no_run
//! use warts_parser::{ParseError, Record, WartsReader};
//!
//! let data: &[u8] = &[/* warts bytes */];
//! let mut reader = WartsReader::new(data);
//!
//! loop {
//!     match reader.next_record() {
//!         Ok(Record::Traceroute(t)) => println!("{} hops", t.hops.len()),
//!         Ok(record) => println!("{:?}", record),
//!         Err(ParseError::EndOfStream) => break,
//!         Err(e) if e.is_would_block() => continue,
//!         Err(e) if e.is_fatal() => panic!("{}", e),
//!         Err(e) => eprintln!("skipped record: {}", e),
//!     }
//! }
//! ```

pub mod address;
pub mod cursor;
pub mod flags;
pub mod registry;
pub mod types;
mod framer;
mod meta;
mod ping;
mod reader;
mod trace;

#[cfg(test)]
mod testutil;

pub use address::{Address, AddressTable};
pub use cursor::ByteCursor;
pub use flags::FlagSet;
pub use framer::{parse_record, ReaderConfig, RecordHeader, WartsReader, HEADER_SIZE, MAGIC};
pub use reader::{BodyReader, ParamBlock};
pub use registry::{DecodeFn, Registry, RegistryBuilder, RegistryError};
pub use types::*;
