use std::fmt;

use crate::address::Address;

// === Error types ===

/// Where in the stream a decode failure happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Absolute byte offset from the start of the stream.
    pub offset: u64,
    /// Type code of the record being decoded, if the header was read.
    pub record_type: Option<u16>,
    /// Name of the field (or structure) being read.
    pub field: &'static str,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record_type {
            Some(t) => write!(
                f,
                "`{}` of record type 0x{:04x} at offset {}",
                self.field, t, self.offset
            ),
            None => write!(f, "`{}` at offset {}", self.field, self.offset),
        }
    }
}

/// Errors that can occur while decoding a warts stream.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Reached end of stream at a clean record boundary (no more records).
    #[error("end of stream")]
    EndOfStream,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated {0}")]
    Truncated(Position),

    #[error("invalid magic 0x{magic:04x} at offset {offset}")]
    BadMagic { offset: u64, magic: u16 },

    #[error("record at offset {offset} declares {length} bytes, limit is {limit}")]
    RecordTooLarge { offset: u64, length: u32, limit: u32 },

    #[error("invalid address reference {index} in {at}")]
    BadReference { at: Position, index: u32 },

    #[error("legacy address encoding is not supported ({0})")]
    UnsupportedLegacyAddress(Position),

    #[error("invalid value for {at}: {reason}")]
    InvalidFieldValue { at: Position, reason: String },

    /// A previous call failed in a way that left no record boundary to
    /// resume from.
    #[error("session aborted after a fatal error")]
    SessionAborted,
}

impl ParseError {
    /// Reports whether the session can no longer continue after this error.
    ///
    /// Errors raised while decoding a record body are recoverable: the body
    /// was already sliced by its declared length, so the next call starts at
    /// the following record header. An oversized record is recoverable for
    /// the same reason; its body is skipped rather than buffered.
    pub fn is_fatal(&self) -> bool {
        match self {
            ParseError::BadMagic { .. } | ParseError::SessionAborted => true,
            ParseError::Io(e) => e.kind() != std::io::ErrorKind::WouldBlock,
            ParseError::Truncated(pos) => pos.record_type.is_none(),
            _ => false,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ParseError::EndOfStream)
    }

    /// The source has no bytes available right now but is not closed.
    pub fn is_would_block(&self) -> bool {
        matches!(self, ParseError::Io(e) if e.kind() == std::io::ErrorKind::WouldBlock)
    }
}

// === Basic types ===

/// A timestamp as stored on the wire: seconds and microseconds since the
/// Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeval {
    pub seconds: u32,
    pub micros: u32,
}

/// One undecoded ICMP extension object attached to a traceroute hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpExtension {
    pub class: u8,
    pub kind: u8,
    pub data: Vec<u8>,
}

// === Records ===

/// A decoded warts record.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    List(List),
    CycleStart(Cycle),
    CycleDefinition(Cycle),
    CycleStop(CycleStop),
    Traceroute(Traceroute),
    Ping(Ping),
    /// A record whose type code has no registered decoder.
    Opaque(OpaqueRecord),
}

impl Record {
    /// The wire type code this record was read from.
    pub fn type_code(&self) -> u16 {
        match self {
            Record::List(_) => crate::registry::TYPE_LIST,
            Record::CycleStart(_) => crate::registry::TYPE_CYCLE_START,
            Record::CycleDefinition(_) => crate::registry::TYPE_CYCLE_DEFINITION,
            Record::CycleStop(_) => crate::registry::TYPE_CYCLE_STOP,
            Record::Traceroute(_) => crate::registry::TYPE_TRACEROUTE,
            Record::Ping(_) => crate::registry::TYPE_PING,
            Record::Opaque(o) => o.type_code,
        }
    }
}

/// A record of unknown type, preserved byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueRecord {
    pub type_code: u16,
    pub body: Vec<u8>,
}

/// A named list of measurement targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    /// File-local list id, referenced by later records.
    pub list_id: u32,
    /// Id assigned by the operator.
    pub human_id: u32,
    pub name: String,
    pub description: Option<String>,
    pub monitor: Option<String>,
    pub skipped_flags: Vec<u16>,
}

/// Start or definition of a measurement cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub cycle_id: u32,
    pub list_id: u32,
    pub human_id: u32,
    pub start_time: u32,
    pub stop_time: Option<u32>,
    pub hostname: Option<String>,
    pub skipped_flags: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleStop {
    pub cycle_id: u32,
    pub stop_time: u32,
    pub skipped_flags: Vec<u16>,
}

/// A traceroute measurement and its hops, in wire order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Traceroute {
    pub list_id: Option<u32>,
    pub cycle_id: Option<u32>,
    pub start_time: Option<Timeval>,
    pub stop_reason: Option<u8>,
    pub stop_data: Option<u8>,
    pub trace_flags: Option<u8>,
    pub attempts: Option<u8>,
    pub hop_limit: Option<u8>,
    pub trace_type: Option<u8>,
    pub probe_size: Option<u16>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub first_ttl: Option<u8>,
    pub ip_tos: Option<u8>,
    pub probe_timeout: Option<u8>,
    pub loops: Option<u8>,
    /// Number of hops probed, as reported by the measurement.
    pub hop_count: Option<u16>,
    pub gap_limit: Option<u8>,
    pub gap_action: Option<u8>,
    pub loop_action: Option<u8>,
    pub probes_sent: Option<u16>,
    pub probe_interval: Option<u8>,
    pub confidence: Option<u8>,
    pub src: Option<Address>,
    pub dst: Option<Address>,
    pub user_id: Option<u32>,
    pub ip_offset: Option<u16>,
    pub hops: Vec<TracerouteHop>,
    pub skipped_flags: Vec<u16>,
}

/// One response (or probe) recorded for a traceroute.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TracerouteHop {
    pub probe_ttl: Option<u8>,
    pub reply_ttl: Option<u8>,
    pub hop_flags: Option<u8>,
    pub probe_id: Option<u8>,
    /// Round-trip time in microseconds.
    pub rtt: Option<u32>,
    pub icmp_type_code: Option<u16>,
    pub probe_size: Option<u16>,
    pub reply_size: Option<u16>,
    pub reply_ip_id: Option<u16>,
    pub tos: Option<u8>,
    pub next_hop_mtu: Option<u16>,
    pub quoted_ip_length: Option<u16>,
    pub quoted_ttl: Option<u8>,
    pub reply_tcp_flags: Option<u8>,
    pub quoted_tos: Option<u8>,
    pub icmp_extensions: Option<Vec<IcmpExtension>>,
    pub address: Option<Address>,
    pub transmit_time: Option<Timeval>,
    pub skipped_flags: Vec<u16>,
}

/// A ping measurement and its replies, in wire order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ping {
    pub list_id: Option<u32>,
    pub cycle_id: Option<u32>,
    pub start_time: Option<Timeval>,
    pub stop_reason: Option<u8>,
    pub stop_data: Option<u8>,
    pub data_length: Option<u16>,
    pub data: Option<Vec<u8>>,
    pub probe_count: Option<u16>,
    pub probe_size: Option<u16>,
    pub probe_wait: Option<u8>,
    pub probe_ttl: Option<u8>,
    pub reply_count: Option<u16>,
    pub pings_sent: Option<u16>,
    pub probe_method: Option<u8>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub user_id: Option<u32>,
    pub src: Option<Address>,
    pub dst: Option<Address>,
    pub ping_flags: Option<u8>,
    pub probe_tos: Option<u8>,
    pub replies: Vec<PingReply>,
    pub skipped_flags: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PingReply {
    pub reply_flags: Option<u8>,
    pub reply_ttl: Option<u8>,
    pub reply_size: Option<u16>,
    pub icmp_type_code: Option<u16>,
    /// Round-trip time in microseconds.
    pub rtt: Option<u32>,
    pub probe_id: Option<u16>,
    pub reply_ip_id: Option<u16>,
    pub probe_ip_id: Option<u16>,
    pub reply_proto: Option<u8>,
    pub reply_tcp_flags: Option<u8>,
    pub address: Option<Address>,
    pub skipped_flags: Vec<u16>,
}
