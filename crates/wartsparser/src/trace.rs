use crate::address::AddressTable;
use crate::reader::BodyReader;
use crate::types::*;

/// Decode a traceroute body: its parameter block, then a `u16` count of hop
/// records, then each hop with its own parameter block.
///
/// Attribute sections after the hops (PMTUD, last-ditch, doubletree) are not
/// decoded; the framer discards whatever the body has left.
pub(crate) fn decode_traceroute(
    r: &mut BodyReader<'_>,
    table: &mut AddressTable,
) -> Result<Record, ParseError> {
    let mut t = Traceroute::default();

    let mut block = r.params()?;
    for flag in block.flags.iter() {
        let p = &mut block.reader;
        match flag {
            1 => t.list_id = Some(p.u32("trace.list_id")?),
            2 => t.cycle_id = Some(p.u32("trace.cycle_id")?),
            3 => p.legacy_address("trace.src_gid")?,
            4 => p.legacy_address("trace.dst_gid")?,
            5 => t.start_time = Some(p.timeval("trace.start")?),
            6 => t.stop_reason = Some(p.u8("trace.stop_reason")?),
            7 => t.stop_data = Some(p.u8("trace.stop_data")?),
            8 => t.trace_flags = Some(p.u8("trace.flags")?),
            9 => t.attempts = Some(p.u8("trace.attempts")?),
            10 => t.hop_limit = Some(p.u8("trace.hop_limit")?),
            11 => t.trace_type = Some(p.u8("trace.type")?),
            12 => t.probe_size = Some(p.u16("trace.probe_size")?),
            13 => t.src_port = Some(p.u16("trace.src_port")?),
            14 => t.dst_port = Some(p.u16("trace.dst_port")?),
            15 => t.first_ttl = Some(p.u8("trace.first_ttl")?),
            16 => t.ip_tos = Some(p.u8("trace.ip_tos")?),
            17 => t.probe_timeout = Some(p.u8("trace.probe_timeout")?),
            18 => t.loops = Some(p.u8("trace.loops")?),
            19 => t.hop_count = Some(p.u16("trace.hop_count")?),
            20 => t.gap_limit = Some(p.u8("trace.gap_limit")?),
            21 => t.gap_action = Some(p.u8("trace.gap_action")?),
            22 => t.loop_action = Some(p.u8("trace.loop_action")?),
            23 => t.probes_sent = Some(p.u16("trace.probes_sent")?),
            24 => t.probe_interval = Some(p.u8("trace.probe_interval")?),
            25 => t.confidence = Some(p.u8("trace.confidence")?),
            26 => t.src = Some(p.address(table, "trace.src")?),
            27 => t.dst = Some(p.address(table, "trace.dst")?),
            28 => t.user_id = Some(p.u32("trace.user_id")?),
            29 => t.ip_offset = Some(p.u16("trace.ip_offset")?),
            other => {
                t.skipped_flags = block.skipped_from(other);
                break;
            }
        }
    }

    let hop_records = r.u16("trace.hop_records")?;
    log::debug!("found {} traceroute hops", hop_records);
    t.hops = Vec::with_capacity(hop_records as usize);
    for _ in 0..hop_records {
        t.hops.push(decode_hop(r, table)?);
    }

    if !r.is_empty() {
        log::trace!("leaving {} bytes of traceroute attributes", r.remaining());
    }

    Ok(Record::Traceroute(t))
}

fn decode_hop(
    r: &mut BodyReader<'_>,
    table: &mut AddressTable,
) -> Result<TracerouteHop, ParseError> {
    let mut hop = TracerouteHop::default();

    let mut block = r.params()?;
    for flag in block.flags.iter() {
        let p = &mut block.reader;
        match flag {
            1 => p.legacy_address("hop.addr_gid")?,
            2 => hop.probe_ttl = Some(p.u8("hop.probe_ttl")?),
            3 => hop.reply_ttl = Some(p.u8("hop.reply_ttl")?),
            4 => hop.hop_flags = Some(p.u8("hop.flags")?),
            5 => hop.probe_id = Some(p.u8("hop.probe_id")?),
            6 => hop.rtt = Some(p.u32("hop.rtt")?),
            7 => hop.icmp_type_code = Some(p.u16("hop.icmp_type_code")?),
            8 => hop.probe_size = Some(p.u16("hop.probe_size")?),
            9 => hop.reply_size = Some(p.u16("hop.reply_size")?),
            10 => hop.reply_ip_id = Some(p.u16("hop.reply_ip_id")?),
            11 => hop.tos = Some(p.u8("hop.tos")?),
            12 => hop.next_hop_mtu = Some(p.u16("hop.next_hop_mtu")?),
            13 => hop.quoted_ip_length = Some(p.u16("hop.quoted_ip_length")?),
            14 => hop.quoted_ttl = Some(p.u8("hop.quoted_ttl")?),
            15 => hop.reply_tcp_flags = Some(p.u8("hop.reply_tcp_flags")?),
            16 => hop.quoted_tos = Some(p.u8("hop.quoted_tos")?),
            17 => hop.icmp_extensions = Some(p.icmp_extensions("hop.icmpext")?),
            18 => hop.address = Some(p.address(table, "hop.address")?),
            19 => hop.transmit_time = Some(p.timeval("hop.transmit_time")?),
            other => {
                hop.skipped_flags = block.skipped_from(other);
                break;
            }
        }
    }

    Ok(hop)
}
