use crate::address::AddressTable;
use crate::reader::BodyReader;
use crate::types::*;

/// Decode a ping body: its parameter block, then a `u16` count of reply
/// records, then each reply with its own parameter block.
pub(crate) fn decode_ping(
    r: &mut BodyReader<'_>,
    table: &mut AddressTable,
) -> Result<Record, ParseError> {
    let mut ping = Ping::default();

    let mut block = r.params()?;
    for flag in block.flags.iter() {
        let p = &mut block.reader;
        match flag {
            1 => ping.list_id = Some(p.u32("ping.list_id")?),
            2 => ping.cycle_id = Some(p.u32("ping.cycle_id")?),
            3 => p.legacy_address("ping.src_gid")?,
            4 => p.legacy_address("ping.dst_gid")?,
            5 => ping.start_time = Some(p.timeval("ping.start")?),
            6 => ping.stop_reason = Some(p.u8("ping.stop_reason")?),
            7 => ping.stop_data = Some(p.u8("ping.stop_data")?),
            8 => ping.data_length = Some(p.u16("ping.data_length")?),
            9 => {
                let Some(len) = ping.data_length else {
                    return Err(p.invalid("ping.data", "payload without a data length"));
                };
                if len as usize > p.remaining() {
                    return Err(p.invalid(
                        "ping.data",
                        format!(
                            "data length {} exceeds the {} bytes left in the block",
                            len,
                            p.remaining()
                        ),
                    ));
                }
                ping.data = Some(p.bytes(len as usize, "ping.data")?.to_vec());
            }
            10 => ping.probe_count = Some(p.u16("ping.probe_count")?),
            11 => ping.probe_size = Some(p.u16("ping.probe_size")?),
            12 => ping.probe_wait = Some(p.u8("ping.probe_wait")?),
            13 => ping.probe_ttl = Some(p.u8("ping.probe_ttl")?),
            14 => ping.reply_count = Some(p.u16("ping.reply_count")?),
            15 => ping.pings_sent = Some(p.u16("ping.pings_sent")?),
            16 => ping.probe_method = Some(p.u8("ping.probe_method")?),
            17 => ping.src_port = Some(p.u16("ping.src_port")?),
            18 => ping.dst_port = Some(p.u16("ping.dst_port")?),
            19 => ping.user_id = Some(p.u32("ping.user_id")?),
            20 => ping.src = Some(p.address(table, "ping.src")?),
            21 => ping.dst = Some(p.address(table, "ping.dst")?),
            22 => ping.ping_flags = Some(p.u8("ping.flags")?),
            23 => ping.probe_tos = Some(p.u8("ping.probe_tos")?),
            other => {
                ping.skipped_flags = block.skipped_from(other);
                break;
            }
        }
    }

    let reply_records = r.u16("ping.reply_records")?;
    log::debug!("found {} ping replies", reply_records);
    ping.replies = Vec::with_capacity(reply_records as usize);
    for _ in 0..reply_records {
        ping.replies.push(decode_reply(r, table)?);
    }

    Ok(Record::Ping(ping))
}

fn decode_reply(
    r: &mut BodyReader<'_>,
    table: &mut AddressTable,
) -> Result<PingReply, ParseError> {
    let mut reply = PingReply::default();

    let mut block = r.params()?;
    for flag in block.flags.iter() {
        let p = &mut block.reader;
        match flag {
            1 => p.legacy_address("reply.addr_gid")?,
            2 => reply.reply_flags = Some(p.u8("reply.flags")?),
            3 => reply.reply_ttl = Some(p.u8("reply.reply_ttl")?),
            4 => reply.reply_size = Some(p.u16("reply.reply_size")?),
            5 => reply.icmp_type_code = Some(p.u16("reply.icmp_type_code")?),
            6 => reply.rtt = Some(p.u32("reply.rtt")?),
            7 => reply.probe_id = Some(p.u16("reply.probe_id")?),
            8 => reply.reply_ip_id = Some(p.u16("reply.reply_ip_id")?),
            9 => reply.probe_ip_id = Some(p.u16("reply.probe_ip_id")?),
            10 => reply.reply_proto = Some(p.u8("reply.reply_proto")?),
            11 => reply.reply_tcp_flags = Some(p.u8("reply.reply_tcp_flags")?),
            12 => reply.address = Some(p.address(table, "reply.address")?),
            other => {
                reply.skipped_flags = block.skipped_from(other);
                break;
            }
        }
    }

    Ok(reply)
}
