//! Decoders for the bookkeeping records that frame measurements: lists,
//! cycles, and the retired address record.

use crate::address::AddressTable;
use crate::reader::BodyReader;
use crate::types::*;

pub(crate) fn decode_list(
    r: &mut BodyReader<'_>,
    _: &mut AddressTable,
) -> Result<Record, ParseError> {
    let list_id = r.u32("list.list_id")?;
    let human_id = r.u32("list.human_id")?;
    let name = r.string("list.name")?;
    let mut list = List {
        list_id,
        human_id,
        name,
        description: None,
        monitor: None,
        skipped_flags: Vec::new(),
    };

    let mut block = r.params()?;
    for flag in block.flags.iter() {
        let p = &mut block.reader;
        match flag {
            1 => list.description = Some(p.string("list.description")?),
            2 => list.monitor = Some(p.string("list.monitor")?),
            other => {
                list.skipped_flags = block.skipped_from(other);
                break;
            }
        }
    }

    Ok(Record::List(list))
}

fn decode_cycle(r: &mut BodyReader<'_>) -> Result<Cycle, ParseError> {
    let mut cycle = Cycle {
        cycle_id: r.u32("cycle.cycle_id")?,
        list_id: r.u32("cycle.list_id")?,
        human_id: r.u32("cycle.human_id")?,
        start_time: r.u32("cycle.start_time")?,
        stop_time: None,
        hostname: None,
        skipped_flags: Vec::new(),
    };

    let mut block = r.params()?;
    for flag in block.flags.iter() {
        let p = &mut block.reader;
        match flag {
            1 => cycle.stop_time = Some(p.u32("cycle.stop_time")?),
            2 => cycle.hostname = Some(p.string("cycle.hostname")?),
            other => {
                cycle.skipped_flags = block.skipped_from(other);
                break;
            }
        }
    }

    Ok(cycle)
}

pub(crate) fn decode_cycle_start(
    r: &mut BodyReader<'_>,
    _: &mut AddressTable,
) -> Result<Record, ParseError> {
    Ok(Record::CycleStart(decode_cycle(r)?))
}

pub(crate) fn decode_cycle_definition(
    r: &mut BodyReader<'_>,
    _: &mut AddressTable,
) -> Result<Record, ParseError> {
    Ok(Record::CycleDefinition(decode_cycle(r)?))
}

pub(crate) fn decode_cycle_stop(
    r: &mut BodyReader<'_>,
    _: &mut AddressTable,
) -> Result<Record, ParseError> {
    let mut stop = CycleStop {
        cycle_id: r.u32("cycle_stop.cycle_id")?,
        stop_time: r.u32("cycle_stop.stop_time")?,
        skipped_flags: Vec::new(),
    };
    // Older writers end the record here without a flag byte.
    if !r.is_empty() {
        let block = r.params()?;
        if let Some(first) = block.flags.iter().next() {
            stop.skipped_flags = block.skipped_from(first);
        };
    }
    Ok(Record::CycleStop(stop))
}

/// The address record belongs to the retired global address scheme.
pub(crate) fn decode_legacy_address(
    r: &mut BodyReader<'_>,
    _: &mut AddressTable,
) -> Result<Record, ParseError> {
    Err(r.legacy("address record"))
}
