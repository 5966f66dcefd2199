use std::net::{Ipv4Addr, Ipv6Addr};

use assert_matches::assert_matches;
use warts_parser::registry::{
    TYPE_ADDRESS, TYPE_CYCLE_STOP, TYPE_LIST, TYPE_PING, TYPE_TRACEROUTE,
};
use warts_parser::{Address, ParseError, Ping, Record, WartsReader};

// === Byte builders ===

fn record(type_code: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0x1205u16.to_be_bytes());
    out.extend_from_slice(&type_code.to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
    out
}

fn params(flags: &[u16], block: &[u8]) -> Vec<u8> {
    let mut groups = vec![0u8];
    for &f in flags {
        let idx = ((f - 1) / 7) as usize;
        if groups.len() <= idx {
            groups.resize(idx + 1, 0);
        }
        groups[idx] |= 1u8 << ((f - 1) % 7);
    }
    let last = groups.len() - 1;
    for g in &mut groups[..last] {
        *g |= 0x80;
    }
    let mut out = groups;
    if !flags.is_empty() {
        out.extend_from_slice(&(block.len() as u16).to_be_bytes());
        out.extend_from_slice(block);
    }
    out
}

fn literal(family: u8, bytes: &[u8]) -> Vec<u8> {
    let mut out = vec![bytes.len() as u8, family];
    out.extend_from_slice(bytes);
    out
}

fn reference(id: u32) -> Vec<u8> {
    let mut out = vec![0];
    out.extend_from_slice(&id.to_be_bytes());
    out
}

/// A ping with no optional fields and no replies.
fn bare_ping() -> Vec<u8> {
    let mut body = params(&[], &[]);
    body.extend_from_slice(&0u16.to_be_bytes());
    record(TYPE_PING, &body)
}

/// A ping carrying a list id and a destination address field.
fn ping_to(list_id: u32, dst: &[u8]) -> Vec<u8> {
    let mut block = list_id.to_be_bytes().to_vec();
    block.extend_from_slice(dst);
    let mut body = params(&[1, 21], &block);
    body.extend_from_slice(&0u16.to_be_bytes());
    record(TYPE_PING, &body)
}

/// A traceroute whose hops each carry one address field.
fn trace_with_hops(hop_addrs: &[Vec<u8>]) -> Vec<u8> {
    let mut body = params(&[10], &[30]);
    body.extend_from_slice(&(hop_addrs.len() as u16).to_be_bytes());
    for (i, addr) in hop_addrs.iter().enumerate() {
        let mut hop = vec![i as u8 + 1];
        hop.extend_from_slice(addr);
        body.extend_from_slice(&params(&[2, 18], &hop));
    }
    record(TYPE_TRACEROUTE, &body)
}

fn read_all(data: &[u8]) -> (Vec<Result<Record, ParseError>>, WartsReader<&[u8]>) {
    let mut reader = WartsReader::new(data);
    let results: Vec<_> = (&mut reader).collect();
    (results, reader)
}

// === Properties ===

#[test]
fn test_three_record_scenario() {
    let mut data = bare_ping();
    data.extend_from_slice(&trace_with_hops(&[
        literal(0x01, &[10, 0, 0, 1]),
        literal(0x01, &[10, 0, 0, 2]),
    ]));
    data.extend_from_slice(&record(0x0099, &[0x5A; 40]));

    let (results, reader) = read_all(&data);
    assert_eq!(results.len(), 3);
    let records: Vec<Record> = results.into_iter().map(|r| r.unwrap()).collect();

    assert_eq!(records[0], Record::Ping(Ping::default()));
    match &records[1] {
        Record::Traceroute(t) => {
            assert_eq!(t.hops.len(), 2);
            assert_eq!(t.hop_limit, Some(30));
            assert_eq!(
                t.hops[1].address,
                Some(Address::V4(Ipv4Addr::new(10, 0, 0, 2)))
            );
        }
        other => panic!("expected Traceroute, got {:?}", other),
    }
    assert_matches!(&records[2], Record::Opaque(o) if o.type_code == 0x0099 && o.body.len() == 40);

    assert_eq!(reader.address_table().len(), 2);
    assert_eq!(reader.offset(), data.len() as u64);
}

#[test]
fn test_resync_after_corrupted_body() {
    let records: Vec<Vec<u8>> = (0..5u32)
        .map(|i| ping_to(i, &literal(0x01, &[192, 0, 2, i as u8])))
        .collect();
    let mut data = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        if i == 2 {
            // Keep the header honest, scramble the body.
            let mut bad = rec.clone();
            for b in &mut bad[8..] {
                *b = 0xFF;
            }
            data.extend_from_slice(&bad);
        } else {
            data.extend_from_slice(rec);
        }
    }

    let (results, _) = read_all(&data);
    assert_eq!(results.len(), 5);
    let list_ids: Vec<Option<u32>> = results
        .iter()
        .map(|r| match r {
            Ok(Record::Ping(p)) => p.list_id,
            Ok(other) => panic!("unexpected record {:?}", other),
            Err(_) => None,
        })
        .collect();
    assert_eq!(list_ids, vec![Some(0), Some(1), None, Some(3), Some(4)]);
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    assert!(!results[2].as_ref().unwrap_err().is_fatal());
}

#[test]
fn test_back_reference_across_records() {
    let v6: Ipv6Addr = "2001:db8::42".parse().unwrap();
    let mut data = ping_to(1, &literal(0x02, &v6.octets()));
    data.extend_from_slice(&ping_to(2, &reference(0)));

    let (results, reader) = read_all(&data);
    let dsts: Vec<Option<Address>> = results
        .into_iter()
        .map(|r| match r.unwrap() {
            Record::Ping(p) => p.dst,
            other => panic!("unexpected record {:?}", other),
        })
        .collect();
    assert_eq!(dsts, vec![Some(Address::V6(v6)), Some(Address::V6(v6))]);
    assert_eq!(reader.address_table().len(), 1);
}

#[test]
fn test_forward_reference_is_rejected() {
    let mut data = ping_to(1, &reference(0));
    data.extend_from_slice(&bare_ping());

    let mut reader = WartsReader::new(&data[..]);
    assert_matches!(
        reader.next_record(),
        Err(ParseError::BadReference { index: 1, .. })
    );
    assert_matches!(reader.next_record(), Ok(Record::Ping(_)));
    assert!(reader.address_table().is_empty());
}

#[test]
fn test_legacy_addresses_always_rejected() {
    let mut data = record(TYPE_ADDRESS, &[4, 0x01, 10, 0, 0, 1]);
    data.extend_from_slice(&{
        let mut body = params(&[4], &0u32.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
        record(TYPE_PING, &body)
    });
    data.extend_from_slice(&{
        let mut body = params(&[3], &0u32.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
        record(TYPE_TRACEROUTE, &body)
    });

    let (results, reader) = read_all(&data);
    assert_eq!(results.len(), 3);
    for r in &results {
        assert_matches!(r, Err(ParseError::UnsupportedLegacyAddress(_)));
    }
    assert!(reader.address_table().is_empty());
}

#[test]
fn test_unknown_high_flag_lands_after_block() {
    // List with a known description, an unknown flag 30 and 6 bytes of
    // payload for it, followed by a second record.
    let mut body = Vec::new();
    body.extend_from_slice(&1u32.to_be_bytes());
    body.extend_from_slice(&1u32.to_be_bytes());
    body.extend_from_slice(b"l\0");
    let mut block = b"desc\0".to_vec();
    block.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
    body.extend_from_slice(&params(&[1, 30], &block));
    let mut data = record(TYPE_LIST, &body);
    data.extend_from_slice(&bare_ping());

    let (results, _) = read_all(&data);
    match &results[0] {
        Ok(Record::List(l)) => {
            assert_eq!(l.description.as_deref(), Some("desc"));
            assert_eq!(l.skipped_flags, vec![30]);
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert_matches!(results[1], Ok(Record::Ping(_)));
}

#[test]
fn test_end_of_stream_is_idempotent() {
    let data = bare_ping();
    let mut reader = WartsReader::new(&data[..]);
    assert_matches!(reader.next_record(), Ok(Record::Ping(_)));
    for _ in 0..3 {
        assert_matches!(reader.next_record(), Err(ParseError::EndOfStream));
    }
    assert!(reader.next().is_none());
}

#[test]
fn test_cycle_stop_between_measurements() {
    let mut stop = Vec::new();
    stop.extend_from_slice(&3u32.to_be_bytes());
    stop.extend_from_slice(&1_700_000_000u32.to_be_bytes());
    let mut data = bare_ping();
    data.extend_from_slice(&record(TYPE_CYCLE_STOP, &stop));
    data.extend_from_slice(&bare_ping());

    let (results, _) = read_all(&data);
    let codes: Vec<u16> = results.iter().map(|r| r.as_ref().unwrap().type_code()).collect();
    assert_eq!(codes, vec![TYPE_PING, TYPE_CYCLE_STOP, TYPE_PING]);
}
