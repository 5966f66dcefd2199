use std::fs::File;
use std::io::{self, BufReader, Read, Write};

use anyhow::{bail, Context, Result};
use warts_parser::{ParseError, ReaderConfig, Record, WartsReader};

/// Command line options.
#[derive(Debug, PartialEq)]
struct Options {
    verbose: bool,
    max_record_len: Option<u32>,
    /// Input file; stdin when absent.
    path: Option<String>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Options> {
    let mut opts = Options {
        verbose: false,
        max_record_len: None,
        path: None,
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" | "--verbose" => opts.verbose = true,
            "--max-record-len" => {
                let value = args.next().context("--max-record-len needs a value")?;
                let len = value
                    .parse::<u32>()
                    .with_context(|| format!("invalid --max-record-len {:?}", value))?;
                opts.max_record_len = Some(len);
            }
            "-" => opts.path = None,
            other if other.starts_with('-') => bail!("unknown option {}", other),
            other => {
                if opts.path.is_some() {
                    bail!("only one input file may be given");
                }
                opts.path = Some(other.to_string());
            }
        }
    }
    Ok(opts)
}

/// One line per record, in the spirit of scamper's own dump tools.
fn describe(record: &Record) -> String {
    match record {
        Record::List(l) => format!(
            "List(name={:?}, id={}, human_id={})",
            l.name, l.list_id, l.human_id
        ),
        Record::CycleStart(c) => format!("CycleStart(id={}, list={})", c.cycle_id, c.list_id),
        Record::CycleDefinition(c) => {
            format!("CycleDefinition(id={}, list={})", c.cycle_id, c.list_id)
        }
        Record::CycleStop(c) => {
            format!("CycleStop(id={}, stop_time={})", c.cycle_id, c.stop_time)
        }
        Record::Traceroute(t) => {
            let hops: Vec<String> = t
                .hops
                .iter()
                .map(|h| match &h.address {
                    Some(a) => format!("Hop({})", a),
                    None => "Hop".to_string(),
                })
                .collect();
            match &t.dst {
                Some(dst) => format!(
                    "Traceroute(dst={}, {} hops) [{}]",
                    dst,
                    t.hops.len(),
                    hops.join(", ")
                ),
                None => format!("Traceroute({} hops) [{}]", t.hops.len(), hops.join(", ")),
            }
        }
        Record::Ping(p) => match &p.dst {
            Some(dst) => format!("Ping(dst={}, {} replies)", dst, p.replies.len()),
            None => format!("Ping({} replies)", p.replies.len()),
        },
        Record::Opaque(o) => {
            format!("Opaque(type=0x{:04x}, {} bytes)", o.type_code, o.body.len())
        }
    }
}

fn dump(input: impl Read, config: ReaderConfig, out: &mut impl Write) -> Result<usize> {
    let mut reader = WartsReader::with_config(input, config);
    let mut skipped = 0;
    loop {
        match reader.next_record() {
            Ok(record) => writeln!(out, "{}", describe(&record))?,
            Err(ParseError::EndOfStream) => break,
            // Only non-blocking sources stall; the record resumes on retry.
            Err(e) if e.is_would_block() => continue,
            Err(e) if e.is_fatal() => {
                return Err(e)
                    .with_context(|| format!("reading record at offset {}", reader.offset()));
            }
            // Already logged by the reader; carry on with the next record.
            Err(_) => skipped += 1,
        }
    }
    Ok(skipped)
}

fn main() -> Result<()> {
    let opts = parse_args(std::env::args().skip(1))?;

    let default_filter = if opts.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = ReaderConfig::default();
    if let Some(len) = opts.max_record_len {
        config.max_record_len = len;
    }

    let input: Box<dyn Read> = match &opts.path {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let stdout = io::stdout();
    let skipped = dump(input, config, &mut stdout.lock())?;
    if skipped > 0 {
        log::info!("{} malformed records skipped", skipped);
    }
    Ok(())
}
