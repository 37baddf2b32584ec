//! navlog CLI - ingest a sensor log and print a summary.
//!
//! Mostly a smoke-test harness for the ingestion core: streams the file
//! through the background reader exactly the way a viewer would, then prints
//! per-sensor record counts and the covered time span.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};

use navlog::settings::ViewerSettings;
use navlog::{Delimiter, Log};

struct Args {
    logfile: String,
    delimiter: Option<Delimiter>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut logfile = None;
    let mut delimiter = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--delimiter" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--delimiter requires a value (comma|space)"))?;
                delimiter = Some(match value.as_str() {
                    "comma" => Delimiter::Comma,
                    "space" => Delimiter::Space,
                    other => bail!("unknown delimiter `{other}` (expected comma|space)"),
                });
            }
            "--help" | "-h" => {
                println!("usage: navlog <logfile> [--delimiter comma|space]");
                std::process::exit(0);
            }
            other if logfile.is_none() => logfile = Some(other.to_string()),
            other => bail!("unexpected argument `{other}`"),
        }
    }

    Ok(Args {
        logfile: logfile.ok_or_else(|| anyhow!("usage: navlog <logfile> [--delimiter comma|space]"))?,
        delimiter,
    })
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = parse_args()?;
    let settings = ViewerSettings::load();
    let delimiter = args.delimiter.unwrap_or(settings.delimiter);

    let mut log = Log::with_delimiter(delimiter);
    log.parse(&args.logfile);

    // Drain the reader the way a viewer's timer tick would
    while log.is_running() {
        log.poll();
        thread::sleep(Duration::from_millis(10));
    }
    log.poll();

    if log.completed() != Some(true) {
        let reason = log.last_error().unwrap_or("ingestion did not complete");
        return Err(anyhow!("{reason}")).context(format!("failed to ingest {}", args.logfile));
    }

    let store = log.store();
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for record in store.records() {
        *counts.entry(record.sensor_type().name()).or_default() += 1;
    }

    println!("{}: {} records", args.logfile, store.len());
    for (name, count) in counts {
        println!("  {name:>8}: {count}");
    }
    if log.skipped_lines() > 0 {
        println!("  skipped: {} malformed line(s)", log.skipped_lines());
    }
    if !store.is_empty() {
        let first = store.time(0).expect("store is non-empty");
        let last = store.time(store.len() - 1).expect("store is non-empty");
        println!("  time span: {first:.6} .. {last:.6} ({:.3}s)", last - first);
    }

    Ok(())
}
