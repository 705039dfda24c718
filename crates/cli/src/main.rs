//! djson: ship events to the monitoring agent as djson.
//!
//! Reads events from a file or stdin, encodes them through the output
//! pipeline and sends them over the agent socket. With `--dry-run` the
//! framed items are printed to stdout instead.

mod commands;
mod input;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ArgMatches;
use djson_output::{BatchSummary, DjsonOutput, OutputConfig};
use djson_transport::{Transport, UnixSocketTransport, WriterTransport};
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use input::{read_json_events, read_msgpack_events, InputEvent};

fn main() {
    let matches = build_cli().get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(&matches) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    if matches.get_flag("print-default-config") {
        print!("{}", OutputConfig::default_toml());
        return Ok(());
    }
    if let Some(path) = matches.get_one::<String>("init-config") {
        OutputConfig::write_default_if_missing(Path::new(path))?;
        info!(path = %path, "Config file ready");
        return Ok(());
    }

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => OutputConfig::from_file(Path::new(path))?,
        None => OutputConfig::default(),
    };
    if let Some(socket) = matches.get_one::<String>("socket") {
        config.djson_socket = Some(PathBuf::from(socket));
    }

    let transport: Arc<dyn Transport> = if matches.get_flag("dry-run") {
        Arc::new(WriterTransport::new(io::stdout()))
    } else {
        Arc::new(UnixSocketTransport::new(config.transport_config()?))
    };

    let events = read_events(matches)?;
    let batch_size = matches
        .get_one::<usize>("batch-size")
        .copied()
        .unwrap_or(commands::DEFAULT_BATCH_SIZE)
        .max(1);

    let output = DjsonOutput::new(config, transport)?;
    let result = ship(&output, events, batch_size);
    output.close()?;
    let total = result?;

    let stats = output.stats();
    info!(
        sent = total.sent,
        dropped = total.dropped,
        schemas = stats.schemas,
        "Done"
    );
    Ok(())
}

fn read_events(matches: &ArgMatches) -> Result<Vec<InputEvent>> {
    let reader: Box<dyn Read> = match matches.get_one::<String>("input") {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("opening input file '{}'", path))?,
        ),
        None => Box::new(io::stdin()),
    };

    match matches.get_one::<String>("format").map(String::as_str) {
        Some("msgpack") => read_msgpack_events(reader),
        _ => read_json_events(BufReader::new(reader)),
    }
}

fn ship(output: &DjsonOutput, events: Vec<InputEvent>, batch_size: usize) -> Result<BatchSummary> {
    let mut total = BatchSummary::default();
    let mut events = events.into_iter().peekable();

    while events.peek().is_some() {
        let batch = events
            .by_ref()
            .take(batch_size)
            .map(InputEvent::into_entry)
            .collect::<Result<Vec<_>>>()?;
        let summary = output.write_batch(batch)?;
        total.sent += summary.sent;
        total.dropped += summary.dropped;
    }
    Ok(total)
}
