//! Battery command for uploading Battery Log CSV exports.

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Args;
use serde::Deserialize;
use serde_json::json;

use zb_core::{Event, Field, NormalizeOptions};

use crate::Config;
use crate::commands::{
    ParsedEvents, Target, log_parsed, print_events, upload, with_client, write_summary,
};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Args)]
pub struct BatteryArgs {
    /// CSV with a `datetime,status,level,temperature,voltage` header.
    pub file: PathBuf,

    /// Label of the bucket to upload into.
    #[arg(long, default_value = "Battery")]
    pub bucket: String,

    /// Description used if the bucket has to be created.
    #[arg(long, default_value = "Logged with Battery Log")]
    pub description: String,

    /// Submit events one request at a time instead of as a batch.
    #[arg(long)]
    pub one_by_one: bool,

    /// Print the events as JSON lines instead of uploading them.
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &BatteryArgs, config: &Config) -> Result<()> {
    let options = config.normalize_options()?;
    let file = File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let parsed = parse(file, &options)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let source = args.file.display().to_string();
    log_parsed(&source, &parsed);

    if args.dry_run {
        return print_events(writer, &parsed.events);
    }

    write_summary(writer, &source, &parsed)?;
    let target = Target {
        label: &args.bucket,
        description: &args.description,
        one_by_one: args.one_by_one,
    };
    with_client(config, |client| upload(writer, client, target, &parsed.events))
}

#[derive(Debug, Deserialize)]
struct BatteryRow {
    datetime: String,
    status: String,
    level: f64,
    temperature: f64,
}

/// Reads battery rows; rows that fail to parse are skipped and counted.
pub fn parse<R: Read>(reader: R, options: &NormalizeOptions) -> Result<ParsedEvents> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut parsed = ParsedEvents::default();

    for (idx, row) in reader.deserialize::<BatteryRow>().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                tracing::warn!(line, error = %err, "skipping malformed battery row");
                parsed.skip();
                continue;
            }
        };
        match row_to_event(&row, options) {
            Ok(event) => parsed.events.push(event),
            Err(err) => {
                tracing::warn!(line, error = %err, "skipping battery row");
                parsed.skip();
            }
        }
    }

    Ok(parsed)
}

fn row_to_event(row: &BatteryRow, options: &NormalizeOptions) -> Result<Event> {
    let at = NaiveDateTime::parse_from_str(&row.datetime, DATETIME_FORMAT)
        .with_context(|| format!("invalid datetime {:?}", row.datetime))?;
    let event = Event::builder()
        .timestamp(at)
        .tag(row.status.as_str())
        .field(Field::Percentage, row.level)
        .field(
            Field::Temperature,
            json!({"@value": row.temperature, "unit": "C"}),
        )
        .build(options)?;
    Ok(event)
}
