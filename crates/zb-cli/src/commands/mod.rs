//! CLI subcommand implementations.

pub mod battery;
pub mod buckets;
pub mod dump;
pub mod lifelogger;

use std::io::Write;

use anyhow::{Context, Result};

use zb_api::Client;
use zb_core::Event;

use crate::Config;

/// Events read from one import source.
#[derive(Debug, Default)]
pub struct ParsedEvents {
    pub events: Vec<Event>,
    /// Source rows or cells that could not be turned into an event.
    pub skipped: usize,
}

impl ParsedEvents {
    fn skip(&mut self) {
        self.skipped += 1;
    }
}

/// Where an import lands when it is uploaded.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub label: &'a str,
    pub description: &'a str,
    pub one_by_one: bool,
}

/// Opens a session from the configuration, runs `f`, and revokes the session.
pub fn with_client<T>(config: &Config, f: impl FnOnce(&Client) -> Result<T>) -> Result<T> {
    let credentials = config.credentials()?;
    tracing::debug!(host = %config.host, "opening session");
    Client::scoped(config.client_config()?, &credentials, f)
}

/// Submits events to the bucket labelled `target.label`, creating it if needed.
pub fn upload<W: Write>(
    writer: &mut W,
    client: &Client,
    target: Target<'_>,
    events: &[Event],
) -> Result<()> {
    let bucket = client
        .create_or_get_bucket(target.label, target.description)
        .with_context(|| format!("failed to open bucket {:?}", target.label))?;

    if events.is_empty() {
        writeln!(writer, "No events to upload to {}.", bucket.label)?;
        return Ok(());
    }

    if target.one_by_one {
        for (idx, event) in events.iter().enumerate() {
            client
                .create_event(&bucket, event)
                .with_context(|| format!("failed to upload event {}", idx + 1))?;
            tracing::debug!(done = idx + 1, total = events.len(), "uploaded event");
        }
    } else {
        client
            .create_events(&bucket, events)
            .with_context(|| format!("failed to upload {} events", events.len()))?;
    }

    writeln!(
        writer,
        "Uploaded {} events to {} ({})",
        events.len(),
        bucket.label,
        bucket.id
    )?;
    Ok(())
}

/// Writes events as JSON lines instead of uploading them.
pub fn print_events<W: Write>(writer: &mut W, events: &[Event]) -> Result<()> {
    for event in events {
        let line = serde_json::to_string(event).context("failed to encode event")?;
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Logs how an import source was read.
fn log_parsed(source: &str, parsed: &ParsedEvents) {
    if parsed.skipped > 0 {
        tracing::warn!(source, parse_errors = parsed.skipped, "skipped unparseable input");
    }
    tracing::info!(source, events = parsed.events.len(), "parsed import");
}

fn write_summary<W: Write>(writer: &mut W, source: &str, parsed: &ParsedEvents) -> Result<()> {
    if parsed.skipped > 0 {
        writeln!(
            writer,
            "Parsed {} events from {source} ({} skipped)",
            parsed.events.len(),
            parsed.skipped
        )?;
    } else {
        writeln!(writer, "Parsed {} events from {source}", parsed.events.len())?;
    }
    Ok(())
}
