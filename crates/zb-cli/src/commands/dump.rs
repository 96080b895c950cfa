//! Dump command for saving every bucket and its events to JSON.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use clap::Args;
use serde_json::Value;

use zb_api::{Bucket, Client};

use crate::Config;
use crate::commands::with_client;

const STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// Directory the dump files are written to.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Write one file per bucket instead of a single file.
    #[arg(long)]
    pub separately: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &DumpArgs, config: &Config) -> Result<()> {
    let zone = config.normalize_options()?.zone;
    let username = config.username.as_deref().unwrap_or("client");
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;

    with_client(config, |client| {
        let buckets = client.list_all_buckets().context("failed to list buckets")?;
        writeln!(writer, "Fetching {} buckets...", buckets.len())?;

        let mut dumped = Vec::with_capacity(buckets.len());
        for (idx, bucket) in buckets.iter().enumerate() {
            let record = fetch_bucket(client, bucket, username)?;
            writeln!(
                writer,
                "{}/{} {} ({})",
                idx + 1,
                buckets.len(),
                bucket.label,
                bucket.id
            )?;
            if args.separately {
                let path = args
                    .out_dir
                    .join(dump_filename(username, &bucket.label, now(zone)));
                save(writer, &path, &record)?;
            }
            dumped.push(record);
        }

        if !args.separately {
            let path = args.out_dir.join(dump_filename(username, "all", now(zone)));
            save(writer, &path, &Value::Array(dumped))?;
        }
        Ok(())
    })
}

fn now(zone: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&zone)
}

/// A bucket's metadata with its events and owner folded in.
fn fetch_bucket(client: &Client, bucket: &Bucket, username: &str) -> Result<Value> {
    tracing::debug!(bucket_id = %bucket.id, label = %bucket.label, "fetching events");
    let events = client
        .list_events(&bucket.id)
        .with_context(|| format!("failed to fetch events of {}", bucket.label))?;
    Ok(bucket_record(bucket, username, events.events))
}

fn bucket_record(bucket: &Bucket, username: &str, events: Vec<Value>) -> Value {
    let mut record = serde_json::Map::new();
    record.insert("@id".to_string(), Value::String(bucket.id.clone()));
    record.insert("label".to_string(), Value::String(bucket.label.clone()));
    if let Some(description) = &bucket.description {
        record.insert("description".to_string(), Value::String(description.clone()));
    }
    for (key, value) in &bucket.metadata {
        record.insert(key.clone(), value.clone());
    }
    record.insert("username".to_string(), Value::String(username.to_string()));
    record.insert("events".to_string(), Value::Array(events));
    Value::Object(record)
}

/// `zenobase-dump-{username}-{label}-{YYYY-MM-DDTHH:MM:SS}.json`
pub fn dump_filename(username: &str, label: &str, at: DateTime<FixedOffset>) -> String {
    format!(
        "zenobase-dump-{username}-{label}-{}.json",
        at.format(STAMP_FORMAT)
    )
}

fn save<W: Write>(writer: &mut W, path: &Path, value: &Value) -> Result<()> {
    let data = serde_json::to_string(value).context("failed to encode dump")?;
    fs::write(path, &data).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = data.len(), "saved dump");
    writeln!(writer, "Saved {} ({} bytes)", path.display(), data.len())?;
    Ok(())
}
