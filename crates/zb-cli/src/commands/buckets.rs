//! Buckets command for listing, creating and deleting buckets.

use std::io::Write;

use anyhow::{Context, Result};

use zb_api::{Bucket, MAX_LABEL_LEN};

use crate::commands::with_client;
use crate::{BucketsAction, Config};

pub fn run<W: Write>(writer: &mut W, action: &BucketsAction, config: &Config) -> Result<()> {
    with_client(config, |client| match action {
        BucketsAction::List { json } => {
            let buckets = client.list_all_buckets().context("failed to list buckets")?;
            write_list(writer, &buckets, *json)
        }
        BucketsAction::Create { label, description } => {
            let bucket = client
                .create_bucket(label, description)
                .with_context(|| format!("failed to create bucket {label:?}"))?;
            writeln!(writer, "Created bucket {} ({})", bucket.label, bucket.id)?;
            Ok(())
        }
        BucketsAction::Delete { id } => {
            client
                .delete_bucket(id)
                .with_context(|| format!("failed to delete bucket {id}"))?;
            writeln!(writer, "Deleted bucket {id}")?;
            Ok(())
        }
    })
}

fn write_list<W: Write>(writer: &mut W, buckets: &[Bucket], json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *writer, buckets).context("failed to encode buckets")?;
        writeln!(writer)?;
        return Ok(());
    }

    if buckets.is_empty() {
        writeln!(writer, "No buckets.")?;
        return Ok(());
    }

    let id_width = buckets.iter().map(|b| b.id.len()).max().unwrap_or(0);
    for bucket in buckets {
        let line = format!(
            "{:<id_width$}  {:<MAX_LABEL_LEN$}  {}",
            bucket.id,
            bucket.label,
            bucket.description.as_deref().unwrap_or("")
        );
        writeln!(writer, "{}", line.trim_end())?;
    }
    Ok(())
}
