//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::battery::BatteryArgs;
use crate::commands::dump::DumpArgs;
use crate::commands::lifelogger::LifeloggerArgs;

/// Upload personal logs to Zenobase.
///
/// Reads exports from logging apps, normalizes them into Zenobase events and
/// submits them to buckets on your account.
#[derive(Debug, Parser)]
#[command(name = "zb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload a Battery Log CSV export.
    Battery(BatteryArgs),

    /// Upload sheets exported from a Lifelogger spreadsheet.
    Lifelogger(LifeloggerArgs),

    /// Save every bucket and its events to JSON files.
    Dump(DumpArgs),

    /// Manage buckets.
    Buckets {
        #[command(subcommand)]
        action: BucketsAction,
    },
}

/// Bucket administration.
#[derive(Debug, Subcommand)]
pub enum BucketsAction {
    /// List all buckets ordered by label.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Create a bucket.
    Create {
        /// Bucket label (1-20 characters from `[a-zA-Z0-9-_ ]`).
        label: String,

        /// Bucket description.
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Delete a bucket and all of its events.
    Delete {
        /// Bucket id.
        id: String,
    },
}
