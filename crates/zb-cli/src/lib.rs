//! Zenobase uploader CLI library.
//!
//! This crate provides the `zb` command: importers for local exports, a
//! full account dump, and bucket administration.

mod cli;
pub mod commands;
mod config;

pub use cli::{BucketsAction, Cli, Commands};
pub use config::Config;
