//! Command-line interface for emotag
//!
//! Provides argument parsing using clap derive macros.

use clap::Parser;
use std::path::PathBuf;

/// Tag Japanese speech recordings with an emotion label
#[derive(Parser, Debug)]
#[command(
    name = "emotag",
    version,
    about = "Tag speech recordings with an emotion label from audio and transcript"
)]
pub struct Cli {
    /// Pipe-delimited metadata table with audio_filename and text columns
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory the audio_filename column is resolved against
    #[arg(value_name = "AUDIO_DIR")]
    pub audio_dir: PathBuf,

    /// Where to write the labeled table (overwritten if present)
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Rows to process concurrently (default: batch.jobs from config, 1)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Use fixed classifiers instead of network backends
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress progress output (quiet mode)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output (-v: debug logs, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
