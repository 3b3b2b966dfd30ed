use clap::{Parser, Subcommand};
use logrequeue::engine::DEFAULT_BATCH_SIZE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "logrequeue")]
#[command(about = "Move failed log records back into the primary log store")]
pub struct Cli {
    /// JSON snapshot holding both partitions
    #[arg(long, global = true, default_value = "logrequeue-store.json")]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resend failed records now
    Resend {
        /// Comma separated error codes, e.g. 400,401,403
        #[arg(long)]
        errortype: Option<String>,
        /// Comma separated event names
        #[arg(long)]
        eventname: Option<String>,
        /// Unix timestamp, inclusive lower bound on creation time
        #[arg(long)]
        datefrom: Option<i64>,
        /// Unix timestamp, inclusive upper bound on creation time
        #[arg(long)]
        dateto: Option<i64>,
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch: usize,
        /// 1 only counts matching records, 0 moves them
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
        dryrun: u8,
        /// Stop between batches after this many seconds
        #[arg(long)]
        max_runtime: Option<u64>,
    },
    /// Run the scheduled resend once with persisted settings
    RunTask {
        #[arg(long, default_value = "logrequeue-settings.json")]
        settings: PathBuf,
    },
    /// Run the scheduled resend every interval until interrupted
    Schedule {
        #[arg(long, default_value = "logrequeue-settings.json")]
        settings: PathBuf,
        /// Seconds between triggers
        #[arg(long, default_value_t = 3600)]
        interval: u64,
    },
    /// Add failed records from a JSON array file
    Seed {
        #[arg(long)]
        file: PathBuf,
    },
    /// Show record counts per partition
    Status,
}
