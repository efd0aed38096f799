use clap::{Parser, Subcommand};
use std::path::PathBuf;

use uniqip::HashKind;

/// Approximate distinct-line counter (Bloom filter + worker pool)
#[derive(Parser, Debug)]
#[command(
    name = "uniqip",
    version,
    about = "Approximate count of distinct lines (e.g. IPv4 addresses) in huge files",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Count distinct non-empty lines of a file ("-" for stdin)
    ///
    /// Unset flags fall back to UQ_* env vars, then to built-in defaults.
    ///
    /// Пример:
    ///   uniqip count --path ./ip_addresses --expected 4294967296 --fp-rate 0.001
    ///   cat log | uniqip count --path - --json
    Count {
        #[arg(long)]
        path: PathBuf,
        /// Physical read size in bytes
        #[arg(long)]
        block_size: Option<usize>,
        /// Queue capacity in chunks
        #[arg(long)]
        queue: Option<usize>,
        /// Worker threads
        #[arg(long)]
        workers: Option<usize>,
        /// Expected number of distinct keys (filter sizing)
        #[arg(long)]
        expected: Option<u64>,
        /// Target false-positive rate, in (0, 1)
        #[arg(long)]
        fp_rate: Option<f64>,
        /// Hash family (xx64)
        #[arg(long)]
        hash: Option<HashKind>,
        /// JSON output (single object)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print filter sizing (m, k, memory) for N and p without reading anything
    Params {
        #[arg(long)]
        expected: u64,
        #[arg(long, default_value_t = 0.001)]
        fp_rate: f64,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
