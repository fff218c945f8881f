//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use feature_harvest::config::{DEFAULT_CONCURRENCY, DEFAULT_SRID, DEFAULT_TIMEOUT_MS};

#[derive(Parser, Debug)]
#[command(
    name = "feature-harvest",
    about = "Harvest polygon features for a list of search terms from a find service",
    version
)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a harvest over the terms in an input file.
    #[command(alias = "harvest")]
    Run(HarvestArgs),

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   feature-harvest completions bash > ~/.local/share/bash-completion/completions/feature-harvest
    ///   feature-harvest completions zsh > ~/.zfunc/_feature-harvest
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct HarvestArgs {
    /// Delimited text file; the first field of each line is a search term.
    pub input: PathBuf,

    /// SQLite store to write into. Defaults to `<input stem>.sqlite` beside the input.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output layer (table) name. Defaults to `<input stem>_<YYYYmmdd_HHMMSS>`.
    #[arg(long)]
    pub table: Option<String>,

    /// Summary log path. Defaults to `<layer>.csv` beside the input.
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Find service URL. Also reads FEATURE_HARVEST_URL.
    #[arg(long)]
    pub url: Option<String>,

    /// Maximum number of outstanding requests.
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Send `contains=false` (exact match) instead of `contains=true`.
    #[arg(long)]
    pub no_contains: bool,

    /// Layer selector, unless the URL already carries one.
    #[arg(long)]
    pub layers: Option<String>,

    /// Search-field selector, unless the URL already carries one.
    #[arg(long)]
    pub search_fields: Option<String>,

    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Spatial reference id recorded on the output layer.
    #[arg(long, default_value_t = DEFAULT_SRID)]
    pub srid: u32,

    /// Spatial reference requested from the service.
    #[arg(long)]
    pub out_sr: Option<u32>,

    /// Print the final report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Disable the progress bar.
    #[arg(short, long)]
    pub quiet: bool,
}
