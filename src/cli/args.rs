use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "brc-processor")]
#[command(about = "Concurrent min/mean/max aggregation of station measurements")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate a measurements file with one reader per worker
    Process {
        #[arg(short, long, help = "Input measurements file (station;value per line)")]
        input_file: PathBuf,

        #[arg(
            short,
            long,
            help = "Output file or directory [default: stdout; directories get brc-report-{YYMMDD}.{ext}]"
        )]
        output: Option<PathBuf>,

        #[arg(short, long, default_value = "text", help = "Report format: text, json or csv")]
        format: String,

        #[arg(long, help = "Configuration file (TOML, JSON or YAML)")]
        config: Option<PathBuf>,

        #[arg(long, help = "Number of workers [default: one per CPU core]")]
        max_workers: Option<usize>,

        #[arg(long, default_value = "false", help = "Keep every value per station")]
        retain_series: bool,

        #[arg(short, long, default_value = "false", help = "Hide the progress bar")]
        quiet: bool,
    },

    /// Aggregate a trusted file on a single thread; malformed input aborts
    Scan {
        #[arg(short, long, help = "Input measurements file (station;value per line)")]
        input_file: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, default_value = "text")]
        format: String,

        #[arg(long, help = "Configuration file (TOML, JSON or YAML)")]
        config: Option<PathBuf>,

        #[arg(long, default_value = "false", help = "Memory-map the input file")]
        mmap: bool,
    },
}
