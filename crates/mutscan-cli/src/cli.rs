use super::commands;
use clap::{Args, Parser, Subcommand};
use mutscan_core::ScoringStrategy;
use mutscan_plms::ModelSpec;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log filter, e.g. `info` or `mutscan_core=debug`. `RUST_LOG` wins when set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score mutations of a sequence with one or more language models
    Scan(ScanArgs),
    /// List the models that can be fetched from the HuggingFace hub
    Models,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Hub model name, `onnx:<path>` or `msa-onnx:<path>`. Repeat to ensemble.
    #[arg(short = 'm', long = "model-location", required = true, num_args = 1..)]
    pub models: Vec<ModelSpec>,

    /// Wild-type protein sequence
    #[arg(short, long)]
    pub sequence: String,

    /// Comma-separated point mutations, e.g. `M1A,K2R`
    #[arg(long)]
    pub dms_mutation: Option<String>,

    /// Comma-separated `<mutated sequence>,<index>` pairs
    #[arg(long)]
    pub dms_indel: Option<String>,

    /// CSV file with a column of point mutations
    #[arg(long)]
    pub dms_input: Option<PathBuf>,

    /// Column of `--dms-input` holding the mutations
    #[arg(long, default_value = "mutant")]
    pub mutation_col: String,

    #[arg(short, long, default_value = "MutScan")]
    pub output_prefix: String,

    /// Position label of the first residue
    #[arg(long, default_value_t = 1)]
    pub offset_idx: usize,

    /// Defaults to `indel` for indel lists and `wt-marginals` otherwise
    #[arg(long)]
    pub scoring_strategy: Option<ScoringStrategy>,

    /// a3m alignment whose first record is the wild type
    #[arg(long)]
    pub msa_path: Option<PathBuf>,

    /// Alignment records to read
    #[arg(long, default_value_t = 400)]
    pub msa_samples: usize,

    /// Masked requests per model call
    #[arg(long, default_value_t = 1)]
    pub batch_size: usize,

    /// Run on the CPU even when a GPU is available
    #[arg(long)]
    pub cpu: bool,

    /// Skip the SVG plots
    #[arg(long)]
    pub no_plots: bool,
}

impl Cli {
    pub fn execute(self) -> anyhow::Result<()> {
        commands::init_tracing(&self.log_level)?;
        match self.command {
            Commands::Scan(args) => commands::scan::execute(args),
            Commands::Models => commands::models::execute(),
        }
    }
}
