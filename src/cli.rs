use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
}

impl From<OutputFormat> for crate::io::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => crate::io::OutputFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "context-slicer")]
#[command(about = "Extract the calling context around a target method", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the call graph and extract a context slice for one method
    Slice {
        /// Path to the JSON-IR program model
        program: PathBuf,

        /// Target method, canonical form `<Class: ret name(params)>`
        #[arg(short, long)]
        target: String,

        /// Traversal depth in caller hops (default 1: direct callers)
        #[arg(short, long)]
        depth: Option<u32>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include per-caller call-site evidence
        #[arg(long)]
        extended: bool,

        /// Entry point bounding graph construction (repeatable)
        #[arg(long = "entry-point")]
        entry_points: Vec<String>,

        /// Config file (defaults to context-slicer.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build the call graph and report construction statistics
    Graph {
        /// Path to the JSON-IR program model
        program: PathBuf,

        /// Entry point bounding graph construction (repeatable)
        #[arg(long = "entry-point")]
        entry_points: Vec<String>,

        /// Config file (defaults to context-slicer.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
