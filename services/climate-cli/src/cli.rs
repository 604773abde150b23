//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Default analysis extent as (west, south, east, north).
pub const DEFAULT_BOUNDS: [f64; 4] = [-180.0, -60.0, 180.0, 80.0];

#[derive(Parser, Debug)]
#[command(name = "climate")]
#[command(about = "Climate index analysis on Earth Engine")]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Log level
    #[arg(long, global = true, env = "CLIMATE_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Directory for credentials and custom catalog entries
    #[arg(long, global = true, env = "CLIMATE_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Authenticate with Earth Engine
    Authenticate {
        /// Earth Engine cloud project ID
        #[arg(long, env = "EE_PROJECT")]
        project: Option<String>,
    },

    /// Run climate analysis
    Analyze(AnalyzeArgs),

    /// Export analysis results
    Export(ExportArgs),

    /// List available datasets or indices
    List {
        #[arg(value_enum)]
        target: ListTarget,

        /// Index category (Precipitation, Temperature)
        #[arg(long)]
        category: Option<String>,
    },

    /// Register a custom dataset or index from a JSON file
    Register {
        #[arg(value_enum)]
        target: RegisterTarget,

        /// Registry key of the new entry
        name: String,

        /// JSON file with the entry's configuration
        #[arg(long)]
        file: PathBuf,
    },

    /// Show help for a command
    Help {
        /// Command to describe
        command: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Dataset name (ERA5, PRISM, DAYMET)
    pub dataset: String,

    /// Parameter (Precipitation, Temperature)
    pub parameter: String,

    /// Climate index name
    pub index: String,

    pub start_year: i32,

    pub end_year: i32,

    /// Geographic bounds
    #[arg(
        long,
        num_args = 4,
        value_names = ["WEST", "SOUTH", "EAST", "NORTH"],
        allow_negative_numbers = true,
        conflicts_with = "geojson"
    )]
    pub bounds: Option<Vec<f64>>,

    /// GeoJSON file with the analysis region
    #[arg(long)]
    pub geojson: Option<PathBuf>,

    /// Path to output JSON file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Years evaluated at once
    #[arg(long, env = "CLIMATE_CONCURRENCY")]
    pub concurrency: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export format (GeoTIFF, CSV, NetCDF)
    pub format: String,

    /// Export scope (current, all)
    pub scope: String,

    /// Path to input JSON file with analysis results
    #[arg(long, short)]
    pub input: PathBuf,

    /// Root directory for local exports
    #[arg(long, env = "CLIMATE_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListTarget {
    Datasets,
    Indices,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterTarget {
    Dataset,
    Index,
}
