//! Command-line arguments

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{browse, classify, completions, options, plot, rows, tools};

#[derive(Parser, Debug)]
#[command(name = "metroscope")]
#[command(author, version, about = "Faceted filtering and threshold analytics for per-tool measurement data")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Directory holding the Tool_<id>.db files (overrides config)
    #[arg(long, global = true, env = "METROSCOPE_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file (default: ./metroscope.yaml, then the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pick a format suited to the command
    #[default]
    Auto,
    /// Tab-separated values
    Tsv,
    /// Comma-separated values
    Csv,
    Json,
    Yaml,
    /// Boxed terminal table
    Table,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the tools with a database in the data directory
    Tools(tools::ToolsArgs),

    /// Show the options each facet offers under a selection
    Options(options::OptionsArgs),

    /// Show the records matching a selection
    Rows(rows::RowsArgs),

    /// Summarize threshold tags and fit lines for a selection
    Classify(classify::ClassifyArgs),

    /// Draw a plot of the filtered records in the terminal
    Plot(plot::PlotArgs),

    /// Narrow a selection interactively, one facet at a time
    Browse(browse::BrowseArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
