use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::e_config::FoldCase;
use crate::e_render::{ColorChoice, Format};

#[derive(Parser, Debug)]
#[command(author, version, about = "diag-e is for Explain: compiler diagnostics next to your source.", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Print version and feature flags in JSON format.
    #[arg(
        long,
        short = 'v',
        help = "Print version and feature flags in JSON format."
    )]
    pub version: bool,

    #[arg(
        help = "Diagnostic log, e.g. the output of `go build -gcflags=-m`. Reads stdin when absent or \"-\"."
    )]
    pub log: Option<PathBuf>,

    #[arg(
        long = "dir",
        short = 'C',
        help = "Directory relative paths in the log are resolved against. (default: current directory)"
    )]
    pub dir: Option<PathBuf>,

    #[arg(
        long = "fold-case",
        value_enum,
        help = "Lower-case file paths before indexing. (default: auto, i.e. on Windows only)"
    )]
    pub fold_case: Option<FoldCase>,

    #[arg(
        long,
        short = 'c',
        help = "Settings file. (default: ./diag-e.toml when it exists)"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the files mentioned in the log.
    List {
        #[arg(long, help = "Print a JSON array instead of tab separated rows.")]
        json: bool,
    },

    /// Show one file with its diagnostics.
    View {
        #[arg(help = "File path as it appears in the log.")]
        path: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show every file with its diagnostics.
    Dump {
        #[arg(
            long,
            short = 'j',
            help = "Number of files read in parallel. (default: available parallelism)"
        )]
        jobs: Option<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the indexing counters as JSON.
    Stats,
}

#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(long, short = 'f', value_enum, default_value_t = Format::Json)]
    pub format: Format,

    #[arg(long, help = "Pretty-print JSON output.")]
    pub pretty: bool,

    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, help = "Color text output.")]
    pub color: ColorChoice,

    #[arg(
        long = "only-annotated",
        short = 'a',
        help = "Text output: skip lines without diagnostics."
    )]
    pub only_annotated: bool,
}
