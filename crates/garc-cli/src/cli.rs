use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(
    name = "garc",
    about = "Inspect and produce GARC expression archives",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format; overrides the config file
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// TOML file with CLI defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the raw atom, root, and node tables
    Dump(FileArgs),
    /// List the named expressions
    List(FileArgs),
    /// Unarchive expressions and print them
    Show(ShowArgs),
    /// Structural summary of an archive
    Summary(FileArgs),
    /// Write a demo archive with shared sub-expressions
    Demo(FileArgs),
}

#[derive(Args)]
pub struct FileArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ShowArgs {
    pub file: PathBuf,
    /// Expression name; all expressions when omitted
    pub name: Option<String>,
    /// Expression index instead of a name
    #[arg(long, conflicts_with = "name")]
    pub index: Option<usize>,
    /// Symbols to reconcile archived symbols against, by name
    #[arg(long = "symbol")]
    pub symbols: Vec<String>,
}
