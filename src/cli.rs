use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "yawn",
    bin_name = "yawn",
    about = "yawn - Yet Another Wacky Notes tool",
    arg_required_else_help = true,
    disable_version_flag = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default is $HOME/.yawn.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Create a new note
    New,
    /// Find a note with the fuzzy finder and edit it
    Find,
    /// Print the yawn version
    Version,
}

pub fn version() -> String {
    format!("v{}", env!("CARGO_PKG_VERSION"))
}
