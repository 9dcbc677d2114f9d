//! CLI argument parsing with clap

use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

/// optup - update locally installed IDEs and version managers
#[derive(Parser, Debug)]
#[command(name = "optup")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Pass ALL to update every registered tool.")]
pub struct Cli {
    /// Tools to update, by short name (or ALL)
    #[arg(value_name = "TOOL")]
    pub tools: Vec<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Only report whether updates are available
    #[arg(long)]
    pub check: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL", exclusive = true)]
    pub completions: Option<Shell>,

    /// Installation root (overrides config and OPTUP_INSTALL_ROOT)
    #[arg(long, value_name = "DIR")]
    pub install_root: Option<PathBuf>,

    /// Directory holding the command links (overrides config and OPTUP_BIN_DIR)
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,

    /// Log download progress instead of drawing a progress bar
    #[arg(long)]
    pub no_progress: bool,
}
