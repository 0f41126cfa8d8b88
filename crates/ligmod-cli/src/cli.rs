use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LIGMOD CLI - A command-line interface for LIGMOD, a tool for index-based ligand editing with tethered regeneration of 3D geometry.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Produce every ligand variant described by a run file.
    Run(RunArgs),
    /// Print the indexed atom table of a ligand file, for picking edit targets.
    Inspect(InspectArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the reference ligand path from the run file.
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Override the output directory from the run file.
    #[arg(short, long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Fix the embedding random seed, overriding the run file.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the ligand structure file (SDF).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Fold explicit hydrogen atoms into their heavy neighbors before
    /// listing, so indices match a run file using the 'strip' policy.
    #[arg(long)]
    pub strip_hydrogens: bool,

    /// Show only the atom at this zero-based index.
    #[arg(short, long, value_name = "INDEX")]
    pub atom: Option<usize>,
}
