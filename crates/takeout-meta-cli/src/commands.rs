use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "takeout-meta")]
#[command(about = "Pair exported photos and videos with their JSON sidecars", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Match every media file with its sidecar and print the pairing
    Match(MatchArgs),
    /// List sidecar files whose media file is gone, optionally deleting them
    Orphans(OrphanArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct RootArgs {
    /// Directories to process; overrides `root_paths` from the configuration
    pub paths: Vec<PathBuf>,

    /// Only look at the top level of each directory
    #[arg(long)]
    pub no_recursive: bool,
}

#[derive(Debug, Args)]
pub struct MatchArgs {
    #[command(flatten)]
    pub roots: RootArgs,

    /// Write results as a JSON array to stdout
    #[arg(long)]
    pub json: bool,

    /// Only list media files without a sidecar
    #[arg(long)]
    pub unmatched: bool,
}

#[derive(Debug, Args)]
pub struct OrphanArgs {
    #[command(flatten)]
    pub roots: RootArgs,

    /// Delete the orphaned sidecars
    #[arg(long)]
    pub delete: bool,

    /// Report what would be deleted without deleting anything
    #[arg(long, requires = "delete")]
    pub dry_run: bool,

    /// Copy each sidecar here before deleting it
    #[arg(long, value_name = "DIR", requires = "delete")]
    pub backup_dir: Option<PathBuf>,

    /// Do not ask for confirmation before deleting
    #[arg(long, short = 'y')]
    pub yes: bool,
}
