//! CLI argument definitions using clap derive

use crate::coordinate::{CoordinateSpec, Kind};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Coffer - versioned artifact cache
///
/// Publishes files and directories to a remote store under
/// group:name:version and resolves them back to local paths, downloading
/// each one at most once per cache.
#[derive(Parser, Debug)]
#[command(name = "coffer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "COFFER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache root (overrides [cache] root)
    #[arg(long, global = true, env = "COFFER_CACHE_ROOT")]
    pub cache_root: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a file or directory
    Publish(PublishArgs),

    /// Resolve an artifact to a local path, downloading it if needed
    Fetch(FetchArgs),

    /// List cached artifacts
    List(ListArgs),

    /// Remove one artifact from the local cache
    Evict(EvictArgs),

    /// Delete an artifact version from the remote store
    Unpublish(UnpublishArgs),

    /// Delete the whole local cache
    Wipe(WipeArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the publish command
#[derive(Parser, Debug)]
pub struct PublishArgs {
    /// File or directory to upload (directories are archived)
    pub path: PathBuf,

    /// Target coordinate, group:name:version
    pub coordinate: CoordinateSpec,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Artifact coordinate, group:name:version
    pub coordinate: CoordinateSpec,

    /// Resolve the directory artifact instead of the file
    #[arg(short, long)]
    pub dir: bool,
}

impl FetchArgs {
    pub fn kind(&self) -> Kind {
        kind_for(self.dir)
    }
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the evict command
#[derive(Parser, Debug)]
pub struct EvictArgs {
    /// Artifact coordinate, group:name:version
    pub coordinate: CoordinateSpec,

    /// Evict the directory artifact instead of the file
    #[arg(short, long)]
    pub dir: bool,
}

impl EvictArgs {
    pub fn kind(&self) -> Kind {
        kind_for(self.dir)
    }
}

/// Arguments for the unpublish command
#[derive(Parser, Debug)]
pub struct UnpublishArgs {
    /// Artifact coordinate, group:name:version
    pub coordinate: CoordinateSpec,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the wipe command
#[derive(Parser, Debug)]
pub struct WipeArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., store.url)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for the list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// One path per line
    Plain,
}

/// Format of diagnostic log lines on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

fn kind_for(dir: bool) -> Kind {
    if dir {
        Kind::Directory
    } else {
        Kind::File
    }
}
