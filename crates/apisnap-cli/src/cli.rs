//! Command line arguments

use clap::Parser;
use std::path::PathBuf;

/// Synchronize the committed API schema snapshot with a running service
#[derive(Debug, Clone, Parser)]
#[command(name = "apisnap", version, about)]
pub(crate) struct Cli {
    /// Package name of the service under test
    #[arg(short = 'p', long)]
    pub(crate) package: String,

    /// Directory holding the schema snapshot
    #[arg(long)]
    pub(crate) schema_dir: PathBuf,

    /// Log every discovered method at the end of the run
    #[arg(long)]
    pub(crate) list_all: bool,

    /// Base URL of the service (overrides the config file)
    #[arg(long)]
    pub(crate) node_url: Option<String>,

    /// TOML file with roles, identities and connection settings
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Extra root certificate for the service (overrides the config file)
    #[arg(long)]
    pub(crate) ca_cert: Option<PathBuf>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub(crate) json: bool,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub(crate) verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub(crate) log_json: bool,
}
