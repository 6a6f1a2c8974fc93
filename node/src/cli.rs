//! # CLI Interface
//!
//! Command-line structure for `tessera-node`, via `clap` derive. Every
//! subcommand that touches a replica takes `--db`, which can also come from
//! `TESSERA_DB`; commands that sign take `--keyfile` / `TESSERA_KEYFILE`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use tessera_protocol::sync::SyncDirection;

use crate::logging::LogFormat;

/// A local tessera replica.
///
/// Creates and inspects a sled-backed replica of one workspace, writes signed
/// documents into it, and syncs it with another replica on the same machine.
#[derive(Parser, Debug)]
#[command(
    name = "tessera-node",
    about = "Local tessera replica",
    version,
    propagate_version = true
)]
pub struct TesseraCli {
    /// Log output format. Logs go to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an author keypair.
    Keygen(KeygenArgs),
    /// Create a replica, or adopt an existing one for the same workspace.
    Init(InitArgs),
    /// Sign and write a document.
    Set(SetArgs),
    /// Print the current value at a path.
    Get(GetArgs),
    /// List documents.
    Ls(LsArgs),
    /// List every author with a document in the replica.
    Authors(DbArgs),
    /// One-shot sync with another local replica.
    Sync(SyncArgs),
    /// Print version information and exit.
    Version,
}

/// Location of the replica.
#[derive(Args, Debug)]
pub struct DbArgs {
    /// Replica directory.
    #[arg(long, env = "TESSERA_DB")]
    pub db: PathBuf,
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Four-character short name, e.g. `suzy`.
    #[arg(long)]
    pub name: String,

    /// Write the keypair here instead of stdout.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Workspace address, e.g. `+gardenclub.xxxxxxxxxxxxxxxxxxxx`.
    #[arg(long)]
    pub workspace: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Keypair file written by `keygen`.
    #[arg(long, env = "TESSERA_KEYFILE")]
    pub keyfile: PathBuf,

    #[arg(long)]
    pub path: String,

    #[arg(long)]
    pub value: String,

    /// Microseconds since the epoch. Defaults to now.
    #[arg(long)]
    pub timestamp: Option<i64>,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub db: DbArgs,

    #[arg(long)]
    pub path: String,

    /// Print the whole document as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct LsArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Only paths starting with this.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Every author's latest document, not just the winner.
    #[arg(long)]
    pub history: bool,

    /// Only documents by this author address.
    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub limit: Option<usize>,

    /// One JSON document per line.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// The other replica's directory.
    #[arg(long)]
    pub other: PathBuf,

    #[arg(long, value_enum, default_value_t = Direction::Both)]
    pub direction: Direction,
}

/// Command-line spelling of [`SyncDirection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Push,
    Pull,
    Both,
}

impl From<Direction> for SyncDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Push => SyncDirection::Push,
            Direction::Pull => SyncDirection::Pull,
            Direction::Both => SyncDirection::Both,
        }
    }
}
