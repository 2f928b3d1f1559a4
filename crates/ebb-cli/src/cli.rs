use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ebb_core::UserChoice;

#[derive(Parser)]
#[command(name = "ebb")]
#[command(about = "Offline-first todos from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Remote API base URL (overrides EBB_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Skip the remote store entirely; every write is queued
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new todo
    #[command(alias = "new")]
    Add {
        /// Todo title
        title: Vec<String>,
    },
    /// List todos
    #[command(alias = "ls")]
    List {
        /// Include deleted todos
        #[arg(short, long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a todo's title
    Edit {
        /// Todo ID
        id: String,
        /// New title
        title: Vec<String>,
    },
    /// Flip a todo's completion
    Toggle {
        /// Todo ID
        id: String,
    },
    /// Mark a todo completed
    Done {
        /// Todo ID
        id: String,
    },
    /// Delete a todo
    #[command(alias = "rm")]
    Delete {
        /// Todo ID
        id: String,
    },
    /// Replay queued changes against the remote store
    Sync,
    /// Show connectivity and queue state
    Status,
    /// Show conflicts waiting on a decision and recently resolved ones
    Conflicts {
        /// Number of resolved conflicts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Settle a held conflict
    Resolve {
        /// Pending action ID shown by `ebb conflicts`
        action_id: String,
        /// Which version to keep
        #[arg(value_enum)]
        choice: ResolveChoice,
    },
    /// Poll connectivity and sync on every reconnect until interrupted
    Watch,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ResolveChoice {
    /// Keep the server's version
    Server,
    /// Keep the local version
    Client,
    /// Merge both versions
    Merge,
}

impl From<ResolveChoice> for UserChoice {
    fn from(choice: ResolveChoice) -> Self {
        match choice {
            ResolveChoice::Server => Self::Server,
            ResolveChoice::Client => Self::Client,
            ResolveChoice::Merge => Self::Merge,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
