use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gtd", about = concat!("gtd v", env!("CARGO_PKG_VERSION"), " - outline, reorder, and roll forward actions"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: gtd.toml beside the action file)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the filtered, sorted outline
    Outline(OutlineArgs),
    /// Drag an action onto another row
    Reorder(ReorderArgs),
    /// Nest an action under its preceding sibling
    Indent(MoveArgs),
    /// Move an action up one level, right after its parent
    Outdent(MoveArgs),
    /// Complete an action, spawning the next instance if it recurs
    Complete(CompleteArgs),
    /// Show upcoming occurrences of a recurring action
    Next(NextArgs),
    /// Validate the action file
    Check(CheckArgs),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct OutlineArgs {
    /// JSON file holding an array of actions
    pub file: PathBuf,
    /// Sibling order: manual, due-date, name, flagged, created (default: from config)
    #[arg(long)]
    pub sort: Option<String>,
    /// Hide the children of this action (repeatable)
    #[arg(long)]
    pub collapse: Vec<String>,
    /// Keep only these statuses (repeatable)
    #[arg(long)]
    pub status: Vec<String>,
    /// Drop these statuses (repeatable)
    #[arg(long)]
    pub exclude_status: Vec<String>,
    /// Quick filter: overdue, due-today, flagged, upcoming
    #[arg(long)]
    pub quick: Option<String>,
    /// Include actions deferred into the future
    #[arg(long)]
    pub show_deferred: bool,
    /// Keep only actions estimated at or under this many minutes
    #[arg(long)]
    pub max_minutes: Option<u32>,
    /// Filter by tag
    #[arg(long)]
    pub tag: Option<String>,
    /// Filter titles by regex
    #[arg(long)]
    pub search: Option<String>,
    /// Evaluate time-based filters at this RFC 3339 instant (default: now)
    #[arg(long)]
    pub now: Option<String>,
}

#[derive(Args)]
pub struct NextArgs {
    pub file: PathBuf,
    /// Recurring action ID
    pub id: String,
    /// How many occurrences to list
    #[arg(long, default_value = "5")]
    pub count: usize,
    /// Anchor time for undated actions or the completion policy, RFC 3339 (default: now)
    #[arg(long)]
    pub now: Option<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    pub file: PathBuf,
}

// ---------------------------------------------------------------------------
// Mutating command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ReorderArgs {
    pub file: PathBuf,
    /// Action being dragged
    pub dragged: String,
    /// Row it is dropped on
    pub target: String,
    /// Actions shown collapsed while dragging (repeatable)
    #[arg(long)]
    pub collapse: Vec<String>,
}

#[derive(Args)]
pub struct MoveArgs {
    pub file: PathBuf,
    pub id: String,
    /// Actions shown collapsed (repeatable)
    #[arg(long)]
    pub collapse: Vec<String>,
}

#[derive(Args)]
pub struct CompleteArgs {
    pub file: PathBuf,
    pub id: String,
    /// ID for the spawned instance of a recurring action
    #[arg(long)]
    pub next_id: Option<String>,
    /// Completion time, RFC 3339 (default: now)
    #[arg(long)]
    pub now: Option<String>,
}
