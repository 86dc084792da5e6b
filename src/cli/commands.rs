use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tc", about = concat!("task champion v", env!("CARGO_PKG_VERSION"), " - finish tasks, earn xp"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks, one block per module
    List(ListArgs),
    /// List known modules
    Modules,
    /// Module management
    Module(ModuleCmd),
    /// Add a task
    Add(AddArgs),
    /// Change fields of a task
    Modify(ModifyArgs),
    /// Mark a task completed
    Done(TaskRefArgs),
    /// Mark a completed task pending again
    Undo(TaskRefArgs),
    /// Delete a task
    Delete(TaskRefArgs),
    /// Show XP bars, or change multipliers
    Xp(XpCmd),
    /// Set the default sort order
    Sort(SortArgs),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Module to list (default: all modules)
    pub module: Option<String>,
    /// Sort order for this listing (e.g. priority, description-descending)
    #[arg(long)]
    pub sort: Option<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task description
    #[arg(required = true, num_args = 1..)]
    pub description: Vec<String>,
    /// Module to add the task to (default: Main)
    #[arg(short, long)]
    pub module: Option<String>,
    /// Priority: H, M or L
    #[arg(short, long)]
    pub priority: Option<String>,
    /// Project name
    #[arg(long)]
    pub project: Option<String>,
    /// Tag (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
    /// Due date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub due: Option<String>,
    /// Recurrence period (e.g. weekly)
    #[arg(long)]
    pub recur: Option<String>,
    /// Extra column: --col KEY=VALUE (repeatable)
    #[arg(long = "col", value_name = "KEY=VALUE")]
    pub columns: Vec<String>,
}

#[derive(Args)]
pub struct ModifyArgs {
    /// Module the task is in
    pub module: String,
    /// Position in the module listing (starting at 1)
    pub index: usize,
    /// Changes as FIELD=VALUE (an empty VALUE clears the field)
    #[arg(required = true, num_args = 1.., value_name = "FIELD=VALUE")]
    pub fields: Vec<String>,
}

#[derive(Args)]
pub struct TaskRefArgs {
    /// Module the task is in
    pub module: String,
    /// Position in the module listing (starting at 1)
    pub index: usize,
}

#[derive(Args)]
pub struct SortArgs {
    /// Sort metric (id, priority, description; -ascending or -descending)
    pub metric: String,
}

// ---------------------------------------------------------------------------
// Module management args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ModuleCmd {
    #[command(subcommand)]
    pub action: ModuleAction,
}

#[derive(Subcommand)]
pub enum ModuleAction {
    /// Create an empty module
    Add(ModuleAddArgs),
    /// Create the preset modules (Workouts, Personal Finance, Programming Project)
    Preset,
}

#[derive(Args)]
pub struct ModuleAddArgs {
    /// Module name
    pub name: String,
}

// ---------------------------------------------------------------------------
// XP args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct XpCmd {
    #[command(subcommand)]
    pub action: Option<XpAction>,
}

#[derive(Subcommand)]
pub enum XpAction {
    /// Set a multiplier in the XP config
    Set(XpSetArgs),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MultiplierKind {
    Priority,
    Tag,
    Project,
}

#[derive(Args)]
pub struct XpSetArgs {
    /// Which multiplier table to change
    #[arg(value_enum)]
    pub kind: MultiplierKind,
    /// Priority code (H, M, L, none), tag or project name
    pub key: String,
    /// Multiplier value
    pub value: f64,
}
