use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mp", about = concat!("missions v", env!("CARGO_PKG_VERSION"), " - tasks in colored categories"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'D', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and a default config.toml
    Init(InitArgs),
    /// Create an account and sign in
    Signup(SignupArgs),
    /// Sign in to an existing account
    Signin(SigninArgs),
    /// Sign out and drop the local session
    Signout,
    /// Show who is signed in
    Whoami,
    /// List categories and their tasks
    List(ListArgs),
    /// Show completion statistics
    Stats,
    /// Category management
    Category(CategoryCmd),
    /// Add a task to the end of a category
    Add(AddArgs),
    /// Flip a task between open and done
    Toggle(TaskRefArgs),
    /// Delete a task
    Rm(TaskRefArgs),
    /// Move a task one place up
    Up(TaskRefArgs),
    /// Move a task one place down
    Down(TaskRefArgs),
    /// Change a task's text
    Edit(EditArgs),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
    /// Read or change config.toml
    Config(ConfigCmd),
}

// ---------------------------------------------------------------------------
// Setup and account args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct SignupArgs {
    /// Full name shown in greetings
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    /// At least 6 characters
    #[arg(long)]
    pub password: String,
}

#[derive(Args)]
pub struct SigninArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Category id or name (default: all)
    pub category: Option<String>,
}

// ---------------------------------------------------------------------------
// Category args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct CategoryCmd {
    #[command(subcommand)]
    pub action: CategoryAction,
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Create a new, empty category
    Add(CategoryAddArgs),
    /// Delete a category and all of its tasks
    Rm(CategoryRmArgs),
    /// Rename a category
    Rename(CategoryRenameArgs),
    /// Change a category's color
    Color(CategoryColorArgs),
    /// Show the preset color palette
    Colors,
}

#[derive(Args)]
pub struct CategoryAddArgs {
    pub name: String,
    /// Hex color (#RRGGBB) or palette number 1-15 (default: 1)
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct CategoryRmArgs {
    /// Category id or name
    pub category: String,
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args)]
pub struct CategoryRenameArgs {
    /// Category id or name
    pub category: String,
    /// New name
    pub name: String,
}

#[derive(Args)]
pub struct CategoryColorArgs {
    /// Category id or name
    pub category: String,
    /// Hex color (#RRGGBB) or palette number 1-15
    pub color: String,
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Category id or name
    pub category: String,
    /// Task text
    pub text: String,
}

#[derive(Args)]
pub struct TaskRefArgs {
    /// Category id or name
    pub category: String,
    /// Task id (see `mp list`)
    pub task_id: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Category id or name
    pub category: String,
    pub task_id: String,
    /// Replacement text
    pub text: String,
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove entries older than 30 days
    Prune(RecoveryPruneArgs),
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove every entry
    #[arg(long)]
    pub all: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a config value
    Get(ConfigGetArgs),
    /// Set a config value, keeping comments intact
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigGetArgs {
    /// One of: storage.slot, log.level, session.required
    pub key: String,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}
