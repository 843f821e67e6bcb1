use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ct",
    about = concat!("contree v", env!("CARGO_PKG_VERSION"), " - grouped content lists"),
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different project directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new contree project in the current directory
    Init(InitArgs),
    /// Show the content tree
    Tree(TreeArgs),
    /// Add a content to a root list or a group
    Add(AddArgs),
    /// Group management
    Group(GroupCmd),
    /// Move a content next to another, or into an empty list
    Mv(MvArgs),
    /// Delete a content (a group takes its children with it)
    Rm(RmArgs),
    /// Check whether the group owning a content still exists
    Check(CheckArgs),
}

// ---------------------------------------------------------------------------
// Init / read args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Project name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Language for group titles (en, de, fr, ja)
    #[arg(long, default_value = "en")]
    pub language: String,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Only show this category
    #[arg(long)]
    pub category: Option<String>,
    /// Only show pinned lists and this screen's lists
    #[arg(long)]
    pub screen: Option<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Category (overlay, measurement, ess, map, metadata)
    pub category: String,
    /// Content kind (layer, measurement, annotation, blueprint, equipment)
    pub kind: String,
    /// Title
    pub title: String,
    /// Add inside this group
    #[arg(long)]
    pub group: Option<String>,
    /// Scope to a screen instead of pinning
    #[arg(long)]
    pub screen: Option<String>,
}

#[derive(Args)]
pub struct GroupCmd {
    #[command(subcommand)]
    pub action: GroupAction,
}

#[derive(Subcommand)]
pub enum GroupAction {
    /// Create an empty group, numbered if no title is given
    New(GroupNewArgs),
    /// Duplicate a group with all its children
    Copy(GroupCopyArgs),
}

#[derive(Args)]
pub struct GroupNewArgs {
    /// Category (overlay, measurement, ess, map, metadata)
    pub category: String,
    /// Title (default: next "Group - n")
    #[arg(long)]
    pub title: Option<String>,
    /// Scope to a screen instead of pinning
    #[arg(long)]
    pub screen: Option<String>,
}

#[derive(Args)]
pub struct GroupCopyArgs {
    /// Group to duplicate
    pub id: String,
    /// Place the copy in this screen's list (default: the source's list)
    #[arg(long, conflicts_with = "pinned")]
    pub screen: Option<String>,
    /// Place the copy in the pinned list
    #[arg(long)]
    pub pinned: bool,
}

#[derive(Args)]
pub struct MvArgs {
    /// Content to move
    pub id: String,
    /// Drop in front of this content
    #[arg(long, conflicts_with_all = ["after", "empty_list"])]
    pub before: Option<String>,
    /// Drop behind this content
    #[arg(long, conflicts_with = "empty_list")]
    pub after: Option<String>,
    /// Drop into the empty opposite list (pinned <-> screen)
    #[arg(long)]
    pub empty_list: bool,
    /// Screen shown while dropping; needed to reach an empty screen list
    #[arg(long)]
    pub screen: Option<String>,
}

#[derive(Args)]
pub struct RmArgs {
    /// Content to delete
    pub id: String,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Content whose group to check
    pub id: String,
}
