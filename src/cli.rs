//! Command-line surface. Stands in for the global shortcuts and menu bar.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Context Flow - snapshot and restore desktop workspace contexts
#[derive(Parser)]
#[command(name = "context-flow", version)]
#[command(about = "Snapshot and restore desktop workspace contexts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: ~/.context-flow)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Where window information comes from
    #[arg(long, value_enum, default_value_t = SourceKind::default(), global = true)]
    pub source: SourceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// The running desktop, through System Events
    Live,
    /// A fixed demo workspace that changes with the time of day
    Demo,
}

impl Default for SourceKind {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            SourceKind::Live
        } else {
            SourceKind::Demo
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture the current workspace as a new context
    Capture {
        /// Name for the context (default: detected from the windows)
        #[arg(long)]
        name: Option<String>,
    },
    /// Restore a saved context
    Restore { id: String },
    /// Restore the most recently used context
    QuickRestore,
    /// List saved contexts
    List,
    /// Show one context in full
    Show { id: String },
    /// Search contexts by name
    Search { query: String },
    /// Delete a context
    Delete { id: String },
    /// Rename a context
    Rename { id: String, name: String },
    /// Copy a context under a new id
    Duplicate { id: String },
    /// Folder commands
    Folder {
        #[command(subcommand)]
        command: FolderCommands,
    },
    /// Time tracking commands
    Timer {
        #[command(subcommand)]
        command: TimerCommands,
    },
    /// Template commands
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Suggest contexts to switch to
    Suggest,
    /// Compare two contexts
    Diff {
        a: String,
        b: String,
        /// Print a text report instead of JSON
        #[arg(long)]
        text: bool,
    },
    /// Export contexts
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Context to export (required for script formats)
        #[arg(long)]
        id: Option<String>,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Import contexts from an export file
    Import { file: PathBuf },
    /// Toggle focus mode and wait for Ctrl-C before turning it off
    Focus,
    /// Show or change settings
    Settings {
        /// Replace settings with the JSON in this file
        #[arg(long)]
        set: Option<PathBuf>,
    },
    /// Event statistics
    Analytics {
        /// Drop events older than this many days first
        #[arg(long)]
        cleanup_days: Option<u32>,
    },
    /// List application adapters and whether their apps are running
    Adapters,
    /// Run auto-snap in the foreground until Ctrl-C
    Watch {
        /// Minutes between periodic snapshots (default: from settings)
        #[arg(long)]
        interval_minutes: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum FolderCommands {
    List,
    Create {
        name: String,
        #[arg(long)]
        emoji: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Rename { id: String, name: String },
    Delete { id: String },
    Add { context: String, folder: String },
    Remove { context: String, folder: String },
    Move {
        context: String,
        to: String,
        #[arg(long)]
        from: Option<String>,
    },
    /// Put the listed folders first, in this order
    Reorder { ids: Vec<String> },
    /// Contexts grouped by folder
    Organized,
}

#[derive(Subcommand)]
pub enum TimerCommands {
    /// Track a pomodoro in the foreground
    Pomodoro {
        context: String,
        #[arg(long, default_value = "25")]
        minutes: u64,
    },
    /// Tracked seconds for a context
    Total {
        context: String,
        #[arg(long, default_value = "7")]
        days: u32,
    },
    /// Sessions for a day (default: today)
    Daily {
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// Hours per day for the last week
    Weekly,
    /// Context with the most tracked time
    MostProductive {
        #[arg(long, default_value = "7")]
        days: u32,
    },
    /// Progress toward today's goal
    Goal,
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    List {
        #[arg(long)]
        category: Option<String>,
    },
    Categories,
    Show { id: String },
    Create {
        name: String,
        #[arg(long, default_value = "✨")]
        emoji: String,
        #[arg(long, default_value = "personal")]
        category: String,
        /// Applications to launch
        #[arg(required = true)]
        apps: Vec<String>,
    },
    Delete { id: String },
    Apply { id: String },
    /// Apply a template and save the result as a context
    Snap {
        id: String,
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Shell,
    Applescript,
}
