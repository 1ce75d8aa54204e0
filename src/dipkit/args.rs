use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dipkit")]
#[command(about = "Restructure folder-backed document projects", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project directory (defaults to the nearest enclosing project)
    #[arg(short = 'C', long, global = true)]
    pub project: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Where a new or moved element goes among its siblings.
#[derive(Args, Debug, Default)]
pub struct PlaceArgs {
    /// Put it first among its kind
    #[arg(long, conflicts_with_all = ["before", "after"])]
    pub start: bool,

    /// Put it right before this sibling
    #[arg(long, conflicts_with = "after")]
    pub before: Option<String>,

    /// Put it right after this sibling
    #[arg(long)]
    pub after: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new project in the current directory
    Init {
        /// Name of the project directory
        name: String,
    },

    /// Print the project tree
    #[command(alias = "ls")]
    Tree,

    /// Print the IDs and location of an element
    Id {
        /// Element ID relative to the project (e.g. req/010.txt)
        element: String,
    },

    /// Create a folder
    Mkdir {
        /// Parent folder ("." for the project root)
        parent: String,

        /// Folder name (numbered automatically if omitted)
        name: Option<String>,

        #[command(flatten)]
        place: PlaceArgs,
    },

    /// Create a unit, or an attachment with --attachment
    #[command(alias = "n")]
    New {
        /// Parent folder ("." for the project root)
        parent: String,

        /// File name (numbered automatically if omitted)
        name: Option<String>,

        /// Initial content
        #[arg(short, long, default_value = "")]
        content: String,

        /// Create a .report or .xml attachment
        #[arg(long)]
        attachment: bool,

        #[command(flatten)]
        place: PlaceArgs,
    },

    /// Rename an element
    Rename { element: String, new_name: String },

    /// Move an element into another folder
    Mv {
        element: String,
        target: String,

        #[command(flatten)]
        place: PlaceArgs,
    },

    /// Copy an element into a folder
    Cp {
        element: String,
        target: String,

        /// Name of the copy
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        place: PlaceArgs,
    },

    /// Delete one or more elements
    Rm {
        #[arg(required = true, num_args = 1..)]
        elements: Vec<String>,

        /// Leave a reserved placeholder behind
        #[arg(long)]
        reserve: bool,

        /// Keep a snapshot copy of what is deleted
        #[arg(long)]
        tmp: bool,
    },

    /// Bring a reserved element back
    Unreserve { element: String },

    /// Move a folder's children up and remove the folder
    Extract { folder: String },

    /// Move elements one step up
    Up {
        #[arg(required = true, num_args = 1..)]
        elements: Vec<String>,
    },

    /// Move elements one step down
    Down {
        #[arg(required = true, num_args = 1..)]
        elements: Vec<String>,
    },

    /// Disable an element (dis. prefix)
    Disable { element: String },

    /// Re-enable a disabled element
    Enable { element: String },

    /// Copy a file or directory from outside into the project
    Paste {
        source: PathBuf,

        /// Target folder
        #[arg(long, default_value = ".")]
        into: String,

        /// Paste as a .report or .xml attachment
        #[arg(long)]
        attachment: bool,

        #[command(flatten)]
        place: PlaceArgs,
    },

    /// Turn automatic numbering on or off for a folder
    Number {
        folder: String,

        /// Number new files
        #[arg(long)]
        files: bool,

        /// Number new folders
        #[arg(long)]
        folders: bool,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (e.g., reserve-policy)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}
