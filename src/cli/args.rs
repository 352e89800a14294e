//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::domain::Perspective;

/// Data-catalog mind map: fold catalog records into trees and lay them out
#[derive(Parser, Debug)]
#[command(name = "catmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file applied over the global one
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Record source and grouping shared by the view commands
#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// JSON record dump: a file, or a directory with one file per perspective
    #[arg(value_hint = ValueHint::AnyPath)]
    pub source: String,

    /// Grouping axis: org | domain (default from config)
    #[arg(short, long)]
    pub perspective: Option<Perspective>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the view tree
    Tree {
        #[command(flatten)]
        view: ViewArgs,

        /// Collapse a node before printing (repeatable)
        #[arg(long = "collapse", value_name = "ID")]
        collapse: Vec<String>,
    },

    /// Print laid-out nodes and edges
    Layout {
        #[command(flatten)]
        view: ViewArgs,

        /// Collapse a node before layout (repeatable)
        #[arg(long = "collapse", value_name = "ID")]
        collapse: Vec<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Render onto an in-memory surface and replay toggles
    Render {
        #[command(flatten)]
        view: ViewArgs,

        /// Toggle a node, one reconcile pass each (repeatable, in order)
        #[arg(long = "toggle", value_name = "ID")]
        toggle: Vec<String>,
    },

    /// Find nodes by name
    Find {
        #[command(flatten)]
        view: ViewArgs,

        /// Case-insensitive name fragment
        query: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Print a config template
    Template,
}
