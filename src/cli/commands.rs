//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: start the daemon loops in the foreground
//! - create: scan content sources and create scheduled tasks
//! - execute: claim and execute ready tasks once
//! - list/status: inspect tasks
//! - recover: run one stuck-task sweep
//! - project: manage projects and their content sources

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Postr - scheduled social media publishing daemon
#[derive(Parser, Debug)]
#[command(name = "postr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the daemon (execution + recovery loops) in the foreground
    Run,

    /// Create scheduled tasks from content sources
    Create {
        /// Ignore the daily cap and recreate existing tasks
        #[arg(short, long)]
        force: bool,
    },

    /// Claim and execute ready tasks, then exit
    Execute {
        /// Maximum number of tasks to execute
        #[arg(short, long, default_value_t = 1)]
        limit: usize,

        /// Only execute tasks for this project
        #[arg(short, long)]
        project: Option<String>,

        /// Only execute tasks with this content language
        #[arg(short = 'L', long)]
        language: Option<String>,
    },

    /// List tasks
    List {
        /// Filter by status (pending, locked, in_progress, retry, success, failed)
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by project name
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Show one task with its attempt history
    Status {
        /// Task ID
        id: i64,
    },

    /// Run one stuck-task recovery sweep
    Recover,

    /// Project management commands
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
}

/// Project management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ProjectCommands {
    /// Add a project with one content source
    Add {
        /// Project name
        name: String,

        /// Directory to scan for media
        #[arg(short, long)]
        source: PathBuf,

        /// Content language for the source
        #[arg(short = 'L', long, default_value = "en")]
        language: String,

        /// Allocation priority weight
        #[arg(short, long, default_value_t = 1)]
        priority: i64,
    },

    /// List all projects
    List,
}
