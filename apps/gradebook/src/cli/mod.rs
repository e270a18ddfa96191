//! # Gradebook CLI Module
//!
//! This module implements the CLI interface for the gradebook.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database
//! - `status` - Show record counts
//! - `list` - List students, optionally by subject
//! - `add` / `show` / `edit` / `delete` - Manage one student
//! - `export` / `import` - Exchange student documents
//! - `bundle` - Write the source tree as a ZIP archive

mod commands;

use crate::config::{Backend, Config};
use clap::{Parser, Subcommand};
use gradebook_core::GradebookError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Gradebook - student grade tracker
///
/// Keeps four quarterly scores per subject for each student and derives
/// averages, extremes, and academic standing from them.
#[derive(Parser, Debug)]
#[command(name = "gradebook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: ./gradebook.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the student database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show record counts
    Status,

    /// List students
    List {
        /// Only students graded in this subject, ordered by name
        #[arg(short, long)]
        subject: Option<String>,
    },

    /// Add a student (enrolled in every default subject)
    Add {
        /// Student name
        #[arg(short, long)]
        name: String,

        /// Learner reference number
        #[arg(long)]
        lrn: Option<String>,

        /// Nickname
        #[arg(long)]
        nickname: Option<String>,

        /// Grade assignment "Subject=q1,q2,q3,q4" (repeatable)
        #[arg(short, long = "grade")]
        grades: Vec<String>,
    },

    /// Show one student with statistics
    Show {
        /// Student ID
        id: u64,
    },

    /// Update a student
    Edit {
        /// Student ID
        id: u64,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New learner reference number (empty clears it)
        #[arg(long)]
        lrn: Option<String>,

        /// New nickname (empty clears it)
        #[arg(long)]
        nickname: Option<String>,

        /// Grade assignment "Subject=q1,q2,q3,q4" (repeatable)
        #[arg(short, long = "grade")]
        grades: Vec<String>,
    },

    /// Delete a student and its grades
    Delete {
        /// Student ID
        id: u64,
    },

    /// Export one student as a JSON document
    Export {
        /// Student ID
        id: u64,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a student from a JSON document
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Write the source tree as a ZIP archive
    Bundle {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve the layered configuration for this invocation.
///
/// CLI flags override the environment, which overrides the config file.
pub fn resolve_config(cli: &Cli) -> Result<Config, GradebookError> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(Commands::Server { host, port }) = &cli.command {
        if let Some(host) = host {
            config.host = host.clone();
        }
        if let Some(port) = port {
            config.port = *port;
        }
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), GradebookError> {
    let config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&config).await,
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Status) => cmd_status(&config, json_mode),
        Some(Commands::List { subject }) => cmd_list(&config, json_mode, subject.as_deref()),
        Some(Commands::Add {
            name,
            lrn,
            nickname,
            grades,
        }) => cmd_add(&config, json_mode, name, lrn, nickname, &grades),
        Some(Commands::Show { id }) => cmd_show(&config, json_mode, id),
        Some(Commands::Edit {
            id,
            name,
            lrn,
            nickname,
            grades,
        }) => cmd_edit(&config, json_mode, id, name, lrn, nickname, &grades),
        Some(Commands::Delete { id }) => cmd_delete(&config, id),
        Some(Commands::Export { id, output }) => cmd_export(&config, id, &output),
        Some(Commands::Import { input }) => cmd_import(&config, json_mode, &input),
        Some(Commands::Bundle { output }) => cmd_bundle(&config, &output),
        None => {
            // No subcommand - show status by default
            cmd_status(&config, json_mode)
        }
    }
}
