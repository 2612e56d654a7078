//! CLI command parsing and execution.

pub mod auth;
pub mod history;

use clap::{Args, Parser, Subcommand};

use crate::core::export::ExportFormat;

/// taskplan - turn a sentence into a timed task list.
#[derive(Parser)]
#[command(name = "taskplan")]
#[command(about = "Turn a sentence into a timed task list")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// What to plan (one-shot mode).
    ///
    /// Generates a plan, prints it, and saves it as the last plan.
    pub prompt: Option<String>,

    /// Increase logging verbosity.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a plan and print it.
    #[command(visible_alias = "p")]
    Plan(PlanArgs),

    /// Start the TUI interface.
    Tui,

    /// Start the HTTP API server.
    Serve {
        /// Host to bind to (defaults to `api.host`).
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (defaults to `api.port`).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the last saved plan.
    Last {
        /// Output format (text, json or markdown).
        #[arg(short, long, default_value = "text")]
        format: ExportFormat,
    },

    /// Browse saved plans.
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Print the response schema sent to the model.
    Schema,

    /// Manage the Gemini API key.
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Manage configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// What to plan.
    pub prompt: String,

    /// Output format (text, json or markdown).
    #[arg(short, long, default_value = "text")]
    pub format: ExportFormat,

    /// Don't save the plan to history.
    #[arg(long)]
    pub no_save: bool,

    /// Always ask the model, even for a recently seen prompt.
    #[arg(long)]
    pub no_cache: bool,
}

impl PlanArgs {
    /// Args for one-shot mode (bare prompt).
    #[must_use]
    pub fn one_shot(prompt: String) -> Self {
        Self {
            prompt,
            format: ExportFormat::Text,
            no_save: false,
            no_cache: false,
        }
    }
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List saved plans, newest first.
    List {
        /// Limit number of plans shown.
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output format (table or json).
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show a saved plan.
    Show {
        /// Plan ID or unique prefix.
        id: String,

        /// Output format (text, json or markdown).
        #[arg(short, long, default_value = "text")]
        format: ExportFormat,

        /// Output file path (stdout if not specified).
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Delete a saved plan.
    #[command(visible_alias = "rm")]
    Remove {
        /// Plan ID or unique prefix.
        id: String,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store a Gemini API key in the system keychain.
    Login(LoginArgs),

    /// Remove the stored API key.
    Logout,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    /// API key (prompted for when omitted).
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current configuration.
    Show,

    /// Show the configuration file path.
    Path,

    /// Generate a new API token for remote access.
    GenerateToken,
}
