//! CLI argument parsing

mod enums;
mod login;

use clap::{Parser, Subcommand};

use crate::config::defaults;

pub use enums::OutputFormat;
pub use login::LoginArgs;

/// Capacity account login CLI
#[derive(Parser, Debug)]
#[command(name = "capctl")]
#[command(version)]
#[command(
    about = "Log into Power BI Embedded capacity environments",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, global = true, default_value = defaults::LOG_LEVEL)]
    pub log_level: String,

    /// Batch mode: never prompt, never start interactive logins
    #[arg(long, global = true, default_value_t = false)]
    pub batch: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log into a capacity environment
    #[command(visible_alias = "add-account")]
    Login(LoginArgs),

    /// Forget the current session
    Logout,

    /// Show the current session context
    Context,

    /// List known environments
    #[command(name = "env")]
    Environments,
}
