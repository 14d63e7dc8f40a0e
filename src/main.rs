//! capctl - Main entry point

use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};

use capctl::{
    run_context_command, run_env_command, run_login_command, run_logout_command, Cli, Command,
};

#[tokio::main]
async fn main() -> ExitCode {
    let mut cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    info!("Starting capctl v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        "CLI args: batch={}, output={}, log_level={}",
        cli.batch, cli.output, cli.log_level
    );

    let result = match &mut cli.command {
        Command::Login(args) => {
            // Owned, so the password can be moved into the credential
            let args = std::mem::take(args);
            run_login_command(&cli, args).await
        }
        Command::Logout => run_logout_command(&cli),
        Command::Context => run_context_command(&cli),
        Command::Environments => run_env_command(&cli),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
