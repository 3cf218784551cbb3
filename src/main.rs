mod adapters;
mod cli;
mod config;
mod core;

use clap::Parser;

use crate::cli::commands::process::Identities;
use crate::cli::{Cli, Commands};
use crate::config::gpg_config::{ConfigOverrides, GpgConfig};
use crate::core::errors::Result;
use crate::core::models::operation::Operation;

fn main() {
    let args = Cli::parse();
    cli::logging::init(args.verbose);

    if let Err(e) = run(&args) {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}

fn run(args: &Cli) -> Result<()> {
    let overrides = ConfigOverrides {
        gpg_path: args.gpg_path.clone(),
        timeout_secs: args.timeout,
        cleanup_on_failure: args.cleanup_on_failure,
    };
    config::gpg_config::init(GpgConfig::resolve(args.config.as_deref(), &overrides)?);

    match &args.command {
        Commands::Encrypt { io, recipient } => cli::commands::process::execute(
            Operation::Encrypt,
            io,
            Identities {
                recipient: recipient.as_deref(),
                ..Default::default()
            },
        ),
        Commands::Decrypt { io, recipient } => cli::commands::process::execute(
            Operation::Decrypt,
            io,
            Identities {
                recipient: recipient.as_deref(),
                ..Default::default()
            },
        ),
        Commands::Sign { io, local_user } => cli::commands::process::execute(
            Operation::Sign,
            io,
            Identities {
                originator: local_user.as_deref(),
                ..Default::default()
            },
        ),
        Commands::SignEncrypt {
            io,
            recipient,
            local_user,
        } => cli::commands::process::execute(
            Operation::SignAndEncrypt,
            io,
            Identities {
                recipient: recipient.as_deref(),
                originator: local_user.as_deref(),
            },
        ),
        Commands::Verify { io } => {
            cli::commands::process::execute(Operation::Verify, io, Identities::default())
        }
        Commands::Check => cli::commands::check::execute(),
    }
}
