//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`init`], or [`validate`]. Each
//! handler lives in its own submodule.

pub mod init;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::OutpostError;

pub async fn dispatch(cli: Cli) -> Result<(), OutpostError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(args).await,
        Some(Commands::Init(ref args)) => init::execute(args),
        Some(Commands::Validate(ref args)) => validate::execute(args),
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  outpost v{version} \u{2014} event fan-out and webhook delivery engine\n\n  \
         No command provided. To get started:\n\n    \
         outpost init                   Generate a starter config\n    \
         outpost run                    Start the engine (auto-detects ./outpost.yaml)\n    \
         outpost run -c targets.yaml    Start with a specific config file\n    \
         outpost --help                 See all commands and options\n"
    );
}
