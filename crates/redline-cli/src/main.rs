//! Redline CLI - compare a contract with its amendment from the shell.

use clap::Parser;
use redline_cli::commands;
use redline_cli::{Cli, Command, Formatter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    redline_service::init_logging();

    let formatter = Formatter::new(!cli.no_color);

    if let Err(e) = run(cli, &formatter).await {
        eprintln!("{}", formatter.failure(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, formatter: &Formatter) -> redline_cli::Result<()> {
    match cli.command {
        Command::Compare(args) => {
            commands::execute_compare(args, cli.config.as_deref(), cli.mock, formatter).await?;
        }
        Command::Validate(args) => {
            commands::execute_validate(args, formatter)?;
        }
    }

    Ok(())
}
