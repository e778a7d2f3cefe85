mod cli;
mod gate;
mod run;
mod settings;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    scan_logging::initialize(cli.log_destination(), cli.log_level());

    match cli.command {
        Command::Scan(args) => run::scan(args),
        Command::Verify(args) => run::verify(args),
    }
}
