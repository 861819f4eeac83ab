use std::process::ExitCode;

use clap::Parser;

use pentimento::cli::{self, CliArgs};
use pentimento::logger;

fn main() -> ExitCode {
    logger::init();
    cli::run(CliArgs::parse())
}
