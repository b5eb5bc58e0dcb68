use clap::Parser;
use rulecraft::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
