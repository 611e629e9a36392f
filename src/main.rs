use clap::Parser;
use verotrade::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
