//! CollegeDB Command-Line Interface
//!
//! Operator tool for inspecting and managing a CollegeDB store directory.

mod commands;
mod config;
mod error;
mod formatter;

use clap::Parser;
use collegedb_core::Store;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use config::Args;
use error::CliError;

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("collegedb_cli=info,collegedb_core=info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let format = args.format;
    let command = args.command.clone();
    let store = Store::open(args.into_config())?;
    let formatter = formatter::create_formatter(format);

    let output = commands::execute(&store, &command, &*formatter)?;
    println!("{}", output);
    Ok(())
}
