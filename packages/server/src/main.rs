#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Railway operations dashboard server binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "railway_ops_server", about = "Railway operations dashboard server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server using environment configuration (default)
    Serve,
    /// Prompt for bind address, port and seed, then start the server
    Interactive,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => railway_ops_server::run_server().await,
        Commands::Interactive => railway_ops_server::interactive::run().await,
    }
}
