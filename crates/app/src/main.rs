mod cli;
mod config;
mod seed;
mod server;

use clap::Parser;
use services::{AppServices, Clock};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Cli, Command};
use crate::config::{normalize_sqlite_url, prepare_sqlite_file, resolve_jwt_secret};

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // File creation stays in the binary; the library crates only see a URL.
    let db_url = normalize_sqlite_url(&cli.db_url);
    prepare_sqlite_file(&db_url)?;
    let jwt_secret = resolve_jwt_secret(cli.jwt_secret.as_deref())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let clock = Clock::default_clock();
            let services = AppServices::new_sqlite(&db_url, clock, &jwt_secret).await?;
            server::serve(services, &cli.serve).await?;
        }
        Command::Seed(args) => {
            let clock = args.now.map_or_else(Clock::default_clock, Clock::fixed);
            let services = AppServices::new_sqlite(&db_url, clock, &jwt_secret).await?;
            let report = seed::run(&services, &args, clock).await?;
            info!(db = %db_url, ?report, "seeded database");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    fmt().with_env_filter(filter).init();

    if let Err(err) = run().await {
        // Printed once here; the libraries only return errors.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
