use anyhow::Context;
use clap::{Parser, Subcommand};

use bookshelf_app::app;
use bookshelf_kernel::settings::Settings;

/// bookshelf - book catalog service
#[derive(Parser)]
#[command(name = "bookshelf-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Load the demo catalog, skipping books already present
    Seed,
    /// Print the mounted HTTP routes
    Routes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Commands::Serve => app::serve(&settings).await?,
        Commands::Migrate => {
            let applied = app::migrate(&settings).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Seed => {
            let inserted = app::seed(&settings).await?;
            println!("inserted {inserted} book(s)");
        }
        Commands::Routes => {
            for (method, path) in app::route_table(&app::build_registry()) {
                println!("{method:<7} {path}");
            }
        }
    }

    Ok(())
}
