use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use marginalia::config::Config;
use marginalia::micropub::{HttpReferenceFetcher, NoopReferenceFetcher, ReferenceFetcher};
use marginalia::web::{AppState, RemoteTokenVerifier};
use marginalia::webmention::HttpWebmentionSender;

/// Marginalia: a Micropub endpoint for a personal site.
///
/// Accepts posts from Micropub clients, stores them as notes, and sends
/// webmentions to the pages they reply to or mention.
#[derive(Parser)]
#[command(name = "marginalia", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Run the Micropub endpoint and the notes pages
    Serve {
        /// Port to listen on (default: 8080)
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Address to bind (default: 127.0.0.1)
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
    },

    /// List stored notes
    Notes,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("marginalia=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Marginalia database...");
            let config = Config::load()?;
            let db = marginalia::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nMarginalia is ready. Next step: set up your .env file");
            println!("  (see .env.example for required variables)");
            println!("\nThen run: cargo run -- serve");
        }

        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            config.require_site()?;
            let db = marginalia::db::open_sqlite(&config.db_path)?;

            let fetcher: Arc<dyn ReferenceFetcher> = if config.fetch_references {
                Arc::new(HttpReferenceFetcher::new()?)
            } else {
                info!("Reference fetching disabled");
                Arc::new(NoopReferenceFetcher)
            };

            let state = AppState {
                db,
                verifier: Arc::new(RemoteTokenVerifier::new(&config.site.token_endpoint)?),
                webmentions: Arc::new(HttpWebmentionSender::new()?),
                fetcher,
                site: Arc::new(config.site),
            };

            println!(
                "{} {}",
                "Micropub endpoint:".bold(),
                format!("{}/micropub", state.site.url).cyan()
            );
            println!(
                "{} {}",
                "Token endpoint:   ".bold(),
                state.site.token_endpoint.dimmed()
            );

            marginalia::web::run_server(state, port, &bind).await?;
        }

        Commands::Notes => {
            let config = Config::load()?;
            let db = marginalia::db::open_sqlite(&config.db_path)?;
            let notes = db.find_notes().await?;
            marginalia::output::terminal::display_notes(&notes);
        }
    }

    Ok(())
}
