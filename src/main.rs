//! # tg-scout CLI (`tgs`)
//!
//! The `tgs` binary is the primary interface for tg-scout. It provides
//! commands for searching channels across backends, fetching suggestion
//! tags, inspecting backend health, and starting the HTTP API server.
//!
//! ## Usage
//!
//! ```bash
//! tgs --config ./config/scout.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tgs search "<query>"` | Search channels via the selected backend |
//! | `tgs suggest "<query>"` | Suggestion tags for a partial query |
//! | `tgs backends` | List backends and whether their credentials resolve |
//! | `tgs serve` | Start the HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! # AI-grounded search (default backend)
//! tgs search "crypto signals lang:ru"
//!
//! # Search a specific web-index engine
//! tgs search "daily news" --backend 017576662512468239146:omuauf_lfve
//!
//! # Raw web search
//! tgs search "fitness" --backend brave
//!
//! # Machine-readable output
//! tgs search "bitcoin" --json
//!
//! # Start the HTTP API
//! tgs serve
//! ```
//!
//! Credentials are environment-driven: `GEMINI_API_KEY`,
//! `GOOGLE_SEARCH_API_KEY` (falls back to `GEMINI_API_KEY`), and
//! `BRAVE_SEARCH_API_KEY`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tg_scout::{backend, config, search, server};

/// tg-scout — multi-backend Telegram channel discovery with
/// normalization and tiered response caching.
#[derive(Parser)]
#[command(
    name = "tgs",
    about = "tg-scout — multi-backend Telegram channel discovery",
    version,
    long_about = "tg-scout aggregates channel search results from an AI-grounded backend, \
    a structured web index, and a raw web-search index, normalizes them into one canonical \
    record shape, and caches responses so repeated queries never hit the rate-limited upstreams."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Optional: when the file does not exist, built-in defaults apply
    /// and credentials are still read from the environment.
    #[arg(long, global = true, default_value = "./config/scout.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Search for channels.
    ///
    /// Parses informal operators (`lang:`, `cat:`, quoted phrases,
    /// `-exclusions`, `intitle:`), checks the response cache, and only
    /// calls the upstream on a miss.
    Search {
        /// The search query string.
        query: String,

        /// Backend id: omit for the AI-grounded backend, `brave` for raw
        /// web search, `cse` for the configured web-index engine, or a
        /// web-index engine id directly.
        #[arg(long)]
        backend: Option<String>,

        /// Print the raw normalized records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Fetch suggestion tags for a partial query.
    ///
    /// Asks the AI backend for related tags and synonyms. Queries under
    /// three characters return nothing.
    Suggest {
        /// The partial query string.
        query: String,
    },

    /// List backends and whether their credentials resolve.
    Backends,

    /// Start the HTTP API server.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// `/api/search`, `/api/suggestions`, and `/health`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Search {
            query,
            backend,
            json,
        } => {
            search::run_search(&cfg, &query, backend.as_deref(), json).await?;
        }
        Commands::Suggest { query } => {
            search::run_suggest(&cfg, &query).await?;
        }
        Commands::Backends => {
            backend::list_backends(&cfg);
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
