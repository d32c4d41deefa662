//! # Synapse CLI (`synapse`)
//!
//! The `synapse` binary is the primary interface for the knowledge base.
//! It provides commands for database initialization, entry capture,
//! semantic search, statistics, token minting, and starting the HTTP
//! API server.
//!
//! ## Usage
//!
//! ```bash
//! synapse --config ./config/synapse.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `synapse init` | Create the SQLite database and run schema migrations |
//! | `synapse add "<content>"` | Capture an entry (embeds it when a provider is configured) |
//! | `synapse list` | List entries, newest first |
//! | `synapse get <id>` | Print one entry in full |
//! | `synapse rm <id>` | Delete an entry |
//! | `synapse search "<query>"` | Rank entries by meaning and generate an answer |
//! | `synapse stats` | Per-kind entry counts |
//! | `synapse token <user-id>` | Mint a bearer token for the HTTP API |
//! | `synapse serve` | Start the HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! synapse init
//!
//! # Capture a quote with tags
//! synapse add "The map is not the territory." --kind quote \
//!     --source "Korzybski" --tag epistemology --tag maps
//!
//! # Ask the knowledge base a question
//! synapse search "what did I save about maps?"
//!
//! # Start the API for other clients
//! SYNAPSE_SECRET=... synapse serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use synapse::models::{EntryType, NewEntry};
use synapse::{auth, config, entries, migrate, search, server, stats};

/// Synapse — a personal knowledge base with semantic recall.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/synapse.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "synapse",
    about = "Synapse — a personal knowledge base with semantic recall",
    version,
    long_about = "Synapse captures quotes, notes, and links, embeds them with a language-model \
    provider, and recalls them by meaning: entries are ranked by cosine similarity to your \
    question and the top matches ground a generated answer."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/synapse.toml")]
    config: PathBuf,

    /// Owning user id for entry commands. The HTTP API derives this from
    /// the bearer token instead.
    #[arg(long, global = true, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the entries table. This
    /// command is idempotent — running it multiple times is safe.
    Init,

    /// Capture an entry.
    ///
    /// Embeds the content with the configured model provider and stores
    /// it. With the provider disabled, the entry is stored without an
    /// embedding and will not surface in semantic search.
    ///
    /// Submitting identical content twice refreshes the existing entry's
    /// title, source, and tags instead of creating a duplicate.
    Add {
        /// The entry's text content.
        content: String,

        /// Entry kind: `quote`, `note`, or `link`.
        #[arg(long, default_value = "note")]
        kind: EntryType,

        /// Optional short label.
        #[arg(long)]
        title: Option<String>,

        /// Free-text provenance (book, URL, conversation, ...).
        #[arg(long)]
        source: Option<String>,

        /// Tag to attach; repeat for multiple tags.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// List entries, newest first.
    List,

    /// Print one entry in full.
    Get {
        /// Entry UUID.
        id: String,
    },

    /// Delete an entry.
    Rm {
        /// Entry UUID.
        id: String,
    },

    /// Search entries by meaning.
    ///
    /// Embeds the query, ranks all of your entries by cosine similarity,
    /// and generates an answer grounded in the top matches. Requires a
    /// model provider to be configured.
    Search {
        /// The question or search phrase.
        query: String,

        /// Maximum number of results (defaults to `retrieval.top_k`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show per-kind entry counts.
    Stats,

    /// Mint a bearer token for the HTTP API.
    ///
    /// Signs the token with the `SYNAPSE_SECRET` environment variable;
    /// validity is `auth.token_ttl_hours` from now.
    Token {
        /// User id the token authenticates as.
        user_id: String,
    },

    /// Start the HTTP API server.
    ///
    /// Binds to `[server].bind` and serves the JSON API. Requires
    /// `SYNAPSE_SECRET` for bearer-token verification.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized at {}", cfg.db.path.display());
        }
        Commands::Add {
            content,
            kind,
            title,
            source,
            tags,
        } => {
            let draft = NewEntry {
                kind,
                title,
                content,
                source,
                tags,
            };
            entries::run_add(&cfg, &cli.user, draft).await?;
        }
        Commands::List => {
            entries::run_list(&cfg, &cli.user).await?;
        }
        Commands::Get { id } => {
            entries::run_get(&cfg, &cli.user, &id).await?;
        }
        Commands::Rm { id } => {
            entries::run_rm(&cfg, &cli.user, &id).await?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &cli.user, &query, limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg, &cli.user).await?;
        }
        Commands::Token { user_id } => {
            let secret = auth::load_secret()?;
            let ttl_secs = (cfg.auth.token_ttl_hours * 3600) as i64;
            println!("{}", auth::issue_token(&secret, &user_id, ttl_secs));
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
