//! # movie-notes CLI
//!
//! Batch maintenance for a directory of markdown movie notes.
//!
//! ## Usage
//!
//! ```bash
//! movie-notes [--config movie-notes.toml] [--dir <notes>] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `movie-notes enrich` | Look up un-enriched notes by title and merge OMDb data |
//! | `movie-notes fix-queue` | Apply IMDb ids filled into the lookup queue |
//! | `movie-notes recompute` | Recompute `my_rating_delta` on every note that has one |
//! | `movie-notes status` | Show enrichment and queue counts |

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_notes::config;
use movie_notes::enrich::{self, EnrichOptions};
use movie_notes::fix_queue::{self, FixQueueOptions};
use movie_notes::progress::ProgressMode;
use movie_notes::provider::OmdbClient;
use movie_notes::recompute;
use movie_notes::stats;

/// Enrich markdown movie notes with OMDb metadata and keep rating deltas
/// consistent.
///
/// The OMDb key is read from `OMDB_API_KEY` and the notes directory from
/// `MARKDOWN_DIRECTORY` (or `--dir`). A `.env` file in the working
/// directory is loaded first.
#[derive(Parser)]
#[command(name = "movie-notes", version, about)]
struct Cli {
    /// Path to an optional configuration file (TOML).
    #[arg(long, global = true, default_value = "./movie-notes.toml")]
    config: PathBuf,

    /// Notes directory. Overrides the config file and `MARKDOWN_DIRECTORY`.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Progress on stderr: `off`, `human` or `json`. Defaults to `human` on a TTY.
    #[arg(long, global = true)]
    progress: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up every note without movie data by its `# Title` heading.
    ///
    /// Found titles are merged into the frontmatter. Titles the provider
    /// does not know are appended to the lookup queue.
    Enrich {
        /// Look up and report without writing notes or the queue.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of provider lookups in this run.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Recompute `my_rating_delta` from `rating` and `rotten_tomatoes`.
    Recompute {
        /// Report changes without writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply lookup-queue entries whose IMDb id has been filled in.
    FixQueue {
        /// Look up and report without writing notes or the queue.
        #[arg(long)]
        dry_run: bool,

        /// Remove applied entries from the queue file afterwards.
        #[arg(long)]
        prune: bool,
    },

    /// Show how many notes are enriched, pending, and queued.
    Status,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_notes=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut cfg = config::load_config(&cli.config)?;
    if let Some(dir) = cli.dir {
        cfg.directory = dir;
    }

    let progress_mode = match cli.progress.as_deref() {
        None => ProgressMode::default_for_tty(),
        Some(value) => match ProgressMode::parse(value) {
            Some(mode) => mode,
            None => bail!("Unknown progress mode: '{}'. Must be off, human, or json.", value),
        },
    };
    let progress = progress_mode.reporter();

    match cli.command {
        Commands::Enrich { dry_run, limit } => {
            let client = OmdbClient::new(&cfg.provider, cfg.require_api_key()?)?;
            tracing::info!("enriching notes in {}", cfg.directory.display());
            enrich::run_enrich(
                &cfg,
                &client,
                EnrichOptions { dry_run, limit },
                progress.as_ref(),
            )?;
        }
        Commands::Recompute { dry_run } => {
            tracing::info!("fixing rating delta calculations in {}", cfg.directory.display());
            recompute::run_recompute(&cfg, dry_run, progress.as_ref())?;
        }
        Commands::FixQueue { dry_run, prune } => {
            let client = OmdbClient::new(&cfg.provider, cfg.require_api_key()?)?;
            fix_queue::run_fix_queue(
                &cfg,
                &client,
                FixQueueOptions { dry_run, prune },
                progress.as_ref(),
            )?;
        }
        Commands::Status => {
            stats::run_status(&cfg)?;
        }
    }

    Ok(())
}
