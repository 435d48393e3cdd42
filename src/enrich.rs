//! Enrich notes with provider metadata.
//!
//! For every note without movie data, the first `# Heading` of the body is
//! used as the title and looked up through a [`MovieProvider`]. Found
//! records are merged into the frontmatter; clean misses are appended to
//! the lookup queue for a human to resolve with an explicit IMDb id.

use anyhow::Result;
use std::collections::HashSet;

use crate::config::Config;
use crate::mapper::{has_movie_data, merge_provider_data};
use crate::models::{QueueEntry, RunStats};
use crate::notes::{self, NoteFile};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::provider::{Lookup, MovieProvider};
use crate::queue::LookupQueue;

const COMMAND: &str = "enrich";

#[derive(Debug, Clone, Copy, Default)]
pub struct EnrichOptions {
    /// Look up and report, but write neither notes nor the queue.
    pub dry_run: bool,
    /// Stop after this many provider lookups.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Enriched { title: String },
    Queued { title: String },
    AlreadyQueued { title: String },
    AlreadyEnriched,
    NoTitle,
}

pub fn run_enrich(
    config: &Config,
    provider: &dyn MovieProvider,
    options: EnrichOptions,
    progress: &dyn ProgressReporter,
) -> Result<RunStats> {
    progress.report(ProgressEvent::Scanning {
        command: COMMAND.to_string(),
    });
    let files = notes::scan_notes(config)?;
    let total = files.len() as u64;

    let queue = LookupQueue::new(config.queue_path());
    let mut queued: HashSet<String> = match queue.load_or_empty() {
        Ok(entries) => entries.into_iter().map(|e| e.filename).collect(),
        Err(e) => {
            tracing::warn!("{:#}; duplicate queue entries will not be detected", e);
            HashSet::new()
        }
    };

    let mut stats = RunStats::default();
    let mut lookups = 0usize;

    for (i, file) in files.iter().enumerate() {
        if options.limit.is_some_and(|limit| lookups >= limit) {
            tracing::info!("lookup limit reached, stopping");
            break;
        }

        match enrich_note(file, provider, &queue, &mut queued, options.dry_run, &mut lookups) {
            Ok(Outcome::Enriched { title }) => {
                tracing::info!(note = %file.name, %title, "found data, updated frontmatter");
                stats.processed += 1;
            }
            Ok(Outcome::Queued { title }) => {
                tracing::info!(note = %file.name, %title, "no data found, added to lookup queue");
                stats.queued += 1;
            }
            Ok(Outcome::AlreadyQueued { title }) => {
                tracing::info!(note = %file.name, %title, "no data found, already queued");
                stats.unchanged += 1;
            }
            Ok(Outcome::AlreadyEnriched) => {
                tracing::debug!(note = %file.name, "movie data already exists");
                stats.skipped += 1;
            }
            Ok(Outcome::NoTitle) => {
                tracing::warn!(note = %file.name, "no level-1 heading found");
                stats.incomplete += 1;
            }
            Err(e) => {
                tracing::error!(note = %file.name, "{:#}", e);
                stats.errors += 1;
            }
        }

        progress.report(ProgressEvent::Processing {
            command: COMMAND.to_string(),
            n: i as u64 + 1,
            total,
        });
    }

    print_summary(total, &stats, options.dry_run);
    if stats.queued + stats.unchanged > 0 {
        println!(
            "check {} and add imdb ids, then run `movie-notes fix-queue`",
            queue.path().display()
        );
    }
    Ok(stats)
}

fn enrich_note(
    file: &NoteFile,
    provider: &dyn MovieProvider,
    queue: &LookupQueue,
    queued: &mut HashSet<String>,
    dry_run: bool,
    lookups: &mut usize,
) -> Result<Outcome> {
    let mut note = notes::read_editable_note(&file.path)?;

    if has_movie_data(&note.header) {
        return Ok(Outcome::AlreadyEnriched);
    }

    let Some(title) = notes::extract_title(&note.body) else {
        return Ok(Outcome::NoTitle);
    };

    tracing::info!(note = %file.name, %title, "searching");
    *lookups += 1;
    match provider.lookup_by_title(&title)? {
        Lookup::Found(record) => {
            merge_provider_data(&mut note.header, &record);
            if !dry_run {
                notes::write_note(&file.path, &note.header, &note.body)?;
            }
            Ok(Outcome::Enriched { title })
        }
        Lookup::NotFound => {
            if queued.contains(&file.name) {
                return Ok(Outcome::AlreadyQueued { title });
            }
            if !dry_run {
                queue.append(&QueueEntry::awaiting(&file.name, &title))?;
            }
            queued.insert(file.name.clone());
            Ok(Outcome::Queued { title })
        }
    }
}

fn print_summary(total: u64, stats: &RunStats, dry_run: bool) {
    if dry_run {
        println!("{} (dry-run)", COMMAND);
    } else {
        println!("{}", COMMAND);
    }
    println!("  notes scanned: {}", total);
    println!("  updated: {}", stats.processed);
    println!("  skipped (already enriched): {}", stats.skipped);
    println!("  no heading: {}", stats.incomplete);
    println!("  queued: {}", stats.queued);
    println!("  already queued: {}", stats.unchanged);
    println!("  errors: {}", stats.errors);
    println!("ok");
}
