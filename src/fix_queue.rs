//! Apply hand-resolved lookup queue entries.
//!
//! Reads the lookup queue and, for every entry whose IMDb id has been
//! filled in, fetches the record by id and merges it into the named note.
//! Entries without an id are skipped and reported. A missing note, a row
//! that does not decode, or a filename that leaves the notes directory is
//! an error for that entry only.

use anyhow::{bail, Result};
use std::path::{Component, Path};

use crate::config::Config;
use crate::mapper::merge_provider_data;
use crate::models::{QueueEntry, QueueStatus, RunStats};
use crate::notes;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::provider::{Lookup, MovieProvider};
use crate::queue::{LookupQueue, QueueRow};

const COMMAND: &str = "fix-queue";

#[derive(Debug, Clone, Copy, Default)]
pub struct FixQueueOptions {
    pub dry_run: bool,
    /// Rewrite the queue without the entries that were applied.
    pub prune: bool,
}

pub fn run_fix_queue(
    config: &Config,
    provider: &dyn MovieProvider,
    options: FixQueueOptions,
    progress: &dyn ProgressReporter,
) -> Result<RunStats> {
    let queue = LookupQueue::new(config.queue_path());
    let mut stats = RunStats::default();

    if !queue.exists() {
        tracing::error!("{} not found", queue.path().display());
        stats.errors += 1;
        print_summary(0, &stats, options.dry_run);
        return Ok(stats);
    }

    progress.report(ProgressEvent::Scanning {
        command: COMMAND.to_string(),
    });
    let rows = match queue.load_rows() {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("{:#}", e);
            stats.errors += 1;
            print_summary(0, &stats, options.dry_run);
            return Ok(stats);
        }
    };
    let total = rows.len() as u64;
    let mut remaining: Vec<QueueRow> = Vec::with_capacity(rows.len());

    for (i, row) in rows.into_iter().enumerate() {
        match row {
            QueueRow::Malformed(bad) => {
                tracing::error!(line = bad.line, "malformed queue row: {}", bad.reason);
                stats.errors += 1;
                remaining.push(QueueRow::Malformed(bad));
            }
            QueueRow::Entry(entry) => match entry.status() {
                QueueStatus::AwaitingId => {
                    tracing::info!(note = %entry.filename, "skipping: no imdb id provided");
                    stats.skipped += 1;
                    remaining.push(entry.into());
                }
                QueueStatus::Ready(id) => {
                    match apply_entry(config, provider, &entry, &id, options.dry_run) {
                        Ok(()) => {
                            tracing::info!(note = %entry.filename, imdb_id = %id, "found data, updated frontmatter");
                            stats.processed += 1;
                        }
                        Err(e) => {
                            tracing::error!(note = %entry.filename, imdb_id = %id, "{:#}", e);
                            stats.errors += 1;
                            remaining.push(entry.into());
                        }
                    }
                }
            },
        }

        progress.report(ProgressEvent::Processing {
            command: COMMAND.to_string(),
            n: i as u64 + 1,
            total,
        });
    }

    if options.prune && !options.dry_run && stats.processed > 0 {
        queue.rewrite(&remaining)?;
        tracing::info!(
            remaining = remaining.len(),
            "pruned applied entries from {}",
            queue.path().display()
        );
    }

    print_summary(total, &stats, options.dry_run);
    if stats.processed > 0 && !options.prune {
        println!(
            "to process these files again, keep {}; to start fresh, delete it or rerun with --prune",
            queue.path().display()
        );
    }
    Ok(stats)
}

fn apply_entry(
    config: &Config,
    provider: &dyn MovieProvider,
    entry: &QueueEntry,
    id: &str,
    dry_run: bool,
) -> Result<()> {
    let relative = Path::new(&entry.filename);
    let inside = !entry.filename.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !inside {
        bail!("{} is not a path inside the notes directory", entry.filename);
    }

    let path = config.directory.join(relative);
    if !path.is_file() {
        bail!("{} not found in directory", entry.filename);
    }

    let mut note = notes::read_editable_note(&path)?;

    tracing::info!(note = %entry.filename, imdb_id = %id, "processing");
    let record = match provider.lookup_by_id(id)? {
        Lookup::Found(record) => record,
        Lookup::NotFound => bail!("could not fetch data for imdb id: {}", id),
    };

    merge_provider_data(&mut note.header, &record);
    if !dry_run {
        notes::write_note(&path, &note.header, &note.body)?;
    }
    Ok(())
}

fn print_summary(total: u64, stats: &RunStats, dry_run: bool) {
    if dry_run {
        println!("{} (dry-run)", COMMAND);
    } else {
        println!("{}", COMMAND);
    }
    println!("  queue entries: {}", total);
    println!("  updated: {}", stats.processed);
    println!("  skipped (no imdb id): {}", stats.skipped);
    println!("  errors: {}", stats.errors);
    println!("ok");
}
