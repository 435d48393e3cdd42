//! Notes directory overview.
//!
//! Summarises what `enrich`, `recompute` and `fix-queue` would find:
//! how many notes are enriched, how many still need a lookup, how many
//! carry a rating delta, and where the lookup queue stands. Read-only.

use anyhow::Result;

use crate::config::Config;
use crate::frontmatter::HeaderState;
use crate::mapper::has_movie_data;
use crate::models::QueueStatus;
use crate::notes;
use crate::queue::{LookupQueue, QueueRow};

/// Counts gathered by [`collect_status`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryStatus {
    pub notes: u64,
    pub enriched: u64,
    pub pending: u64,
    pub with_delta: u64,
    pub unreadable: u64,
    pub queue_awaiting: u64,
    pub queue_ready: u64,
    pub queue_malformed: u64,
}

pub fn collect_status(config: &Config) -> Result<DirectoryStatus> {
    let files = notes::scan_notes(config)?;
    let mut status = DirectoryStatus {
        notes: files.len() as u64,
        ..DirectoryStatus::default()
    };

    for file in &files {
        let note = match notes::read_note(&file.path) {
            Ok(note) => note,
            Err(e) => {
                tracing::warn!(note = %file.name, "{:#}", e);
                status.unreadable += 1;
                continue;
            }
        };
        if matches!(note.state, HeaderState::Malformed(_)) {
            status.unreadable += 1;
            continue;
        }

        if has_movie_data(&note.header) {
            status.enriched += 1;
        } else {
            status.pending += 1;
        }
        if note.header.contains_key("my_rating_delta") {
            status.with_delta += 1;
        }
    }

    let queue = LookupQueue::new(config.queue_path());
    let rows = if queue.exists() {
        queue.load_rows()?
    } else {
        Vec::new()
    };
    for row in rows {
        match row {
            QueueRow::Entry(entry) => match entry.status() {
                QueueStatus::AwaitingId => status.queue_awaiting += 1,
                QueueStatus::Ready(_) => status.queue_ready += 1,
            },
            QueueRow::Malformed(_) => status.queue_malformed += 1,
        }
    }

    Ok(status)
}

/// Run the status command: collect counts and print a summary.
pub fn run_status(config: &Config) -> Result<()> {
    let status = collect_status(config)?;
    let queue_path = config.queue_path();

    println!("movie-notes status");
    println!("==================");
    println!();
    println!("  Directory:   {}", config.directory.display());
    println!("  Notes:       {}", status.notes);
    println!("  Enriched:    {}", status.enriched);
    println!("  Pending:     {}", status.pending);
    println!("  With delta:  {}", status.with_delta);
    if status.unreadable > 0 {
        println!("  Unreadable:  {}", status.unreadable);
    }
    println!();
    if queue_path.is_file() {
        println!("  Queue:       {}", queue_path.display());
        println!("    awaiting id: {}", status.queue_awaiting);
        println!("    ready:       {}", status.queue_ready);
        if status.queue_malformed > 0 {
            println!("    malformed:   {}", status.queue_malformed);
        }
    } else {
        println!("  Queue:       (none)");
    }
    println!();
    Ok(())
}
