//! Recompute stored rating deltas.
//!
//! Walks every note that already carries `my_rating_delta` and recomputes
//! it from `rating` and `rotten_tomatoes` with the 0–5 → 0–100 scale.
//! Notes without a delta are skipped without further inspection; notes
//! missing either source field are left untouched. Running it twice in a
//! row changes nothing the second time.

use anyhow::Result;
use serde_yaml::Value;

use crate::config::Config;
use crate::delta::compute_delta;
use crate::models::RunStats;
use crate::notes::{self, NoteFile};
use crate::progress::{ProgressEvent, ProgressReporter};

const COMMAND: &str = "recompute";

/// What happened to a single note.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Recomputed { old: Value, new: i64 },
    AlreadyCorrect,
    MissingSources,
    NoDelta,
}

pub fn run_recompute(
    config: &Config,
    dry_run: bool,
    progress: &dyn ProgressReporter,
) -> Result<RunStats> {
    progress.report(ProgressEvent::Scanning {
        command: COMMAND.to_string(),
    });
    let files = notes::scan_notes(config)?;
    let total = files.len() as u64;

    let mut stats = RunStats::default();

    for (i, file) in files.iter().enumerate() {
        match recompute_note(file, dry_run) {
            Ok(Outcome::Recomputed { old, new }) => {
                tracing::info!(note = %file.name, old = ?old, new, "fixed rating delta");
                stats.processed += 1;
            }
            Ok(Outcome::AlreadyCorrect) => stats.unchanged += 1,
            Ok(Outcome::MissingSources) => {
                tracing::warn!(note = %file.name, "has my_rating_delta but rating or rotten_tomatoes is missing or unusable");
                stats.incomplete += 1;
            }
            Ok(Outcome::NoDelta) => stats.skipped += 1,
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

    print_summary(total, &stats, dry_run);
    Ok(stats)
}

fn recompute_note(file: &NoteFile, dry_run: bool) -> Result<Outcome> {
    let mut note = notes::read_editable_note(&file.path)?;

    let Some(old) = note.header.get("my_rating_delta").cloned() else {
        return Ok(Outcome::NoDelta);
    };

    let Some(new) = compute_delta(note.header.get("rating"), note.header.get("rotten_tomatoes"))
    else {
        return Ok(Outcome::MissingSources);
    };

    if old == Value::from(new) {
        return Ok(Outcome::AlreadyCorrect);
    }

    note.header.insert("my_rating_delta".into(), Value::from(new));
    if !dry_run {
        notes::write_note(&file.path, &note.header, &note.body)?;
    }
    Ok(Outcome::Recomputed { old, new })
}

fn print_summary(total: u64, stats: &RunStats, dry_run: bool) {
    if dry_run {
        println!("{} (dry-run)", COMMAND);
    } else {
        println!("{}", COMMAND);
    }
    println!("  notes scanned: {}", total);
    println!("  recomputed: {}", stats.processed);
    println!("  already correct: {}", stats.unchanged);
    println!("  missing sources: {}", stats.incomplete);
    println!("  skipped (no delta): {}", stats.skipped);
    println!("  errors: {}", stats.errors);
    println!("ok");
}
