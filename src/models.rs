//! Core data models used throughout movie-notes.
//!
//! These types describe the provider records, lookup-queue entries and run
//! tallies that flow between the codec, the mapper and the batch drivers.

use serde::{Deserialize, Serialize};

/// Frontmatter keys whose presence marks a note as already enriched.
pub const MOVIE_DATA_KEYS: [&str; 6] = [
    "imdb_rating",
    "imdb_votes",
    "metascore",
    "rotten_tomatoes",
    "imdb_id",
    "imdb_link",
];

/// Rating source name that feeds `rotten_tomatoes`.
pub const ROTTEN_TOMATOES_SOURCE: &str = "Rotten Tomatoes";

/// One `{source, value}` pair from a provider record's ratings list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingEntry {
    pub source: String,
    pub value: String,
}

/// Movie metadata returned by a successful provider lookup.
///
/// Optional fields map to explicit nulls in the frontmatter, never to
/// omitted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub imdb_rating: Option<String>,
    pub imdb_votes: Option<String>,
    pub metascore: Option<String>,
    pub ratings: Vec<RatingEntry>,
}

/// Row of the lookup queue (`filename,movie_title,imdb_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub filename: String,
    #[serde(rename = "movie_title")]
    pub title: String,
    #[serde(rename = "imdb_id", default)]
    pub external_id: String,
}

/// Where a queue entry sits in the human-in-the-loop workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueStatus {
    /// Title lookup failed and nobody has supplied an id yet.
    AwaitingId,
    /// A human filled in the external id; the entry can be applied.
    Ready(String),
}

impl QueueEntry {
    /// A freshly queued entry with a blank external id.
    pub fn awaiting(filename: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            title: title.into(),
            external_id: String::new(),
        }
    }

    pub fn status(&self) -> QueueStatus {
        let id = self.external_id.trim();
        if id.is_empty() {
            QueueStatus::AwaitingId
        } else {
            QueueStatus::Ready(id.to_string())
        }
    }
}

/// Running counters for a single batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Notes written (or that would be written under `--dry-run`).
    pub processed: u64,
    /// Notes or entries left alone because there was nothing to do.
    pub skipped: u64,
    /// Per-document failures.
    pub errors: u64,
    /// Enrich: titles appended to the lookup queue.
    pub queued: u64,
    /// Enrich: titles that were already queued. Recompute: deltas already correct.
    pub unchanged: u64,
    /// Enrich: notes without a level-1 heading. Recompute: notes missing a source field.
    pub incomplete: u64,
}
