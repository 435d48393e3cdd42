//! # movie-notes
//!
//! Keeps a folder of markdown movie notes enriched with OMDb metadata and
//! keeps the derived `my_rating_delta` field consistent with the user's
//! rating and the Rotten Tomatoes score.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌──────────┐   ┌───────────┐
//! │   notes   │──▶│ frontmatter  │──▶│  mapper  │──▶│   notes   │
//! │ scan/read │   │  parse       │   │  delta   │   │ serialize │
//! └───────────┘   └──────────────┘   └────┬─────┘   │  + write  │
//!                                         │         └───────────┘
//!                                  ┌──────┴──────┐
//!                                  ▼             ▼
//!                            ┌──────────┐  ┌──────────┐
//!                            │ provider │  │  queue   │
//!                            │  (OMDb)  │  │  (CSV)   │
//!                            └──────────┘  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export OMDB_API_KEY=...
//! movie-notes --dir ~/notes/movies enrich      # look up notes by their # Title
//! movie-notes --dir ~/notes/movies fix-queue   # apply hand-filled imdb ids
//! movie-notes --dir ~/notes/movies recompute   # refresh my_rating_delta
//! movie-notes --dir ~/notes/movies status
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`models`] | Provider records, queue entries, run counters |
//! | [`frontmatter`] | YAML frontmatter parse/serialize |
//! | [`delta`] | Rating delta calculation |
//! | [`mapper`] | Merge provider records into frontmatter |
//! | [`notes`] | Note discovery and file I/O |
//! | [`provider`] | Provider trait and OMDb client |
//! | [`queue`] | CSV lookup queue |
//! | [`enrich`] | `enrich` command |
//! | [`recompute`] | `recompute` command |
//! | [`fix_queue`] | `fix-queue` command |
//! | [`stats`] | `status` command |
//! | [`progress`] | Progress reporting on stderr |

pub mod config;
pub mod delta;
pub mod enrich;
pub mod fix_queue;
pub mod frontmatter;
pub mod mapper;
pub mod models;
pub mod notes;
pub mod progress;
pub mod provider;
pub mod queue;
pub mod recompute;
pub mod stats;
