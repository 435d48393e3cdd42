//! Integration tests for the batch drivers.
//!
//! The drivers run against a temporary notes directory and an in-memory
//! `MovieProvider` that records every call, so the tests can check both
//! the files written and which lookups were made.

use anyhow::{bail, Result};
use movie_notes::config::Config;
use movie_notes::enrich::{run_enrich, EnrichOptions};
use movie_notes::fix_queue::{run_fix_queue, FixQueueOptions};
use movie_notes::frontmatter;
use movie_notes::models::{ProviderRecord, QueueEntry, RatingEntry};
use movie_notes::progress::NoProgress;
use movie_notes::provider::{Lookup, MovieProvider};
use movie_notes::queue::{LookupQueue, QueueRow};
use movie_notes::recompute::run_recompute;
use serde_yaml::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ─── Test Provider ──────────────────────────────────────────────────

/// Provider backed by fixed maps. Keys absent from both maps are misses;
/// keys in `failing` return a transport error.
#[derive(Default)]
struct FakeProvider {
    by_title: HashMap<String, ProviderRecord>,
    by_id: HashMap<String, ProviderRecord>,
    failing: Vec<String>,
    calls: RefCell<Vec<String>>,
}

impl FakeProvider {
    fn with_title(mut self, title: &str, record: ProviderRecord) -> Self {
        self.by_title.insert(title.to_string(), record);
        self
    }

    fn with_id(mut self, id: &str, record: ProviderRecord) -> Self {
        self.by_id.insert(id.to_string(), record);
        self
    }

    fn failing_on(mut self, key: &str) -> Self {
        self.failing.push(key.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn answer(&self, key: &str, map: &HashMap<String, ProviderRecord>) -> Result<Lookup> {
        if self.failing.iter().any(|k| k == key) {
            bail!("HTTP 503 for {}", key);
        }
        Ok(match map.get(key) {
            Some(record) => Lookup::Found(record.clone()),
            None => Lookup::NotFound,
        })
    }
}

impl MovieProvider for FakeProvider {
    fn lookup_by_title(&self, title: &str) -> Result<Lookup> {
        self.calls.borrow_mut().push(format!("t:{}", title));
        self.answer(title, &self.by_title)
    }

    fn lookup_by_id(&self, id: &str) -> Result<Lookup> {
        self.calls.borrow_mut().push(format!("i:{}", id));
        self.answer(id, &self.by_id)
    }
}

fn record(id: &str, title: &str, rotten: Option<&str>) -> ProviderRecord {
    let mut ratings = vec![RatingEntry {
        source: "Internet Movie Database".to_string(),
        value: "8.0/10".to_string(),
    }];
    if let Some(value) = rotten {
        ratings.push(RatingEntry {
            source: "Rotten Tomatoes".to_string(),
            value: value.to_string(),
        });
    }
    ProviderRecord {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        imdb_rating: Some("8.0".to_string()),
        imdb_votes: Some("1,000".to_string()),
        metascore: Some("70".to_string()),
        ratings,
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn setup(files: &[(&str, &str)]) -> (TempDir, Config) {
    let tmp = TempDir::new().unwrap();
    for (name, text) in files {
        fs::write(tmp.path().join(name), text).unwrap();
    }
    let config = Config {
        directory: tmp.path().to_path_buf(),
        ..Config::default()
    };
    (tmp, config)
}

fn header_of(path: &Path) -> frontmatter::Header {
    let text = fs::read_to_string(path).unwrap();
    frontmatter::parse(&text).header
}

// ─── Enrich ─────────────────────────────────────────────────────────

#[test]
fn test_enrich_merges_found_titles() {
    let (tmp, config) = setup(&[(
        "heat.md",
        "---\nrating: 4\ntags: [crime]\n---\n# Heat\n\nGreat heist.\n",
    )]);
    let provider = FakeProvider::default().with_title("Heat", record("tt0113277", "Heat", Some("88%")));

    let stats = run_enrich(&config, &provider, EnrichOptions::default(), &NoProgress).unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.errors, 0);
    let path = tmp.path().join("heat.md");
    let header = header_of(&path);
    assert_eq!(header.get("imdb_id"), Some(&Value::from("tt0113277")));
    assert_eq!(header.get("rotten_tomatoes"), Some(&Value::from("88%")));
    assert_eq!(header.get("my_rating_delta"), Some(&Value::from(-8)));
    assert!(header.contains_key("tags"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.ends_with("---\n# Heat\n\nGreat heist.\n"));
}

#[test]
fn test_enrich_note_without_frontmatter() {
    let (tmp, config) = setup(&[("alien.md", "# Alien\n\nIn space.\n")]);
    let provider = FakeProvider::default().with_title("Alien", record("tt0078748", "Alien", None));

    run_enrich(&config, &provider, EnrichOptions::default(), &NoProgress).unwrap();

    let text = fs::read_to_string(tmp.path().join("alien.md")).unwrap();
    assert!(text.starts_with("---\n"));
    let parsed = frontmatter::parse(&text);
    assert_eq!(parsed.header.get("rotten_tomatoes"), Some(&Value::Null));
    assert!(!parsed.header.contains_key("my_rating_delta"));
    assert_eq!(parsed.body, "# Alien\n\nIn space.\n");
}

#[test]
fn test_enrich_skips_already_enriched() {
    let text = "---\nmetascore: null\n---\n# Heat\n";
    let (tmp, config) = setup(&[("heat.md", text)]);
    let provider = FakeProvider::default();

    let stats = run_enrich(&config, &provider, EnrichOptions::default(), &NoProgress).unwrap();

    assert_eq!(stats.skipped, 1);
    assert!(provider.calls().is_empty());
    assert_eq!(fs::read_to_string(tmp.path().join("heat.md")).unwrap(), text);
}

#[test]
fn test_enrich_without_heading_makes_no_call() {
    let text = "---\nrating: 3\n---\nJust some notes, no title.\n## Cast\n";
    let (tmp, config) = setup(&[("untitled.md", text)]);
    let provider = FakeProvider::default();

    let stats = run_enrich(&config, &provider, EnrichOptions::default(), &NoProgress).unwrap();

    assert_eq!(stats.incomplete, 1);
    assert!(provider.calls().is_empty());
    assert!(!config.queue_path().exists());
    assert_eq!(fs::read_to_string(tmp.path().join("untitled.md")).unwrap(), text);
}

#[test]
fn test_enrich_queues_misses_once() {
    let text = "# Obscure Film\n";
    let (tmp, config) = setup(&[("obscure.md", text)]);
    let provider = FakeProvider::default();

    let first = run_enrich(&config, &provider, EnrichOptions::default(), &NoProgress).unwrap();
    assert_eq!(first.queued, 1);
    assert_eq!(first.errors, 0);

    let second = run_enrich(&config, &provider, EnrichOptions::default(), &NoProgress).unwrap();
    assert_eq!(second.queued, 0);
    assert_eq!(second.unchanged, 1);

    let entries = LookupQueue::new(config.queue_path()).load().unwrap();
    assert_eq!(entries, vec![QueueEntry::awaiting("obscure.md", "Obscure Film")]);
    assert_eq!(fs::read_to_string(tmp.path().join("obscure.md")).unwrap(), text);
}

#[test]
fn test_enrich_transport_error_is_isolated() {
    let (tmp, config) = setup(&[
        ("a.md", "# Broken\n"),
        ("b.md", "# Heat\n"),
    ]);
    let provider = FakeProvider::default()
        .failing_on("Broken")
        .with_title("Heat", record("tt0113277", "Heat", Some("88%")));

    let stats = run_enrich(&config, &provider, EnrichOptions::default(), &NoProgress).unwrap();

    assert_eq!(stats.errors, 1);
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.queued, 0);
    assert!(!config.queue_path().exists());
    assert_eq!(fs::read_to_string(tmp.path().join("a.md")).unwrap(), "# Broken\n");
    assert_eq!(provider.calls(), vec!["t:Broken", "t:Heat"]);
}

#[test]
fn test_enrich_leaves_malformed_frontmatter_alone() {
    let text = "---\nrating: [4\n---\n# Heat\n";
    let (tmp, config) = setup(&[("heat.md", text)]);
    let provider = FakeProvider::default().with_title("Heat", record("tt0113277", "Heat", None));

    let stats = run_enrich(&config, &provider, EnrichOptions::default(), &NoProgress).unwrap();

    assert_eq!(stats.errors, 1);
    assert!(provider.calls().is_empty());
    assert_eq!(fs::read_to_string(tmp.path().join("heat.md")).unwrap(), text);
}

#[test]
fn test_enrich_dry_run_and_limit() {
    let (tmp, config) = setup(&[
        ("a.md", "# Alpha\n"),
        ("b.md", "# Beta\n"),
        ("c.md", "# Gamma\n"),
    ]);
    let provider = FakeProvider::default().with_title("Alpha", record("tt1", "Alpha", None));

    let options = EnrichOptions {
        dry_run: true,
        limit: Some(2),
    };
    let stats = run_enrich(&config, &provider, options, &NoProgress).unwrap();

    assert_eq!(provider.calls(), vec!["t:Alpha", "t:Beta"]);
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.queued, 1);
    assert_eq!(fs::read_to_string(tmp.path().join("a.md")).unwrap(), "# Alpha\n");
    assert!(!config.queue_path().exists());
}

// ─── Fix queue ──────────────────────────────────────────────────────

fn write_queue(config: &Config, rows: &str) {
    fs::write(config.queue_path(), format!("filename,movie_title,imdb_id\n{}", rows)).unwrap();
}

#[test]
fn test_fix_queue_applies_ready_entries() {
    let (tmp, config) = setup(&[("obscure.md", "---\nrating: 2.5\n---\n# Obscure Film\n")]);
    write_queue(&config, "obscure.md,Obscure Film,tt7654321\n");
    let provider =
        FakeProvider::default().with_id("tt7654321", record("tt7654321", "Obscure Film", Some("40%")));

    let stats = run_fix_queue(&config, &provider, FixQueueOptions::default(), &NoProgress).unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(provider.calls(), vec!["i:tt7654321"]);
    let header = header_of(&tmp.path().join("obscure.md"));
    assert_eq!(header.get("imdb_id"), Some(&Value::from("tt7654321")));
    // 2.5 * 20 - 40
    assert_eq!(header.get("my_rating_delta"), Some(&Value::from(10)));
    // Without --prune the queue is kept as is.
    assert_eq!(LookupQueue::new(config.queue_path()).load().unwrap().len(), 1);
}

#[test]
fn test_fix_queue_blank_id_is_skipped_without_call() {
    let (_tmp, config) = setup(&[("obscure.md", "# Obscure Film\n")]);
    write_queue(&config, "obscure.md,Obscure Film,\n");
    let provider = FakeProvider::default();

    let stats = run_fix_queue(&config, &provider, FixQueueOptions::default(), &NoProgress).unwrap();

    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.processed, 0);
    assert!(provider.calls().is_empty());
}

#[test]
fn test_fix_queue_missing_note_does_not_abort() {
    let (_tmp, config) = setup(&[("b.md", "# Beta\n")]);
    write_queue(&config, "gone.md,Gone,tt1\nb.md,Beta,tt2\n");
    let provider = FakeProvider::default().with_id("tt2", record("tt2", "Beta", None));

    let stats = run_fix_queue(&config, &provider, FixQueueOptions::default(), &NoProgress).unwrap();

    assert_eq!(stats.errors, 1);
    assert_eq!(stats.processed, 1);
    assert_eq!(provider.calls(), vec!["i:tt2"]);
}

#[test]
fn test_fix_queue_unknown_id_is_an_error() {
    let text = "# Beta\n";
    let (tmp, config) = setup(&[("b.md", text)]);
    write_queue(&config, "b.md,Beta,tt404\n");
    let provider = FakeProvider::default();

    let stats = run_fix_queue(&config, &provider, FixQueueOptions::default(), &NoProgress).unwrap();

    assert_eq!(stats.errors, 1);
    assert_eq!(fs::read_to_string(tmp.path().join("b.md")).unwrap(), text);
}

#[test]
fn test_fix_queue_prune_keeps_unresolved() {
    let (_tmp, config) = setup(&[("a.md", "# Alpha\n"), ("b.md", "# Beta\n")]);
    write_queue(&config, "a.md,Alpha,tt1\nb.md,Beta,\n");
    let provider = FakeProvider::default().with_id("tt1", record("tt1", "Alpha", None));

    let options = FixQueueOptions {
        dry_run: false,
        prune: true,
    };
    let stats = run_fix_queue(&config, &provider, options, &NoProgress).unwrap();

    assert_eq!(stats.processed, 1);
    let entries = LookupQueue::new(config.queue_path()).load().unwrap();
    assert_eq!(entries, vec![QueueEntry::awaiting("b.md", "Beta")]);
}

#[test]
fn test_fix_queue_without_queue_file() {
    let (_tmp, config) = setup(&[("a.md", "# Alpha\n")]);
    let provider = FakeProvider::default();

    let stats = run_fix_queue(&config, &provider, FixQueueOptions::default(), &NoProgress).unwrap();

    assert_eq!(stats.errors, 1);
    assert!(provider.calls().is_empty());
}

#[test]
fn test_fix_queue_bad_row_does_not_stop_the_run() {
    let (tmp, config) = setup(&[("b.md", "# Beta\n")]);
    write_queue(&config, "stray-line\nb.md,Beta,tt2\n");
    let provider = FakeProvider::default().with_id("tt2", record("tt2", "Beta", None));

    let stats = run_fix_queue(&config, &provider, FixQueueOptions::default(), &NoProgress).unwrap();

    assert_eq!(stats.errors, 1);
    assert_eq!(stats.processed, 1);
    let header = header_of(&tmp.path().join("b.md"));
    assert_eq!(header.get("imdb_id"), Some(&Value::from("tt2")));
}

#[test]
fn test_fix_queue_prune_keeps_bad_rows() {
    let (_tmp, config) = setup(&[("b.md", "# Beta\n")]);
    write_queue(&config, "stray-line\nb.md,Beta,tt2\n");
    let provider = FakeProvider::default().with_id("tt2", record("tt2", "Beta", None));

    let options = FixQueueOptions {
        dry_run: false,
        prune: true,
    };
    let stats = run_fix_queue(&config, &provider, options, &NoProgress).unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(
        fs::read_to_string(config.queue_path()).unwrap(),
        "filename,movie_title,imdb_id\nstray-line\n"
    );
}

#[test]
fn test_fix_queue_rejects_paths_outside_notes_dir() {
    let tmp = TempDir::new().unwrap();
    let notes = tmp.path().join("notes");
    fs::create_dir(&notes).unwrap();
    let outside = tmp.path().join("outside.md");
    fs::write(&outside, "# Outside\n").unwrap();
    fs::write(notes.join("b.md"), "# Beta\n").unwrap();
    let config = Config {
        directory: notes.clone(),
        ..Config::default()
    };
    let rows = format!(
        "../outside.md,Outside,tt1\n{},Outside,tt1\nb.md,Beta,tt2\n",
        outside.display()
    );
    write_queue(&config, &rows);
    let provider = FakeProvider::default()
        .with_id("tt1", record("tt1", "Outside", None))
        .with_id("tt2", record("tt2", "Beta", None));

    let stats = run_fix_queue(&config, &provider, FixQueueOptions::default(), &NoProgress).unwrap();

    assert_eq!(stats.errors, 2);
    assert_eq!(stats.processed, 1);
    assert_eq!(provider.calls(), vec!["i:tt2"]);
    assert_eq!(fs::read_to_string(&outside).unwrap(), "# Outside\n");
}

// ─── Enrich → queue → fix round trip ────────────────────────────────

#[test]
fn test_queue_workflow_end_to_end() {
    let (tmp, config) = setup(&[("film.md", "---\nrating: 4\n---\n# The Film\n")]);

    let miss = FakeProvider::default();
    run_enrich(&config, &miss, EnrichOptions::default(), &NoProgress).unwrap();

    // A human fills in the id.
    let queue = LookupQueue::new(config.queue_path());
    let mut entries = queue.load().unwrap();
    entries[0].external_id = "tt1234567".to_string();
    let rows: Vec<QueueRow> = entries.into_iter().map(QueueRow::from).collect();
    queue.rewrite(&rows).unwrap();

    let hit = FakeProvider::default().with_id("tt1234567", record("tt1234567", "The Film", Some("75%")));
    let stats = run_fix_queue(&config, &hit, FixQueueOptions::default(), &NoProgress).unwrap();
    assert_eq!(stats.processed, 1);

    let header = header_of(&tmp.path().join("film.md"));
    assert_eq!(header.get("my_rating_delta"), Some(&Value::from(5)));

    // Now enriched, so a second enrich run leaves it alone.
    let again = run_enrich(&config, &miss, EnrichOptions::default(), &NoProgress).unwrap();
    assert_eq!(again.skipped, 1);
}

// ─── Recompute ──────────────────────────────────────────────────────

#[test]
fn test_recompute_run_counts_and_idempotence() {
    let (tmp, config) = setup(&[
        ("a.md", "---\nrating: 4\nrotten_tomatoes: 75%\nmy_rating_delta: -35\n---\n# A\n"),
        ("b.md", "---\nrating: 4\nmy_rating_delta: 1\n---\n# B\n"),
        ("c.md", "---\nrating: 4\n---\n# C\n"),
        ("d.md", "---\nrating: 3.5\nrotten_tomatoes: 90%\nmy_rating_delta: -20\n---\n# D\n"),
    ]);

    let first = run_recompute(&config, false, &NoProgress).unwrap();
    assert_eq!(first.processed, 1);
    assert_eq!(first.incomplete, 1);
    assert_eq!(first.skipped, 1);
    assert_eq!(first.unchanged, 1);

    let header = header_of(&tmp.path().join("a.md"));
    assert_eq!(header.get("my_rating_delta"), Some(&Value::from(5)));

    let second = run_recompute(&config, false, &NoProgress).unwrap();
    assert_eq!(second.processed, 0);
    assert_eq!(second.unchanged, 2);
    let header = header_of(&tmp.path().join("a.md"));
    assert_eq!(header.get("my_rating_delta"), Some(&Value::from(5)));
}
