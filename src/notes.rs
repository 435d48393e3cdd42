//! Note discovery and file I/O.
//!
//! Walks the configured directory for markdown notes, reads them through
//! the frontmatter codec, and writes them back via a temporary file in the
//! same directory so a crash never leaves a half-written note.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::frontmatter::{self, Frontmatter, Header, HeaderState};

/// A markdown note found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    pub path: PathBuf,
    /// Path relative to the notes directory, `/`-separated.
    pub name: String,
}

/// List the notes under the configured directory, sorted by name.
pub fn scan_notes(config: &Config) -> Result<Vec<NoteFile>> {
    let root = &config.directory;
    if !root.is_dir() {
        bail!("Notes directory does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.scan.include_globs)?;
    let mut excludes = vec!["**/.git/**".to_string(), "**/.obsidian/**".to_string()];
    excludes.extend(config.scan.exclude_globs.clone());
    let exclude_set = build_globset(&excludes)?;

    let mut walker = WalkDir::new(root).follow_links(config.scan.follow_symlinks);
    if !config.scan.recursive {
        walker = walker.max_depth(1);
    }

    let mut notes = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if exclude_set.is_match(&name) || !include_set.is_match(&name) {
            continue;
        }

        notes.push(NoteFile {
            path: path.to_path_buf(),
            name,
        });
    }

    notes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(notes)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

/// Read and split a note.
pub fn read_note(path: &Path) -> Result<Frontmatter> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(frontmatter::parse(&text))
}

/// Read a note that is safe to rewrite.
///
/// A malformed header block decodes to an empty header, so writing such a
/// note back would drop every field the user had. It is an error instead.
pub fn read_editable_note(path: &Path) -> Result<Frontmatter> {
    let note = read_note(path)?;
    if let HeaderState::Malformed(reason) = &note.state {
        bail!("Unreadable frontmatter in {}: {}", path.display(), reason);
    }
    Ok(note)
}

/// Serialize `header` and `body` and replace the note at `path`.
pub fn write_note(path: &Path, header: &Header, body: &str) -> Result<()> {
    let text = frontmatter::serialize(header, body)?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(text.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// The text of the first level-1 ATX heading (`# Title`) in `body`.
///
/// Lines inside fenced code blocks are ignored.
pub fn extract_title(body: &str) -> Option<String> {
    let mut in_fence = false;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        let Some(rest) = line.strip_prefix('#') else {
            continue;
        };
        if !rest.starts_with([' ', '\t']) {
            continue;
        }
        let title = rest.trim();
        if !title.is_empty() {
            return Some(title.to_string());
        }
    }
    None
}
