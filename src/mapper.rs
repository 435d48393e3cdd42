//! Merge provider metadata into a note's frontmatter.

use serde_yaml::Value;

use crate::delta::compute_delta;
use crate::frontmatter::Header;
use crate::models::{ProviderRecord, MOVIE_DATA_KEYS, ROTTEN_TOMATOES_SOURCE};

/// Whether the header already carries any of the movie-data keys.
pub fn has_movie_data(header: &Header) -> bool {
    MOVIE_DATA_KEYS.iter().any(|k| header.contains_key(*k))
}

/// Markdown link to the IMDb title page.
pub fn imdb_link(title: &str, id: &str) -> String {
    format!("[{} on IMDB](https://www.imdb.com/title/{}/)", title, id)
}

/// Set the movie-data fields from `record` and refresh the rating delta.
///
/// Fields the provider did not return become explicit nulls. Unrelated
/// keys are kept. When the header has a `rating` but the delta cannot be
/// computed, an existing `my_rating_delta` is left as it was.
pub fn merge_provider_data(header: &mut Header, record: &ProviderRecord) {
    let id = record.id.as_deref().filter(|id| !id.is_empty());

    header.insert("imdb_id".into(), opt_string(id));
    let link = id.map(|id| imdb_link(record.title.as_deref().unwrap_or(id), id));
    header.insert("imdb_link".into(), opt_string(link.as_deref()));
    header.insert("imdb_rating".into(), opt_string(record.imdb_rating.as_deref()));
    header.insert("imdb_votes".into(), opt_string(record.imdb_votes.as_deref()));
    header.insert("metascore".into(), opt_string(record.metascore.as_deref()));

    let rotten = record
        .ratings
        .iter()
        .find(|r| r.source == ROTTEN_TOMATOES_SOURCE)
        .map(|r| r.value.as_str());
    header.insert("rotten_tomatoes".into(), opt_string(rotten));

    if header.contains_key("rating") {
        let delta = compute_delta(header.get("rating"), header.get("rotten_tomatoes"));
        if let Some(delta) = delta {
            header.insert("my_rating_delta".into(), Value::from(delta));
        }
    }
}

fn opt_string(value: Option<&str>) -> Value {
    match value {
        Some(v) => Value::String(v.to_string()),
        None => Value::Null,
    }
}
