//! Movie metadata provider abstraction and the OMDb client.
//!
//! Defines the [`MovieProvider`] trait used by the batch drivers and the
//! [`OmdbClient`] implementation that talks to `omdbapi.com`.
//!
//! # Outcomes
//!
//! A lookup has three outcomes:
//! - [`Lookup::Found`]: the provider returned a record.
//! - [`Lookup::NotFound`]: the provider answered cleanly that it has no
//!   such movie (`"Response": "False"`). This is part of the normal flow
//!   and feeds the lookup queue.
//! - `Err(_)`: the request failed, the status was not 2xx, or the body was
//!   not the expected JSON. Callers count this as a per-document error.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::models::{ProviderRecord, RatingEntry};

/// Result of a successful round-trip to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(ProviderRecord),
    NotFound,
}

/// A source of movie metadata, keyed by title or by IMDb id.
pub trait MovieProvider {
    /// Look a movie up by free-text title.
    fn lookup_by_title(&self, title: &str) -> Result<Lookup>;

    /// Look a movie up by its IMDb id (e.g. `tt0113277`).
    fn lookup_by_id(&self, id: &str) -> Result<Lookup>;
}

/// Blocking OMDb API client.
pub struct OmdbClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    /// Build a client from provider settings and an access key.
    pub fn new(config: &ProviderConfig, api_key: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: api_key.to_string(),
        })
    }

    fn fetch(&self, param: &str, value: &str) -> Result<Lookup> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[(param, value), ("apikey", self.api_key.as_str())])
            .send()
            .with_context(|| format!("OMDb request failed ({}={})", param, value))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!(
                "OMDb returned HTTP {} for {}={}: {}",
                status.as_u16(),
                param,
                value,
                body.trim()
            );
        }

        let parsed: OmdbResponse = response
            .json()
            .context("Failed to decode OMDb response")?;
        Ok(into_lookup(parsed))
    }
}

impl MovieProvider for OmdbClient {
    fn lookup_by_title(&self, title: &str) -> Result<Lookup> {
        self.fetch("t", title)
    }

    fn lookup_by_id(&self, id: &str) -> Result<Lookup> {
        self.fetch("i", id)
    }
}

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes")]
    imdb_votes: Option<String>,
    #[serde(rename = "Metascore")]
    metascore: Option<String>,
    #[serde(rename = "Ratings", default)]
    ratings: Vec<OmdbRating>,
}

#[derive(Debug, Deserialize)]
struct OmdbRating {
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Value")]
    value: String,
}

/// Decode an OMDb JSON body into a [`Lookup`].
pub fn parse_response(body: &str) -> Result<Lookup> {
    let parsed: OmdbResponse =
        serde_json::from_str(body).context("Failed to decode OMDb response")?;
    Ok(into_lookup(parsed))
}

/// Anything other than `"Response": "True"` is a clean miss.
fn into_lookup(parsed: OmdbResponse) -> Lookup {
    if parsed.response.as_deref() != Some("True") {
        if let Some(ref err) = parsed.error {
            tracing::debug!(error = %err, "OMDb reported no match");
        }
        return Lookup::NotFound;
    }

    Lookup::Found(ProviderRecord {
        id: parsed.imdb_id,
        title: parsed.title,
        imdb_rating: parsed.imdb_rating,
        imdb_votes: parsed.imdb_votes,
        metascore: parsed.metascore,
        ratings: parsed
            .ratings
            .into_iter()
            .map(|r| RatingEntry {
                source: r.source,
                value: r.value,
            })
            .collect(),
    })
}
