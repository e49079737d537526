//! Read-only access to the podcast catalog, with time-bounded caching.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::{debug, warn};
use ureq::Agent;

use crate::catalog::{ShowDetails, ShowId, ShowPreview};
use crate::config::Config;
use crate::error::{CatalogError, CatalogResult};

pub trait CatalogSource: Send + Sync {
    fn fetch_shows(&self) -> CatalogResult<Vec<ShowPreview>>;
    fn fetch_show(&self, id: &ShowId) -> CatalogResult<ShowDetails>;
}

/// Catalog API over HTTP: `GET {base}/shows` and `GET {base}/id/{id}`.
#[derive(Clone)]
pub struct HttpCatalog {
    base: String,
    agent: Agent,
}

impl HttpCatalog {
    pub fn new(base: &str, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .new_agent();

        Self {
            base: base.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn get(&self, path: &str) -> Result<String, ureq::Error> {
        let url = format!("{}{}", self.base, path);
        debug!("GET {}", url);

        let mut response = self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .call()?;

        response.body_mut().read_to_string()
    }
}

impl CatalogSource for HttpCatalog {
    fn fetch_shows(&self) -> CatalogResult<Vec<ShowPreview>> {
        let body = self.get("/shows").map_err(|e| match e {
            ureq::Error::StatusCode(code) => {
                CatalogError::Network(format!("Failed to fetch shows: HTTP {}", code))
            }
            other => CatalogError::Network(format!("Failed to fetch shows: {}", other)),
        })?;

        Ok(serde_json::from_str(&body)?)
    }

    fn fetch_show(&self, id: &ShowId) -> CatalogResult<ShowDetails> {
        let body = self.get(&format!("/id/{}", id)).map_err(|e| match e {
            ureq::Error::StatusCode(code) => {
                CatalogError::NotFound(format!("{} (HTTP {})", id, code))
            }
            other => CatalogError::Network(format!("Failed to fetch show {}: {}", id, other)),
        })?;

        Ok(serde_json::from_str(&body)?)
    }
}

/// Cached view over a [`CatalogSource`].
///
/// The show list and each show detail are cached independently, each with its
/// own time-to-live. Failed fetches are never cached. Cloning is cheap and
/// clones share the same caches, so worker threads can fetch through it.
pub struct Catalog<S> {
    source: Arc<S>,
    shows: Cache<(), Arc<Vec<ShowPreview>>>,
    details: Cache<ShowId, Arc<ShowDetails>>,
}

impl<S> Clone for Catalog<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            shows: self.shows.clone(),
            details: self.details.clone(),
        }
    }
}

impl Catalog<HttpCatalog> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            HttpCatalog::new(&config.api_base, config.http_timeout()),
            config.shows_ttl(),
            config.show_ttl(),
        )
    }
}

impl<S: CatalogSource> Catalog<S> {
    pub fn new(source: S, shows_ttl: Duration, show_ttl: Duration) -> Self {
        Self {
            source: Arc::new(source),
            shows: Cache::builder()
                .max_capacity(1)
                .time_to_live(shows_ttl)
                .build(),
            details: Cache::builder()
                .max_capacity(256)
                .time_to_live(show_ttl)
                .build(),
        }
    }

    pub fn list_shows(&self) -> CatalogResult<Arc<Vec<ShowPreview>>> {
        if let Some(shows) = self.shows.get(&()) {
            return Ok(shows);
        }

        let shows = self.source.fetch_shows().inspect_err(|e| {
            warn!("Show list fetch failed: {}", e);
        })?;
        debug!("Fetched {} shows", shows.len());

        let shows = Arc::new(shows);
        self.shows.insert((), Arc::clone(&shows));
        Ok(shows)
    }

    pub fn get_show(&self, id: &str) -> CatalogResult<Arc<ShowDetails>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(CatalogError::NotFound("No show ID provided".to_string()));
        }

        let id = ShowId::from(id);
        if let Some(show) = self.details.get(&id) {
            return Ok(show);
        }

        let show = self.source.fetch_show(&id).inspect_err(|e| {
            warn!("Show {} fetch failed: {}", id, e);
        })?;
        debug!("Fetched show {} with {} seasons", id, show.seasons.len());

        let show = Arc::new(show);
        self.details.insert(id, Arc::clone(&show));
        Ok(show)
    }

    /// Drops every cached entry; the next read goes to the source.
    pub fn invalidate(&self) {
        self.shows.invalidate_all();
        self.details.invalidate_all();
    }
}
