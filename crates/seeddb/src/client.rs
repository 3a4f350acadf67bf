//! Resolution client: caches, rate limiting and lookups against the remote API

use std::sync::Arc;

use chrono::{DateTime, Utc};
use seedcache::{BoundedCache, CacheStats};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::kind::{EntityInfo, EntityKind, KindSpec, KIND_SPECS};
use crate::limiter::RateLimiter;
use crate::matching::best_match;
use crate::parser::{decode_entity_id, decode_relations, parse_mbid};
use crate::transport::{HttpTransport, Response, Transport};

/// Source of the current time, injectable for tests
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Caches and response selector for one entity kind
struct KindTable {
    spec: &'static KindSpec,
    /// URL -> related entities
    relations: BoundedCache<Vec<EntityInfo>>,
    /// URL -> time of the last 404
    misses: BoundedCache<DateTime<Utc>>,
}

/// Turns identifiers and URLs scraped from provider pages into database
/// identifiers.
///
/// Shared by reference (or `Arc`) between concurrent callers. Each cache has
/// its own lock; all outgoing requests share one [`RateLimiter`].
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
    /// MBID -> database ID
    ids: BoundedCache<u64>,
    /// Indexed by `EntityKind as usize`
    kinds: Vec<KindTable>,
    clock: Clock,
}

impl Client {
    /// Create a client that talks HTTP to `config.server_url`
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client issuing requests through `transport`
    pub fn with_transport(mut config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        // Configs loaded from files may carry a trailing slash.
        let base_len = config.server_url.trim_end_matches('/').len();
        config.server_url.truncate(base_len);

        let kinds = KIND_SPECS
            .iter()
            .map(|spec| KindTable {
                spec,
                relations: BoundedCache::new(config.relation_cache_size),
                misses: BoundedCache::new(config.miss_cache_size),
            })
            .collect();

        Self {
            limiter: RateLimiter::new(config.max_qps, config.burst),
            ids: BoundedCache::new(config.id_cache_size),
            kinds,
            transport,
            clock: Arc::new(Utc::now),
            config,
        }
    }

    /// Replace the clock used to age negative cache entries
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Configuration the client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Limiter pacing all outgoing requests
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Statistics of the MBID -> database ID cache
    pub fn id_cache_stats(&self) -> &CacheStats {
        self.ids.stats()
    }

    /// Statistics of the URL -> relations cache for `kind`
    pub fn relation_cache_stats(&self, kind: EntityKind) -> &CacheStats {
        self.table(kind).relations.stats()
    }

    /// Look up the database ID of the entity identified by `mbid`.
    ///
    /// Malformed MBIDs fail with [`Error::InvalidIdentifier`] before any cache
    /// or network access. `Ok(None)` means the server does not know the MBID
    /// or network lookups are disabled.
    pub async fn resolve_id(&self, cancel: &CancellationToken, mbid: &str) -> Result<Option<u64>> {
        let mbid = parse_mbid(mbid)?;

        if let Some(id) = self.ids.get(mbid) {
            debug!(mbid = %mbid, id, "Database ID cache hit");
            return Ok(Some(id));
        }
        if !self.config.allow_network {
            return Ok(None);
        }

        let url = format!("{}/ws/js/entity/{}", self.config.server_url, mbid);
        let resp = self.fetch(cancel, &url).await?;
        if resp.status == 404 {
            debug!(mbid = %mbid, "Entity not found");
            return Ok(None);
        }
        check_status(&resp, &url)?;

        let id = decode_entity_id(&resp.body)?;
        self.ids.set(mbid, id);
        Ok(Some(id))
    }

    /// Look up the entities of `kind` that the database relates to `url`.
    ///
    /// An empty list means no relation is known: the URL was never linked,
    /// a recent lookup returned 404, or network lookups are disabled.
    /// Transport and server errors are returned without touching any cache.
    pub async fn resolve_relations(
        &self,
        cancel: &CancellationToken,
        url: &str,
        kind: EntityKind,
    ) -> Result<Vec<EntityInfo>> {
        let table = self.table(kind);

        if let Some(entities) = table.relations.get(url) {
            debug!(url = %url, %kind, count = entities.len(), "Relation cache hit");
            return Ok(entities);
        }
        if !self.config.allow_network {
            return Ok(Vec::new());
        }
        if let Some(missed_at) = table.misses.get(url) {
            if self.miss_is_fresh(missed_at) {
                debug!(url = %url, %kind, "Skipping lookup of recently missing URL");
                return Ok(Vec::new());
            }
        }

        let req_url = format!(
            "{}/ws/2/url?resource={}&inc={}",
            self.config.server_url,
            urlencoding::encode(url),
            table.spec.include
        );
        let resp = self.fetch(cancel, &req_url).await?;

        if resp.status == 404 {
            let now = (self.clock)();
            table.misses.test_and_set(url, now, |prev| *prev < now);
            debug!(url = %url, %kind, "No relations for URL");
            return Ok(Vec::new());
        }
        check_status(&resp, &req_url)?;

        let entities = decode_relations(&resp.body, kind).map_err(|err| {
            warn!(url = %req_url, error = %err, "Undecodable relations response");
            err
        })?;
        table.relations.set(url, entities.clone());
        Ok(entities)
    }

    /// Resolve the relations of `url` and pick the one matching `hint`.
    ///
    /// See [`best_match`] for how candidates are scored. `Ok(None)` means no
    /// candidate could be chosen confidently.
    pub async fn resolve_best_match(
        &self,
        cancel: &CancellationToken,
        url: &str,
        kind: EntityKind,
        hint: &str,
    ) -> Result<Option<EntityInfo>> {
        let candidates = self.resolve_relations(cancel, url, kind).await?;
        let chosen = best_match(&candidates, hint).cloned();
        if chosen.is_none() && !candidates.is_empty() {
            debug!(url = %url, %kind, hint = %hint, count = candidates.len(), "No confident match");
        }
        Ok(chosen)
    }

    /// Seed the database ID cache
    pub fn set_cached_id(&self, mbid: &str, id: u64) {
        self.ids.set(mbid, id);
    }

    /// Seed the relation cache of `kind`
    pub fn set_cached_relations(&self, url: &str, kind: EntityKind, entities: Vec<EntityInfo>) {
        self.table(kind).relations.set(url, entities);
    }

    fn table(&self, kind: EntityKind) -> &KindTable {
        &self.kinds[kind as usize]
    }

    fn miss_is_fresh(&self, missed_at: DateTime<Utc>) -> bool {
        match ((self.clock)() - missed_at).to_std() {
            Ok(age) => age <= self.config.miss_ttl,
            // Clock moved backwards
            Err(_) => true,
        }
    }

    /// Wait for the limiter, then issue the request, giving up as soon as
    /// `cancel` fires.
    async fn fetch(&self, cancel: &CancellationToken, url: &str) -> Result<Response> {
        self.limiter.wait(cancel).await?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            resp = self.transport.get(url) => resp,
        }
    }
}

fn check_status(resp: &Response, url: &str) -> Result<()> {
    if resp.is_success() {
        return Ok(());
    }
    warn!(url = %url, status = resp.status, "Unexpected status");
    Err(Error::Status {
        status: resp.status,
        url: url.to_string(),
    })
}
