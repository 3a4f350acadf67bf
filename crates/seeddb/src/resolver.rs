//! Resolution interface shared by the real client and in-memory doubles

use std::collections::HashMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::client::Client;
use crate::error::Result;
use crate::kind::{EntityInfo, EntityKind};
use crate::matching::best_match;
use crate::parser::parse_mbid;

/// Lookups a provider needs to turn scraped identifiers into database IDs.
///
/// Providers take `&dyn Resolver` so tests can hand them a
/// [`StaticResolver`] instead of a networked [`Client`].
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Database ID for `mbid`, or `None` if unknown
    async fn resolve_id(&self, cancel: &CancellationToken, mbid: &str) -> Result<Option<u64>>;

    /// Entities of `kind` related to `url`
    async fn resolve_relations(
        &self,
        cancel: &CancellationToken,
        url: &str,
        kind: EntityKind,
    ) -> Result<Vec<EntityInfo>>;

    /// Related entity of `kind` whose name best matches `hint`
    async fn resolve_best_match(
        &self,
        cancel: &CancellationToken,
        url: &str,
        kind: EntityKind,
        hint: &str,
    ) -> Result<Option<EntityInfo>> {
        let candidates = self.resolve_relations(cancel, url, kind).await?;
        Ok(best_match(&candidates, hint).cloned())
    }
}

#[async_trait]
impl Resolver for Client {
    async fn resolve_id(&self, cancel: &CancellationToken, mbid: &str) -> Result<Option<u64>> {
        Client::resolve_id(self, cancel, mbid).await
    }

    async fn resolve_relations(
        &self,
        cancel: &CancellationToken,
        url: &str,
        kind: EntityKind,
    ) -> Result<Vec<EntityInfo>> {
        Client::resolve_relations(self, cancel, url, kind).await
    }

    async fn resolve_best_match(
        &self,
        cancel: &CancellationToken,
        url: &str,
        kind: EntityKind,
        hint: &str,
    ) -> Result<Option<EntityInfo>> {
        Client::resolve_best_match(self, cancel, url, kind, hint).await
    }
}

/// Map-backed [`Resolver`] that never touches the network
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    ids: HashMap<String, u64>,
    relations: HashMap<(EntityKind, String), Vec<EntityInfo>>,
}

impl StaticResolver {
    /// Create a resolver that knows nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `id` for `mbid`
    pub fn with_id(mut self, mbid: impl Into<String>, id: u64) -> Self {
        self.ids.insert(mbid.into(), id);
        self
    }

    /// Answer `entities` for relations of `kind` on `url`
    pub fn with_relations(
        mut self,
        url: impl Into<String>,
        kind: EntityKind,
        entities: Vec<EntityInfo>,
    ) -> Self {
        self.relations.insert((kind, url.into()), entities);
        self
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve_id(&self, _cancel: &CancellationToken, mbid: &str) -> Result<Option<u64>> {
        let mbid = parse_mbid(mbid)?;
        Ok(self.ids.get(mbid).copied())
    }

    async fn resolve_relations(
        &self,
        _cancel: &CancellationToken,
        url: &str,
        kind: EntityKind,
    ) -> Result<Vec<EntityInfo>> {
        Ok(self
            .relations
            .get(&(kind, url.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
