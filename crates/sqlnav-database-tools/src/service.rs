//! Cached access to relationship graphs for one database

use crate::cache::{SchemaCache, cache_key};
use crate::catalog::{CatalogSnapshot, SchemaCatalog, load_snapshot};
use sqlnav_core::{CacheConfig, Result};
use sqlnav_relations::{
    ForeignKey, JoinSuggestion, JunctionCandidate, MultiJoinResult, RelationshipGraph,
    suggest_pairwise, synthesize_multi,
};
use sqlnav_telemetry::{JoinSpanAttributes, trace_join_synthesis};
use std::sync::Arc;
use std::time::Duration;

/// Answers relationship questions for one catalog, caching snapshots per schema.
///
/// Every call builds its own `RelationshipGraph` from a shared snapshot, so
/// concurrent callers never observe each other's work.
pub struct RelationshipService {
    catalog: Arc<dyn SchemaCatalog>,
    cache: Option<SchemaCache>,
}

impl RelationshipService {
    /// Uncached service: every call reads the catalog
    pub fn new(catalog: Arc<dyn SchemaCatalog>) -> Self {
        Self {
            catalog,
            cache: None,
        }
    }

    pub fn with_cache(catalog: Arc<dyn SchemaCatalog>, ttl: Duration) -> Self {
        Self {
            catalog,
            cache: Some(SchemaCache::new(ttl)),
        }
    }

    pub fn from_config(catalog: Arc<dyn SchemaCatalog>, config: &CacheConfig) -> Self {
        if config.enabled {
            Self::with_cache(catalog, Duration::from_secs(config.ttl_secs))
        } else {
            Self::new(catalog)
        }
    }

    pub fn default_schema(&self) -> &str {
        self.catalog.default_schema()
    }

    pub fn endpoint(&self) -> &str {
        self.catalog.endpoint()
    }

    /// Catalog snapshot for a schema, from cache when fresh
    pub async fn snapshot(&self, schema: &str) -> Result<Arc<CatalogSnapshot>> {
        let Some(cache) = &self.cache else {
            return Ok(Arc::new(load_snapshot(self.catalog.as_ref(), schema).await?));
        };

        let key = cache_key(self.catalog.endpoint(), schema);
        if let Some(snapshot) = cache.get(&key) {
            tracing::debug!(schema = %schema, key = %key, "Using cached catalog snapshot");
            return Ok(snapshot);
        }

        let snapshot = Arc::new(load_snapshot(self.catalog.as_ref(), schema).await?);
        cache.insert(key, snapshot.clone());
        Ok(snapshot)
    }

    /// Drops the cached snapshot for a schema; returns whether one existed
    pub fn invalidate(&self, schema: &str) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|cache| cache.invalidate(&cache_key(self.catalog.endpoint(), schema)))
    }

    pub async fn graph(&self, schema: &str) -> Result<RelationshipGraph> {
        Ok(self.snapshot(schema).await?.graph())
    }

    pub async fn foreign_keys(&self, schema: &str) -> Result<Vec<ForeignKey>> {
        Ok(self.snapshot(schema).await?.foreign_keys.clone())
    }

    pub async fn many_to_many(&self, schema: &str) -> Result<Vec<JunctionCandidate>> {
        Ok(self.graph(schema).await?.many_to_many)
    }

    pub async fn suggest_join(&self, schema: &str, table1: &str, table2: &str) -> Result<JoinSuggestion> {
        let graph = self.graph(schema).await?;
        let suggestion = suggest_pairwise(&graph, table1, table2);

        trace_join_synthesis(JoinSpanAttributes {
            schema: schema.to_string(),
            requested_tables: vec![table1.to_string(), table2.to_string()],
            join_count: suggestion.path.as_ref().map_or(0, Vec::len),
            found: suggestion.found,
        });

        Ok(suggestion)
    }

    pub async fn generate_join(
        &self,
        schema: &str,
        tables: &[String],
        select_all: bool,
    ) -> Result<MultiJoinResult> {
        let graph = self.graph(schema).await?;
        let result = synthesize_multi(&graph, tables, select_all);

        trace_join_synthesis(JoinSpanAttributes {
            schema: schema.to_string(),
            requested_tables: tables.to_vec(),
            join_count: result.joins.len(),
            found: result.found,
        });

        Ok(result)
    }
}
