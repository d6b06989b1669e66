//! Pluggable vector store backends, selected by `storage.vectordb.backend`.
//!
//! Every backend implements [`VectorDriver`] with the same shape the local
//! `Project`/`Collection` pair already exposes (has/get/create/drop/list/
//! close), so the registry can swap backends without the gateway layer
//! knowing which one is live. `compile_expr` lets a backend translate the
//! closed [`crate::filter::Filter`] AST into its own query language instead
//! of relying on post-filtering candidates client-side.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::collection::{CollectionConfig, CollectionSearchResult, IndexConfig, SearchItem, UpsertResult};
use crate::error::{Result, VectorDbError};
use crate::filter::Filter;
use crate::project::ProjectGroup;

/// A vector store backend, as selected by `storage.vectordb.backend`.
#[async_trait]
pub trait VectorDriver: Send + Sync {
    fn has_collection(&self, name: &str) -> bool;
    fn create_collection(&self, name: &str, config: CollectionConfig) -> Result<()>;
    fn drop_collection(&self, name: &str) -> Result<()>;
    fn list_collections(&self) -> Vec<String>;

    async fn search(
        &self,
        collection: &str,
        index_name: &str,
        dense_vector: &[f32],
        limit: usize,
        offset: usize,
        filter: Option<&Filter>,
    ) -> Result<CollectionSearchResult>;

    /// Insert or overwrite rows by primary key.
    fn upsert(&self, collection: &str, rows: &[HashMap<String, Value>]) -> Result<UpsertResult>;

    /// Fetch full rows (vector field included) by primary key. `None` at a
    /// given position means that id has no matching row.
    fn fetch_by_id(&self, collection: &str, ids: &[Value]) -> Result<Vec<Option<HashMap<String, Value>>>>;

    /// Create a named ANN index on `collection` (e.g. the gateway's `dense`
    /// index) so `search` has something to query.
    fn create_index(&self, collection: &str, name: &str, cfg: IndexConfig) -> Result<()>;

    /// Filter-only lookup that never touches an ANN index — the right path
    /// for id/URI point lookups, which aren't similarity search and
    /// shouldn't be dimension-checked against the collection's vector
    /// field. Backends with no native filter-only scan return an error.
    fn scan(&self, collection: &str, filter: Option<&Filter>, limit: usize) -> Result<Vec<SearchItem>> {
        let _ = (collection, filter, limit);
        Err(VectorDbError::Other(anyhow::anyhow!("scan is not supported by this backend")))
    }

    fn close(&self);

    /// Compile a closed filter AST into this backend's native query
    /// representation. The local backend returns the AST verbatim (it
    /// evaluates filters in-process); remote backends would translate it
    /// into their own DSL. Returning `None` means "not representable by
    /// this backend" and callers should fall back to post-filtering.
    fn compile_expr(&self, filter: &Filter) -> Option<Value> {
        let _ = filter;
        None
    }
}

/// In-process backend backed by the flat/HNSW indexes in this crate.
pub struct LocalDriver {
    group: Arc<ProjectGroup>,
    project: String,
}

impl LocalDriver {
    pub fn new(group: Arc<ProjectGroup>, project: impl Into<String>) -> Self {
        Self { group, project: project.into() }
    }

    pub fn volatile(project: impl Into<String>) -> Self {
        Self::new(Arc::new(ProjectGroup::new()), project)
    }

    pub fn with_path(project: impl Into<String>, path: PathBuf) -> Result<Self> {
        Ok(Self::new(Arc::new(ProjectGroup::with_path(path)?), project))
    }
}

#[async_trait]
impl VectorDriver for LocalDriver {
    fn has_collection(&self, name: &str) -> bool {
        self.group
            .with_project(&self.project, |p| p.has_collection(name))
            .unwrap_or(false)
    }

    fn create_collection(&self, name: &str, config: CollectionConfig) -> Result<()> {
        self.group.with_project(&self.project, |p| p.create_collection(name, config))?
    }

    fn drop_collection(&self, name: &str) -> Result<()> {
        self.group.with_project(&self.project, |p| p.drop_collection(name))
    }

    fn list_collections(&self) -> Vec<String> {
        self.group.with_project(&self.project, |p| p.list_collections()).unwrap_or_default()
    }

    async fn search(
        &self,
        collection: &str,
        index_name: &str,
        dense_vector: &[f32],
        limit: usize,
        offset: usize,
        filter: Option<&Filter>,
    ) -> Result<CollectionSearchResult> {
        let filter_json = filter.map(filter_to_legacy_json);
        self.group.with_project(&self.project, |p| {
            p.with_collection(collection, |c| {
                c.search_by_vector(index_name, dense_vector, limit, offset, filter_json.as_ref())
            })
        })??
    }

    fn upsert(&self, collection: &str, rows: &[HashMap<String, Value>]) -> Result<UpsertResult> {
        self.group.with_project(&self.project, |p| {
            p.with_collection(collection, |c| c.upsert_data(rows))
        })??
    }

    fn fetch_by_id(&self, collection: &str, ids: &[Value]) -> Result<Vec<Option<HashMap<String, Value>>>> {
        self.group.with_project(&self.project, |p| {
            p.with_collection(collection, |c| c.fetch_data(ids))
        })?
    }

    fn create_index(&self, collection: &str, name: &str, cfg: IndexConfig) -> Result<()> {
        self.group.with_project(&self.project, |p| {
            p.with_collection(collection, |c| c.create_index(name, cfg))
        })??
    }

    fn scan(&self, collection: &str, filter: Option<&Filter>, limit: usize) -> Result<Vec<SearchItem>> {
        self.group.with_project(&self.project, |p| {
            p.with_collection(collection, |c| c.scan(filter, limit))
        })?
    }

    fn close(&self) {
        self.group.close();
    }

    fn compile_expr(&self, filter: &Filter) -> Option<Value> {
        Some(filter_to_legacy_json(filter))
    }
}

/// Round-trips a `Filter` back through the old must/range wire shape that
/// `Collection::search_by_vector` still parses via `Filter::from_json`.
/// Only the variants the local backend can post-filter are represented;
/// `RawDsl` entries targeting another backend are dropped to an empty `or`
/// branch (vacuously false) so a mixed-backend filter never silently matches
/// everything.
fn filter_to_legacy_json(filter: &Filter) -> Value {
    use serde_json::json;
    match filter {
        Filter::Eq { field, values } => json!({"op": "eq", "field": field, "values": values}),
        Filter::In { field, values } => json!({"op": "in", "field": field, "values": values}),
        Filter::Prefix { field, prefix } => json!({"op": "prefix", "field": field, "prefix": prefix}),
        Filter::Range { field, gt, gte, lt, lte } => {
            json!({"op": "range", "field": field, "gt": gt, "gte": gte, "lt": lt, "lte": lte})
        }
        Filter::Contains { field, substring } => json!({"op": "contains", "field": field, "substring": substring}),
        Filter::Regex { field, pattern } => json!({"op": "regex", "field": field, "pattern": pattern}),
        Filter::TimeRange { field, from, to } => json!({"op": "time_range", "field": field, "from": from, "to": to}),
        Filter::RawDsl { .. } => json!({"op": "or", "conds": []}),
        Filter::And(items) => json!({"op": "and", "conds": items.iter().map(filter_to_legacy_json).collect::<Vec<_>>()}),
        Filter::Or(items) => json!({"op": "or", "conds": items.iter().map(filter_to_legacy_json).collect::<Vec<_>>()}),
        Filter::Not(inner) => json!({"op": "not", "cond": filter_to_legacy_json(inner)}),
    }
}

/// Thin HTTP client for a remote vector service speaking the same
/// collection/search JSON shape as this crate's own types.
pub struct HttpDriver {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDriver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), client: reqwest::Client::new() }
    }
}

#[async_trait]
impl VectorDriver for HttpDriver {
    fn has_collection(&self, _name: &str) -> bool {
        false
    }

    fn create_collection(&self, name: &str, _config: CollectionConfig) -> Result<()> {
        Err(VectorDbError::Other(anyhow::anyhow!(
            "http driver does not support synchronous create_collection for {name}; use the async admin API"
        )))
    }

    fn drop_collection(&self, _name: &str) -> Result<()> {
        Err(VectorDbError::Other(anyhow::anyhow!("http driver does not support synchronous drop_collection")))
    }

    fn list_collections(&self) -> Vec<String> {
        Vec::new()
    }

    async fn search(
        &self,
        collection: &str,
        _index_name: &str,
        dense_vector: &[f32],
        limit: usize,
        offset: usize,
        filter: Option<&Filter>,
    ) -> Result<CollectionSearchResult> {
        let body = serde_json::json!({
            "collection": collection,
            "vector": dense_vector,
            "limit": limit,
            "offset": offset,
            "filter": filter.map(filter_to_legacy_json),
        });
        let resp = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| VectorDbError::Other(anyhow::anyhow!("http driver request failed: {e}")))?;
        resp.json::<CollectionSearchResult>()
            .await
            .map_err(|e| VectorDbError::Other(anyhow::anyhow!("http driver decode failed: {e}")))
    }

    fn upsert(&self, collection: &str, _rows: &[HashMap<String, Value>]) -> Result<UpsertResult> {
        Err(VectorDbError::Other(anyhow::anyhow!(
            "http driver does not support synchronous upsert for {collection}; use the async admin API"
        )))
    }

    fn fetch_by_id(&self, collection: &str, _ids: &[Value]) -> Result<Vec<Option<HashMap<String, Value>>>> {
        Err(VectorDbError::Other(anyhow::anyhow!(
            "http driver does not support synchronous fetch_by_id for {collection}; use the async admin API"
        )))
    }

    fn create_index(&self, collection: &str, _name: &str, _cfg: IndexConfig) -> Result<()> {
        Err(VectorDbError::Other(anyhow::anyhow!(
            "http driver does not support synchronous create_index for {collection}; use the async admin API"
        )))
    }

    fn close(&self) {}
}

/// Stub for a managed cloud backend. Not wired to a real endpoint; every
/// operation reports `NotInitialized` until credentials/client config land.
pub struct UnconfiguredDriver {
    backend_name: &'static str,
}

impl UnconfiguredDriver {
    pub fn vikingdb() -> Self {
        Self { backend_name: "vikingdb" }
    }

    pub fn volcengine() -> Self {
        Self { backend_name: "volcengine" }
    }

    fn err(&self) -> VectorDbError {
        VectorDbError::Storage(format!("{} backend is not configured", self.backend_name))
    }
}

#[async_trait]
impl VectorDriver for UnconfiguredDriver {
    fn has_collection(&self, _name: &str) -> bool {
        false
    }

    fn create_collection(&self, _name: &str, _config: CollectionConfig) -> Result<()> {
        Err(self.err())
    }

    fn drop_collection(&self, _name: &str) -> Result<()> {
        Err(self.err())
    }

    fn list_collections(&self) -> Vec<String> {
        Vec::new()
    }

    async fn search(
        &self,
        _collection: &str,
        _index_name: &str,
        _dense_vector: &[f32],
        _limit: usize,
        _offset: usize,
        _filter: Option<&Filter>,
    ) -> Result<CollectionSearchResult> {
        Err(self.err())
    }

    fn upsert(&self, _collection: &str, _rows: &[HashMap<String, Value>]) -> Result<UpsertResult> {
        Err(self.err())
    }

    fn fetch_by_id(&self, _collection: &str, _ids: &[Value]) -> Result<Vec<Option<HashMap<String, Value>>>> {
        Err(self.err())
    }

    fn create_index(&self, _collection: &str, _name: &str, _cfg: IndexConfig) -> Result<()> {
        Err(self.err())
    }

    fn close(&self) {}
}

/// Static dispatch over the four backends named in `storage.vectordb.backend`.
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn VectorDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self { drivers: HashMap::new() }
    }

    pub fn register(&mut self, name: impl Into<String>, driver: Arc<dyn VectorDriver>) {
        self.drivers.insert(name.into(), driver);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn VectorDriver>> {
        self.drivers.get(name).cloned()
    }

    /// Build the default registry: a volatile local backend plus
    /// unconfigured stubs for the managed cloud backends.
    pub fn with_defaults(local_project: impl Into<String>) -> Self {
        let mut reg = Self::new();
        reg.register("local", Arc::new(LocalDriver::volatile(local_project)));
        reg.register("vikingdb", Arc::new(UnconfiguredDriver::vikingdb()));
        reg.register("volcengine", Arc::new(UnconfiguredDriver::volcengine()));
        reg
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
