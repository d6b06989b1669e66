//! Application state shared across all handlers.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ov_core::config::{apply_env_overrides, OpenVikingConfig};
use ov_core::context::Context;
use ov_router::embedder::{Embedder as RouterEmbedder, HashEmbedder as RouterHashEmbedder};
use ov_router::retriever::HierarchicalRetriever;
use ov_router::types::RetrieverConfig;
use ov_session::lifecycle::{HashEmbedder as CommitHashEmbedder, MemoryCommitter};
use ov_session::manager::SessionManager;
use ov_session::memory::HeuristicExtractor;
use ov_storage::VikingFS;
use ov_tenant::TenantManager;
use ov_vectordb::collection::{CollectionConfig, FieldDef, FieldType, IndexConfig};
use ov_vectordb::driver::{DriverRegistry, HttpDriver, VectorDriver};
use ov_vectordb::gateway::ContextSemanticGateway;

/// In-memory context store keyed by URI. Legacy surface kept for the
/// `/api/v1/contexts` CRUD routes that predate the vector-backed retrieval
/// stack; new code should go through `gateway`/`retriever` instead.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    inner: Arc<RwLock<HashMap<String, Context>>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, ctx: Context) {
        self.inner.write().unwrap().insert(ctx.uri.clone(), ctx);
    }

    pub fn get(&self, uri: &str) -> Option<Context> {
        self.inner.read().unwrap().get(uri).cloned()
    }

    pub fn remove(&self, uri: &str) -> Option<Context> {
        self.inner.write().unwrap().remove(uri)
    }

    pub fn list(&self) -> Vec<Context> {
        self.inner.read().unwrap().values().cloned().collect()
    }

    pub fn search(&self, query: &str) -> Vec<Context> {
        let q = query.to_lowercase();
        self.inner.read().unwrap().values()
            .filter(|c| {
                c.uri.to_lowercase().contains(&q)
                    || c.abstract_text.to_lowercase().contains(&q)
                    || c.category.to_lowercase().contains(&q)
            })
            .cloned()
            .collect()
    }

    pub fn list_by_type(&self, context_type: &str) -> Vec<Context> {
        self.inner.read().unwrap().values()
            .filter(|c| c.context_type.as_str() == context_type)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn update(&self, uri: &str, f: impl FnOnce(&mut Context)) -> Option<Context> {
        let mut map = self.inner.write().unwrap();
        if let Some(ctx) = map.get_mut(uri) {
            f(ctx);
            Some(ctx.clone())
        } else {
            None
        }
    }
}

/// Shared application state threaded into every handler via `Router<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub session_manager: Arc<SessionManager>,
    pub context_store: ContextStore,
    pub tenant: Arc<TenantManager>,
    pub gateway: Arc<ContextSemanticGateway>,
    pub retriever: Arc<HierarchicalRetriever>,
    pub embedder: Arc<dyn RouterEmbedder>,
    pub committer: Arc<MemoryCommitter>,
    pub vfs: Arc<VikingFS>,
    pub driver: Arc<dyn VectorDriver>,
    pub collection_name: String,
    pub start_time: std::time::Instant,
}

/// Static dispatch over `storage.vectordb.backend`, built on the capability
/// table `DriverRegistry::with_defaults` already provides for `local`,
/// `vikingdb`, and `volcengine`; `http` is registered on top since it needs
/// the configured AGFS URL rather than a fixed constructor.
fn build_driver(config: &OpenVikingConfig) -> Arc<dyn VectorDriver> {
    let mut registry = DriverRegistry::with_defaults(config.storage.vectordb.name.clone());
    registry.register("http", Arc::new(HttpDriver::new(config.agfs.url.clone())));
    registry
        .get(&config.storage.vectordb.backend)
        .unwrap_or_else(|| registry.get("local").expect("local backend always registered"))
}

/// Create the unified context collection if the driver doesn't already have
/// one. Backends that manage their own schema out of band (HTTP, the
/// unconfigured stubs) are left alone; errors from those are not fatal here.
fn ensure_collection(driver: &Arc<dyn VectorDriver>, name: &str, dim: usize) {
    if driver.has_collection(name) {
        return;
    }
    let config = CollectionConfig {
        name: name.to_string(),
        fields: vec![
            FieldDef { name: "id".into(), field_type: FieldType::String, is_primary_key: true, dim: None },
            FieldDef { name: "vector".into(), field_type: FieldType::Vector, is_primary_key: false, dim: Some(dim) },
        ],
        description: "unified context collection".into(),
    };
    if driver.create_collection(name, config).is_ok() {
        let _ = driver.create_index(name, "dense", IndexConfig::default());
    }
}

impl AppState {
    /// Build state from a config, with every backend wired synchronously.
    /// Tenant data is not loaded from disk here — see [`Self::bootstrap`]
    /// for real startup.
    pub fn from_config(mut config: OpenVikingConfig) -> Self {
        apply_env_overrides(&mut config);

        let vfs = Arc::new(VikingFS::new(config.storage.data_dir.clone()));
        let driver = build_driver(&config);
        let collection_name = config.storage.vectordb.name.clone();
        ensure_collection(&driver, &collection_name, config.embedding.dimension);

        let gateway = Arc::new(ContextSemanticGateway::new(driver.clone(), collection_name.clone()));
        let embedder: Arc<dyn RouterEmbedder> = Arc::new(RouterHashEmbedder::new(config.embedding.dimension));
        let retriever_config = RetrieverConfig {
            alpha: config.retriever.alpha as f32,
            half_life_days: config.retriever.half_life_days as f32,
            drill_down: true,
            candidate_limit: 20,
        };
        let retriever = Arc::new(HierarchicalRetriever::new(gateway.clone(), embedder.clone(), retriever_config));

        let committer = Arc::new(MemoryCommitter::new(
            vfs.clone(),
            gateway.clone(),
            Arc::new(HeuristicExtractor),
            Arc::new(CommitHashEmbedder::new(config.embedding.dimension)),
        ));

        let root_key = config.auth.root_api_key.clone().unwrap_or_default();
        let tenant = Arc::new(TenantManager::new(root_key, vfs.clone()));

        Self {
            session_manager: Arc::new(SessionManager::new()),
            context_store: ContextStore::new(),
            tenant,
            gateway,
            retriever,
            embedder,
            committer,
            vfs,
            driver,
            collection_name,
            start_time: std::time::Instant::now(),
        }
    }

    /// Volatile, zero-config state for tests and benches: local in-memory
    /// vector backend, no root key, nothing loaded from disk.
    pub fn new() -> Self {
        Self::from_config(OpenVikingConfig::default())
    }

    /// Real startup: build from `config`, then load persisted accounts,
    /// users, and invitation tokens from storage.
    pub async fn bootstrap(config: OpenVikingConfig) -> anyhow::Result<Self> {
        let state = Self::from_config(config);
        state.tenant.load().await?;
        Ok(state)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
