//! Hierarchical retriever: resolves a [`TypedQuery`] into root directories,
//! delegates to the semantic gateway, drills into L0/L1 children, then
//! re-ranks by hotness.

use std::sync::Arc;

use ov_core::identity::RequestContext;
use ov_core::trace::TraceCollector;
use ov_core::types::MatchedContext;
use ov_vectordb::ContextSemanticGateway;
use ov_vectordb::error::Result;

use crate::embedder::Embedder;
use crate::hotness::{final_score, hotness};
use crate::roots::root_uris;
use crate::types::{RetrievedContext, RetrieverConfig, TypedQuery};

/// Levels the spec calls out for drill-down: abstract (0) and overview (1).
const DRILLABLE_LEVELS: [u8; 2] = [0, 1];

pub struct HierarchicalRetriever {
    gateway: Arc<ContextSemanticGateway>,
    embedder: Arc<dyn Embedder>,
    config: RetrieverConfig,
}

impl HierarchicalRetriever {
    pub fn new(gateway: Arc<ContextSemanticGateway>, embedder: Arc<dyn Embedder>, config: RetrieverConfig) -> Self {
        Self { gateway, embedder, config }
    }

    pub async fn retrieve(&self, ctx: &RequestContext, query: &TypedQuery, trace: &TraceCollector) -> Result<Vec<RetrievedContext>> {
        let directories = query
            .target_directories
            .clone()
            .unwrap_or_else(|| root_uris(query.context_type.clone(), Some(ctx)));

        let dense = self.embedder.embed_dense(&query.query);

        let mut hits = self
            .gateway
            .search_typed_in_tenant(ctx, &dense, query.context_type.as_str(), &directories, self.config.candidate_limit)
            .await?;
        trace.count("vector.search_calls", 1);

        if self.config.drill_down {
            let mut drilled = Vec::new();
            for parent in hits.iter().filter(|h| DRILLABLE_LEVELS.contains(&h.level)) {
                let children = self
                    .gateway
                    .search_children_in_tenant(ctx, &dense, &parent.uri, self.config.candidate_limit)
                    .await?;
                trace.count("vector.search_calls", 1);
                drilled.extend(children);
            }
            hits.extend(drilled);
        }

        let now = chrono::Utc::now();
        let mut ranked: Vec<RetrievedContext> = hits
            .into_iter()
            .map(|m| {
                let h = hotness(m.active_count, m.updated_at, self.config.half_life_days, now);
                let score = final_score(m.score, h, self.config.alpha);
                RetrievedContext { context: m, semantic_score: score, hotness: h, final_score: score }
            })
            .collect();
        ranked.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap_or(std::cmp::Ordering::Equal));

        for r in &ranked {
            self.gateway.touch_active_count(&r.context.id)?;
        }

        Ok(ranked)
    }
}

fn _assert_matched_context_shape(_: &MatchedContext) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;
    use ov_core::context::{Context, ContextType};
    use ov_core::identity::{Role, UserIdentifier};
    use ov_vectordb::driver::LocalDriver;
    use ov_vectordb::{CollectionConfig, FieldDef, FieldType, IndexConfig, VectorDriver};

    fn setup() -> (RequestContext, HierarchicalRetriever) {
        let driver = Arc::new(LocalDriver::volatile("p"));
        driver
            .create_collection(
                "ctx",
                CollectionConfig {
                    name: "ctx".into(),
                    fields: vec![
                        FieldDef { name: "id".into(), field_type: FieldType::String, is_primary_key: true, dim: None },
                        FieldDef { name: "vector".into(), field_type: FieldType::Vector, is_primary_key: false, dim: Some(8) },
                    ],
                    description: String::new(),
                },
            )
            .unwrap();
        driver.create_index("ctx", "dense", IndexConfig::default()).unwrap();

        let gateway = Arc::new(ContextSemanticGateway::new(driver, "ctx"));
        let rc = RequestContext::new(UserIdentifier::new("acct-1", "alice", "agent-1"), Role::User);
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(8));

        let uri = format!("viking://agent/{}/memories/preferences.md", rc.user.agent_space_name());
        let mut ctx = Context::builder(uri)
            .abstract_text("prefers dark mode editors")
            .context_type(ContextType::Memory)
            .account_id("acct-1")
            .owner_space(rc.user.agent_space_name())
            .build();
        ctx.vector = Some(embedder.embed_dense("prefers dark mode editors"));
        gateway.store_context(&ctx).unwrap();

        let retriever = HierarchicalRetriever::new(gateway, embedder, RetrieverConfig::default());
        (rc, retriever)
    }

    #[tokio::test]
    async fn retrieve_finds_stored_memory_for_its_tenant() {
        let (rc, retriever) = setup();
        let query = TypedQuery::new("dark mode", ContextType::Memory);
        let trace = TraceCollector::new(false);
        let results = retriever.retrieve(&rc, &query, &trace).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].context.uri.ends_with("preferences.md"));
    }

    #[tokio::test]
    async fn retrieve_respects_target_directories_override() {
        let (rc, retriever) = setup();
        let query = TypedQuery::new("dark mode", ContextType::Memory)
            .with_target_directories(vec!["viking://resources".into()]);
        let trace = TraceCollector::new(false);
        let results = retriever.retrieve(&rc, &query, &trace).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn retrieve_increments_active_count_on_returned_leaves() {
        let (rc, retriever) = setup();
        let query = TypedQuery::new("dark mode", ContextType::Memory);
        let trace = TraceCollector::new(false);
        let first = retriever.retrieve(&rc, &query, &trace).await.unwrap();
        assert_eq!(first[0].context.active_count, 0);
        let second = retriever.retrieve(&rc, &query, &trace).await.unwrap();
        assert_eq!(second[0].context.active_count, 1);
    }

    #[tokio::test]
    async fn retrieve_counts_a_vector_search_call_per_gateway_search() {
        let (rc, retriever) = setup();
        let query = TypedQuery::new("dark mode", ContextType::Memory);
        let trace = TraceCollector::new(true);
        retriever.retrieve(&rc, &query, &trace).await.unwrap();
        // one root search plus one child search for the drillable abstract-level memory.
        assert_eq!(trace.finish("ok").summary.vector.search_calls, 2);
    }
}
