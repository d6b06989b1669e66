//! End-to-end retriever tests, exercising more than one stored context and
//! checking the hotness re-ranking actually reorders results.

use std::sync::Arc;

use ov_core::context::{Context, ContextType};
use ov_core::identity::{Role, UserIdentifier};
use ov_core::trace::TraceCollector;
use ov_vectordb::driver::LocalDriver;
use ov_vectordb::{CollectionConfig, ContextSemanticGateway, FieldDef, FieldType, IndexConfig, VectorDriver};

use crate::embedder::{Embedder, HashEmbedder};
use crate::retriever::HierarchicalRetriever;
use crate::types::{RetrieverConfig, TypedQuery};

const DIM: usize = 16;

fn gateway() -> Arc<ContextSemanticGateway> {
    let driver = Arc::new(LocalDriver::volatile("p"));
    driver
        .create_collection(
            "ctx",
            CollectionConfig {
                name: "ctx".into(),
                fields: vec![
                    FieldDef { name: "id".into(), field_type: FieldType::String, is_primary_key: true, dim: None },
                    FieldDef { name: "vector".into(), field_type: FieldType::Vector, is_primary_key: false, dim: Some(DIM) },
                ],
                description: String::new(),
            },
        )
        .unwrap();
    driver.create_index("ctx", "dense", IndexConfig::default()).unwrap();
    Arc::new(ContextSemanticGateway::new(driver, "ctx"))
}

fn store(gateway: &ContextSemanticGateway, embedder: &dyn Embedder, rc: &ov_core::identity::RequestContext, suffix: &str, active_count: u64) {
    let uri = format!("viking://agent/{}/memories/{suffix}.md", rc.user.agent_space_name());
    let mut ctx = Context::builder(uri)
        .abstract_text("the user prefers concise commit messages")
        .context_type(ContextType::Memory)
        .account_id(rc.account_id())
        .owner_space(rc.user.agent_space_name())
        .build();
    ctx.vector = Some(embedder.embed_dense("the user prefers concise commit messages"));
    ctx.active_count = active_count;
    gateway.store_context(&ctx).unwrap();
}

#[tokio::test]
async fn retriever_ranks_hotter_context_above_colder_one_with_equal_semantics() {
    let gw = gateway();
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM));
    let rc = ov_core::identity::RequestContext::new(UserIdentifier::new("acct-1", "alice", "agent-1"), Role::User);

    store(&gw, embedder.as_ref(), &rc, "cold", 0);
    store(&gw, embedder.as_ref(), &rc, "hot", 50);

    let retriever = HierarchicalRetriever::new(
        gw,
        embedder,
        RetrieverConfig { alpha: 0.5, half_life_days: 14.0, drill_down: false, candidate_limit: 10 },
    );
    let trace = TraceCollector::new(false);
    let results = retriever
        .retrieve(&rc, &TypedQuery::new("commit message style", ContextType::Memory), &trace)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].context.uri.ends_with("hot.md"), "hotter context should rank first, got {:?}", results[0].context.uri);
}

#[tokio::test]
async fn retriever_scopes_results_to_the_caller_tenant() {
    let gw = gateway();
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM));
    let alice = ov_core::identity::RequestContext::new(UserIdentifier::new("acct-1", "alice", "agent-1"), Role::User);
    let bob = ov_core::identity::RequestContext::new(UserIdentifier::new("acct-2", "bob", "agent-2"), Role::User);

    store(&gw, embedder.as_ref(), &alice, "note", 1);

    let retriever = HierarchicalRetriever::new(gw, embedder, RetrieverConfig::default());
    let trace = TraceCollector::new(false);
    let bob_results = retriever
        .retrieve(&bob, &TypedQuery::new("commit message style", ContextType::Memory), &trace)
        .await
        .unwrap();
    assert!(bob_results.is_empty(), "bob should not see alice's memory");
}
