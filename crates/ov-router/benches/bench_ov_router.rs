use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ov_core::context::{Context, ContextType};
use ov_core::identity::{Role, RequestContext, UserIdentifier};
use ov_core::trace::TraceCollector;
use ov_router::embedder::HashEmbedder;
use ov_router::retriever::HierarchicalRetriever;
use ov_router::types::{RetrieverConfig, TypedQuery};
use ov_router::Embedder;
use ov_vectordb::driver::LocalDriver;
use ov_vectordb::{CollectionConfig, ContextSemanticGateway, FieldDef, FieldType, IndexConfig, VectorDriver};

const DIM: usize = 32;

fn build_retriever(n: usize) -> (RequestContext, HierarchicalRetriever) {
    let driver = Arc::new(LocalDriver::volatile("bench"));
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

    let gateway = ContextSemanticGateway::new(driver, "ctx");
    let embedder = HashEmbedder::new(DIM);
    let rc = RequestContext::new(UserIdentifier::new("acct-1", "alice", "agent-1"), Role::User);

    for i in 0..n {
        let text = format!("memory entry number {i} about commit message style and review habits");
        let uri = format!("viking://agent/{}/memories/entry-{i}.md", rc.user.agent_space_name());
        let mut ctx = Context::builder(uri)
            .abstract_text(text.clone())
            .context_type(ContextType::Memory)
            .account_id("acct-1")
            .owner_space(rc.user.agent_space_name())
            .build();
        ctx.vector = Some(embedder.embed_dense(&text));
        ctx.active_count = (i % 7) as u64;
        gateway.store_context(&ctx).unwrap();
    }

    let retriever = HierarchicalRetriever::new(
        Arc::new(gateway),
        Arc::new(embedder),
        RetrieverConfig { drill_down: false, ..RetrieverConfig::default() },
    );
    (rc, retriever)
}

fn bench_retrieve(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (rc, retriever) = build_retriever(200);
    let query = TypedQuery::new("commit message style", ContextType::Memory);
    let trace = TraceCollector::new(false);

    c.bench_function("retrieve_200_memories", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(retriever.retrieve(&rc, &query, &trace).await.unwrap());
            })
        })
    });
}

criterion_group!(benches, bench_retrieve);
criterion_main!(benches);
