//! Ties session commit to memory extraction, dedup, and storage.
//!
//! `commit()` on a bare [`Session`] just archives its messages; the actual
//! lifecycle described for §4.8 — write the transcript, run the extractor,
//! dedup against existing memories, persist the survivors as L2 contexts —
//! lives here so it can depend on storage and the vector gateway without
//! `ov-session` itself growing those dependencies for its simpler unit tests.

use std::sync::Arc;

use ov_core::context::{Context, ContextType, Level};
use ov_core::identity::RequestContext;
use ov_storage::VikingFS;
use ov_vectordb::ContextSemanticGateway;

use crate::memory::{CandidateMemory, MemoryExtractor};
use crate::session::Session;

/// Embeds text into a dense vector. A narrow seam so the committer doesn't
/// depend on any particular embedding provider.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Cosine similarity above which a new candidate is considered a duplicate
/// of an existing memory in the same category and gets skipped.
pub const DEDUP_THRESHOLD: f32 = 0.9;

/// Outcome of one `commit_session` call.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CommitOutcome {
    pub transcript_uri: String,
    pub archived_messages: usize,
    pub created: usize,
    pub skipped_duplicate: usize,
}

pub struct MemoryCommitter {
    vfs: Arc<VikingFS>,
    gateway: Arc<ContextSemanticGateway>,
    extractor: Arc<dyn MemoryExtractor>,
    embedder: Arc<dyn Embedder>,
}

impl MemoryCommitter {
    pub fn new(
        vfs: Arc<VikingFS>,
        gateway: Arc<ContextSemanticGateway>,
        extractor: Arc<dyn MemoryExtractor>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self { vfs, gateway, extractor, embedder }
    }

    /// Freeze `session`'s message log, persist the transcript, extract
    /// candidate memories, dedup each against existing memories in its
    /// category, and store the survivors as L2 contexts under the caller's
    /// agent memory space.
    pub async fn commit_session(&self, rc: &RequestContext, session: &mut Session) -> anyhow::Result<CommitOutcome> {
        let archived = session.commit();
        if archived.is_empty() {
            return Ok(CommitOutcome::default());
        }

        let transcript_uri = format!("viking://session/{}/{}", rc.user.agent_space_name(), session.id);
        let jsonl = archived
            .iter()
            .map(|m| m.to_jsonl())
            .collect::<Vec<_>>()
            .join("\n");
        self.vfs.write(&transcript_uri, jsonl.as_bytes()).await?;

        let candidates = self.extractor.extract(&archived, &session.id, &rc.user.user_id);
        let mut outcome = CommitOutcome {
            transcript_uri,
            archived_messages: archived.len(),
            created: 0,
            skipped_duplicate: 0,
        };

        for candidate in candidates {
            let vector = self.embedder.embed(&candidate.content);
            if self.is_duplicate(rc, &candidate, &vector).await? {
                outcome.skipped_duplicate += 1;
                continue;
            }
            self.store_candidate(rc, &candidate, vector)?;
            outcome.created += 1;
        }

        Ok(outcome)
    }

    async fn is_duplicate(&self, rc: &RequestContext, candidate: &CandidateMemory, vector: &[f32]) -> anyhow::Result<bool> {
        let matches = self.gateway.search_similar_memories(rc, vector, 5).await?;
        Ok(matches
            .iter()
            .any(|m| m.score >= DEDUP_THRESHOLD && m.meta.get("name").and_then(|v| v.as_str()) == Some(candidate.category.as_str())))
    }

    fn store_candidate(&self, rc: &RequestContext, candidate: &CandidateMemory, vector: Vec<f32>) -> anyhow::Result<()> {
        let owner_space = rc.user.agent_space_name();
        let uri = format!("viking://agent/{}/{}", owner_space, candidate.category.directory());
        let mut context = Context::builder(&uri)
            .abstract_text(candidate.content.clone())
            .context_type(ContextType::Memory)
            .category(candidate.category.as_str())
            .is_leaf(true)
            .level(Level::Full)
            .account_id(rc.account_id())
            .owner_space(owner_space)
            .session_id(candidate.session_id.clone())
            .build();
        context.vector = Some(vector);
        self.gateway.store_context(&context)?;
        Ok(())
    }
}

/// Deterministic fallback embedder: hashes words into a small fixed-size
/// vector. Offline and test-friendly; never wired to a real provider.
pub struct HashEmbedder {
    pub dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; self.dim];
        for word in text.split_whitespace() {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            std::hash::Hash::hash(&word, &mut hasher);
            let idx = (std::hash::Hasher::finish(&hasher) as usize) % self.dim;
            v[idx] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in v.iter_mut() {
                *x /= norm;
            }
        }
        v
    }
}
