//! Request/response shapes for the hierarchical retriever.

use ov_core::context::ContextType;
use ov_core::types::MatchedContext;
use serde::Serialize;

/// A typed retrieval request. `target_directories`, when set, overrides the
/// context-type root resolution entirely (the caller already knows where to
/// look).
#[derive(Debug, Clone)]
pub struct TypedQuery {
    pub query: String,
    pub context_type: ContextType,
    pub intent: Option<String>,
    pub target_directories: Option<Vec<String>>,
}

impl TypedQuery {
    pub fn new(query: impl Into<String>, context_type: ContextType) -> Self {
        Self { query: query.into(), context_type, intent: None, target_directories: None }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn with_target_directories(mut self, dirs: Vec<String>) -> Self {
        self.target_directories = Some(dirs);
        self
    }
}

/// Tunables for hotness re-ranking and drill-down.
#[derive(Debug, Clone, Copy)]
pub struct RetrieverConfig {
    /// Weight given to hotness vs. raw semantic score in `final_score`.
    pub alpha: f32,
    /// Half-life, in days, of the recency component of hotness.
    pub half_life_days: f32,
    /// Whether to drill into the children of returned L0/L1 contexts.
    pub drill_down: bool,
    /// How many candidates to pull from C6 before drill-down and re-ranking.
    pub candidate_limit: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self { alpha: 0.2, half_life_days: 14.0, drill_down: true, candidate_limit: 20 }
    }
}

/// One retrieved context, carrying both the raw semantic score C6 returned
/// and the hotness-adjusted `final_score` this layer computed.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedContext {
    pub context: MatchedContext,
    pub semantic_score: f32,
    pub hotness: f32,
    pub final_score: f32,
}
