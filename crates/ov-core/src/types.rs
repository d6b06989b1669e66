use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Semantic extraction queue message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticMsg {
    pub id: String,
    pub uri: String,
    pub context_type: String,
    pub status: SemanticStatus,
    pub timestamp: i64,
    pub recursive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SemanticStatus {
    Pending,
    Processing,
    Completed,
}

/// Transaction status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionStatus {
    Init,
    Acquire,
    Exec,
    Commit,
    Fail,
    Releasing,
    Released,
}

/// Transaction record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub locks: Vec<String>,
    pub status: TransactionStatus,
    pub init_info: HashMap<String, serde_json::Value>,
    pub rollback_info: HashMap<String, serde_json::Value>,
    pub created_at: f64,
    pub updated_at: f64,
}

/// Embedding result (dense + optional sparse)
#[derive(Debug, Clone, Default)]
pub struct EmbedResult {
    pub dense_vector: Option<Vec<f32>>,
    pub sparse_vector: Option<HashMap<String, f32>>,
}

/// Directory definition for preset structure
#[derive(Debug, Clone)]
pub struct DirectoryDefinition {
    pub path: String,
    pub abstract_text: String,
    pub overview: String,
    pub children: Vec<DirectoryDefinition>,
}

/// The canonical result shape every vector driver returns.
///
/// Replaces attribute-duck-typed result objects with a single tagged struct:
/// retrievers read these fields directly and never need to know which
/// backend produced them (see DESIGN.md's driver-registry entry).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MatchedContext {
    pub id: String,
    pub uri: String,
    pub parent_uri: Option<String>,
    pub context_type: String,
    pub level: u8,
    pub account_id: String,
    pub owner_space: String,
    pub score: f32,
    pub active_count: u64,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub meta: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matched_context_default_is_empty() {
        let m = MatchedContext::default();
        assert!(m.id.is_empty());
        assert_eq!(m.score, 0.0);
        assert!(m.updated_at.is_none());
    }

    #[test]
    fn matched_context_serde_roundtrip() {
        let m = MatchedContext {
            id: "abc".into(),
            uri: "viking://resources/x".into(),
            score: 0.9,
            ..Default::default()
        };
        let json = serde_json::to_string(&m).unwrap();
        let m2: MatchedContext = serde_json::from_str(&json).unwrap();
        assert_eq!(m2.uri, m.uri);
        assert_eq!(m2.score, m.score);
    }
}
