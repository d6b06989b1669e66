//! OpenViking Router — hierarchical context retrieval over the semantic gateway.
//!
//! Resolves a [`types::TypedQuery`] into the root directories for its
//! context type, embeds the query, delegates to
//! [`ov_vectordb::ContextSemanticGateway`], optionally drills into child
//! contexts, and re-ranks by a hotness score blending recency and access
//! frequency with raw semantic similarity.

pub mod embedder;
pub mod hotness;
pub mod retriever;
pub mod roots;
pub mod types;

pub use embedder::{Embedder, HashEmbedder};
pub use retriever::HierarchicalRetriever;
pub use roots::root_uris;
pub use types::{RetrievedContext, RetrieverConfig, TypedQuery};

#[cfg(test)]
mod tests;
