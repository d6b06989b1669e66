//! BuildingTree container for OpenViking context trees.
//!
//! Port of `openviking/core/building_tree.py`.

use crate::context::Context;
use std::collections::HashMap;

/// Container for a built context tree.
///
/// Maintains a flat list of contexts plus a URI-keyed lookup map
/// and tracks parent-child relationships.
#[derive(Debug, Clone)]
pub struct BuildingTree {
    /// Source file/directory path this tree was built from.
    pub source_path: Option<String>,
    /// Source format identifier (e.g. "markdown", "code").
    pub source_format: Option<String>,
    contexts: Vec<Context>,
    uri_map: HashMap<String, usize>,
    root_uri: Option<String>,
}

impl BuildingTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            source_path: None,
            source_format: None,
            contexts: Vec::new(),
            uri_map: HashMap::new(),
            root_uri: None,
        }
    }

    /// Create a tree with source metadata.
    pub fn with_source(source_path: impl Into<String>, source_format: impl Into<String>) -> Self {
        Self {
            source_path: Some(source_path.into()),
            source_format: Some(source_format.into()),
            contexts: Vec::new(),
            uri_map: HashMap::new(),
            root_uri: None,
        }
    }

    /// Add a context to the tree.
    pub fn add_context(&mut self, context: Context) {
        let idx = self.contexts.len();
        self.uri_map.insert(context.uri.clone(), idx);
        self.contexts.push(context);
    }

    /// Set the root URI.
    pub fn set_root(&mut self, uri: impl Into<String>) {
        self.root_uri = Some(uri.into());
    }

    /// Get the root context, if set.
    pub fn root(&self) -> Option<&Context> {
        self.root_uri
            .as_ref()
            .and_then(|u| self.get(u))
    }

    /// Get all contexts.
    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    /// Look up a context by URI.
    pub fn get(&self, uri: &str) -> Option<&Context> {
        self.uri_map.get(uri).map(|&i| &self.contexts[i])
    }

    /// Get parent of a context.
    pub fn parent(&self, uri: &str) -> Option<&Context> {
        self.get(uri)
            .and_then(|c| c.parent_uri.as_deref())
            .and_then(|pu| self.get(pu))
    }

    /// Get direct children of a URI.
    pub fn children(&self, uri: &str) -> Vec<&Context> {
        self.contexts
            .iter()
            .filter(|c| c.parent_uri.as_deref() == Some(uri))
            .collect()
    }

    /// Get the path from a context up to the root.
    pub fn path_to_root(&self, uri: &str) -> Vec<&Context> {
        let mut path = Vec::new();
        let mut current_uri = Some(uri);
        while let Some(u) = current_uri {
            match self.get(u) {
                Some(ctx) => {
                    path.push(ctx);
                    current_uri = ctx.parent_uri.as_deref();
                }
                None => break,
            }
        }
        path
    }

    /// Convert to a JSON-serializable directory structure.
    pub fn to_directory_structure(&self) -> serde_json::Value {
        match &self.root_uri {
            Some(uri) => self.build_dir(uri),
            None => serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    fn build_dir(&self, uri: &str) -> serde_json::Value {
        let ctx = match self.get(uri) {
            Some(c) => c,
            None => return serde_json::Value::Object(serde_json::Map::new()),
        };
        let title = ctx
            .meta
            .get("semantic_title")
            .or_else(|| ctx.meta.get("source_title"))
            .and_then(|v| v.as_str())
            .unwrap_or("Untitled");
        let children: Vec<serde_json::Value> = self
            .children(uri)
            .iter()
            .map(|c| self.build_dir(&c.uri))
            .collect();
        serde_json::json!({
            "uri": uri,
            "title": title,
            "type": ctx.context_type.as_str(),
            "children": children,
        })
    }

    /// Number of contexts in the tree.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl Default for BuildingTree {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a BuildingTree {
    type Item = &'a Context;
    type IntoIter = std::slice::Iter<'a, Context>;
    fn into_iter(self) -> Self::IntoIter {
        self.contexts.iter()
    }
}
