//! Tenant-aware search surface over a vector driver.
//!
//! Every query passed in here gets ANDed with a tenant filter derived from
//! the caller's [`RequestContext`] before it reaches the driver, so callers
//! above this layer can never see another tenant's contexts by forgetting a
//! `WHERE account_id = ...` clause. Root sees everything, an admin is scoped
//! to their account, a plain user is scoped to their account and their own
//! (or their agent's) owner space.

use std::collections::HashMap;
use std::sync::Arc;

use ov_core::identity::{RequestContext, Role};
use ov_core::types::MatchedContext;
use serde_json::Value;

use crate::driver::VectorDriver;
use crate::error::Result;
use crate::filter::Filter;

const DEFAULT_INDEX: &str = "dense";

/// Tenant-scoped wrapper around a single collection on a [`VectorDriver`].
pub struct ContextSemanticGateway {
    driver: Arc<dyn VectorDriver>,
    collection: String,
}

impl ContextSemanticGateway {
    pub fn new(driver: Arc<dyn VectorDriver>, collection: impl Into<String>) -> Self {
        Self { driver, collection: collection.into() }
    }

    /// The `_tenant_filter` rule: Root sees everything, Admin is scoped to
    /// their account, User is scoped to their account and to their own or
    /// their agent's owner space (or the account-wide space, hence `""`).
    fn tenant_filter(ctx: &RequestContext) -> Option<Filter> {
        match ctx.role {
            Role::Root => None,
            Role::Admin => Some(Filter::Eq {
                field: "account_id".into(),
                values: vec![Value::String(ctx.account_id().to_string())],
            }),
            Role::User => {
                let user_space = ctx.user.user_space_name();
                let agent_space = ctx.user.agent_space_name();
                Some(Filter::And(vec![
                    Filter::Eq {
                        field: "account_id".into(),
                        values: vec![Value::String(ctx.account_id().to_string())],
                    },
                    Filter::In {
                        field: "owner_space".into(),
                        values: vec![
                            Value::String(user_space),
                            Value::String(agent_space),
                            Value::String(String::new()),
                        ],
                    },
                ]))
            }
        }
    }

    /// AND-merge an optional caller-supplied filter with the tenant filter.
    fn merge_filters(ctx: &RequestContext, extra: Option<Filter>) -> Option<Filter> {
        match (Self::tenant_filter(ctx), extra) {
            (None, None) => None,
            (None, Some(e)) => Some(e),
            (Some(t), None) => Some(t),
            (Some(t), Some(e)) => Some(t.and(e)),
        }
    }

    async fn run_search(
        &self,
        ctx: &RequestContext,
        query_vector: &[f32],
        limit: usize,
        extra_filter: Option<Filter>,
    ) -> Result<Vec<MatchedContext>> {
        let filter = Self::merge_filters(ctx, extra_filter);
        let result = self
            .driver
            .search(&self.collection, DEFAULT_INDEX, query_vector, limit, 0, filter.as_ref())
            .await?;
        Ok(result.data.into_iter().map(search_item_to_matched).collect())
    }

    /// Tenant-scoped vector search with no level/parent restriction.
    pub async fn search_in_tenant(
        &self,
        ctx: &RequestContext,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<MatchedContext>> {
        self.run_search(ctx, query_vector, limit, None).await
    }

    /// Search restricted to abstract/overview (level 0/1) roots.
    pub async fn search_global_roots_in_tenant(
        &self,
        ctx: &RequestContext,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<MatchedContext>> {
        let level_filter = Filter::In {
            field: "level".into(),
            values: vec![Value::from(0u8), Value::from(1u8)],
        };
        self.run_search(ctx, query_vector, limit, Some(level_filter)).await
    }

    /// Search restricted to a `context_type` and a set of candidate root
    /// directories (a context matches if its `uri` starts with any of
    /// them), used by the hierarchical retriever (§4.7) to resolve a
    /// [`TypedQuery`](crate) against its type's root URIs or the caller's
    /// `target_directories` override. The type filter is merged first, the
    /// tenant filter last, matching C6's stated merge order.
    pub async fn search_typed_in_tenant(
        &self,
        ctx: &RequestContext,
        query_vector: &[f32],
        context_type: &str,
        directories: &[String],
        limit: usize,
    ) -> Result<Vec<MatchedContext>> {
        let type_filter = Filter::Eq { field: "context_type".into(), values: vec![Value::String(context_type.to_string())] };
        let filter = if directories.is_empty() {
            type_filter
        } else {
            let dir_filter = Filter::Or(
                directories.iter().map(|d| Filter::Prefix { field: "uri".into(), prefix: d.clone() }).collect(),
            );
            type_filter.and(dir_filter)
        };
        self.run_search(ctx, query_vector, limit, Some(filter)).await
    }

    /// Search restricted to the direct children of `parent_uri`.
    pub async fn search_children_in_tenant(
        &self,
        ctx: &RequestContext,
        query_vector: &[f32],
        parent_uri: &str,
        limit: usize,
    ) -> Result<Vec<MatchedContext>> {
        let parent_filter = Filter::Eq {
            field: "parent_uri".into(),
            values: vec![Value::String(parent_uri.to_string())],
        };
        self.run_search(ctx, query_vector, limit, Some(parent_filter)).await
    }

    /// Search restricted to `context_type = "memory"`, used for dedup
    /// (§4.8) before a new memory is committed.
    pub async fn search_similar_memories(
        &self,
        ctx: &RequestContext,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<MatchedContext>> {
        let memory_filter = Filter::Eq {
            field: "context_type".into(),
            values: vec![Value::String("memory".into())],
        };
        self.run_search(ctx, query_vector, limit, Some(memory_filter)).await
    }

    /// Fetch a single context by its exact URI, still tenant-scoped.
    pub async fn get_context_by_uri(
        &self,
        ctx: &RequestContext,
        uri: &str,
    ) -> Result<Option<MatchedContext>> {
        let uri_filter = Filter::Eq { field: "uri".into(), values: vec![Value::String(uri.to_string())] };
        let filter = Self::merge_filters(ctx, Some(uri_filter));
        // A URI lookup is a filter match, not a similarity search — go
        // through the driver's filter-only scan so it never gets
        // dimension-checked against the collection's ANN index.
        let mut rows = self.driver.scan(&self.collection, filter.as_ref(), 1)?;
        Ok(rows.pop().map(search_item_to_matched))
    }

    /// Persist a single context as a row in the collection, tagging it with
    /// the fields the tenant filter relies on (`account_id`, `owner_space`,
    /// `level`). Used by session commit to land freshly extracted memories.
    pub fn store_context(&self, context: &ov_core::context::Context) -> Result<()> {
        let mut row = HashMap::new();
        row.insert("id".to_string(), Value::String(context.id.to_string()));
        row.insert("uri".to_string(), Value::String(context.uri.clone()));
        row.insert(
            "parent_uri".to_string(),
            context.parent_uri.clone().map(Value::String).unwrap_or(Value::Null),
        );
        row.insert("context_type".to_string(), Value::String(context.context_type.as_str().to_string()));
        row.insert("account_id".to_string(), Value::String(context.account_id.clone()));
        row.insert("owner_space".to_string(), Value::String(context.owner_space.clone()));
        row.insert("level".to_string(), Value::from(context.level.as_u8()));
        row.insert("active_count".to_string(), Value::from(context.active_count));
        row.insert("is_leaf".to_string(), Value::Bool(context.is_leaf));
        row.insert("name".to_string(), Value::String(context.category.clone()));
        row.insert("abstract".to_string(), Value::String(context.abstract_text.clone()));
        row.insert("updated_at".to_string(), Value::String(context.updated_at.to_rfc3339()));
        row.insert("created_at".to_string(), Value::String(context.created_at.to_rfc3339()));
        if let Some(vector) = &context.vector {
            row.insert("vector".to_string(), serde_json::json!(vector));
        }
        self.driver.upsert(&self.collection, &[row])?;
        Ok(())
    }

    /// Bump `active_count` by one on the row identified by `id`, used by the
    /// hierarchical retriever (§4.7) to mark a context as freshly accessed.
    /// Re-fetches the full row (vector included) before re-upserting so the
    /// stored embedding survives the round trip.
    pub fn touch_active_count(&self, id: &str) -> Result<()> {
        let id_value = Value::String(id.to_string());
        let mut rows = self.driver.fetch_by_id(&self.collection, std::slice::from_ref(&id_value))?;
        let Some(Some(mut row)) = rows.pop() else {
            return Ok(());
        };
        let next = row.get("active_count").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
        row.insert("active_count".to_string(), Value::from(next));
        row.insert("id".to_string(), id_value);
        self.driver.upsert(&self.collection, &[row])?;
        Ok(())
    }
}

fn search_item_to_matched(item: crate::collection::SearchItem) -> MatchedContext {
    let mut fields = item.fields;
    let take_str = |fields: &mut HashMap<String, Value>, k: &str| {
        fields.remove(k).and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default()
    };
    let uri = take_str(&mut fields, "uri");
    let parent_uri = fields.remove("parent_uri").and_then(|v| v.as_str().map(str::to_string));
    let context_type = take_str(&mut fields, "context_type");
    let account_id = take_str(&mut fields, "account_id");
    let owner_space = take_str(&mut fields, "owner_space");
    let level = fields.remove("level").and_then(|v| v.as_u64()).unwrap_or(2) as u8;
    let active_count = fields.remove("active_count").and_then(|v| v.as_u64()).unwrap_or(0);
    let updated_at = fields
        .remove("updated_at")
        .and_then(|v| v.as_str().map(str::to_string))
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc));
    let id = item.id.as_str().map(str::to_string).unwrap_or_else(|| item.id.to_string());

    MatchedContext {
        id,
        uri,
        parent_uri,
        context_type,
        level,
        account_id,
        owner_space,
        score: item.score,
        active_count,
        updated_at,
        meta: fields,
    }
}
