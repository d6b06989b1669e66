//! HTTP route handlers for OpenViking API.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use ov_core::context::{Context, ContextType, Level};
use ov_core::identity::Role;
use ov_core::trace::TraceCollector;
use ov_parser::traits::DocumentParser;
use ov_router::types::TypedQuery;
use ov_session::session::{Part, Role as MsgRole};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{require_role, require_root_or_own_account, AuthContext};
use crate::error::{ok_json, ApiError, Result};
use crate::state::AppState;

// ==================== Health / Readiness ====================

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api/v1/status", get(status))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    let uptime = state.start_time.elapsed().as_secs();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime,
        "contexts": state.context_store.count(),
        "sessions": state.session_manager.count(),
    }))
}

/// Probe the filesystem, vector DB, and key manager; 503 with a
/// per-component breakdown on any failure.
async fn readiness_snapshot(state: &AppState) -> (Value, bool) {
    let mut healthy = true;
    let mut components = serde_json::Map::new();

    let fs_status = match state.vfs.write_string("viking://_system/.ready_probe", "ok").await {
        Ok(()) => "ok",
        Err(_) => {
            healthy = false;
            "error"
        }
    };
    components.insert("filesystem".into(), json!(fs_status));

    let vector_status = if state.driver.has_collection(&state.collection_name) { "ok" } else { "error" };
    if vector_status != "ok" {
        healthy = false;
    }
    components.insert("vector_db".into(), json!(vector_status));

    components.insert("key_manager".into(), json!("ok"));

    (json!({ "status": if healthy { "ok" } else { "error" }, "components": components }), healthy)
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (body, healthy) = readiness_snapshot(&state).await;
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(body))
}

// ==================== Context / Memory CRUD (legacy in-memory store) ====================

pub fn context_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/contexts", get(list_contexts).post(create_context))
        .route("/api/v1/contexts/search", get(search_contexts))
        .route(
            "/api/v1/contexts/{*uri_path}",
            get(get_context).put(update_context).delete(delete_context),
        )
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    context_type: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn list_contexts(State(state): State<AppState>, Query(q): Query<ListQuery>) -> Json<Value> {
    let mut contexts = if let Some(ref ct) = q.context_type {
        state.context_store.list_by_type(ct)
    } else {
        state.context_store.list()
    };
    contexts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    let total = contexts.len();
    let offset = q.offset.unwrap_or(0);
    let limit = q.limit.unwrap_or(100).min(1000);
    let page: Vec<_> = contexts.into_iter().skip(offset).take(limit).collect();
    ok_json(json!({ "contexts": page, "total": total, "offset": offset, "limit": limit }))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
    #[serde(rename = "type")]
    context_type: Option<String>,
    limit: Option<usize>,
}

async fn search_contexts(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> Result<Json<Value>> {
    let query = q.q.unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::bad_request("query parameter \"q\" is required"));
    }
    let mut results = state.context_store.search(&query);
    if let Some(ref ct) = q.context_type {
        results.retain(|c| c.context_type.as_str() == ct.as_str());
    }
    let limit = q.limit.unwrap_or(20).min(200);
    results.truncate(limit);
    Ok(ok_json(json!({ "results": results, "query": query, "count": results.len() })))
}

#[derive(Deserialize)]
pub struct CreateContextBody {
    pub uri: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub context_type: Option<String>,
    pub category: Option<String>,
    pub parent_uri: Option<String>,
    pub is_leaf: Option<bool>,
    pub meta: Option<HashMap<String, Value>>,
}

async fn create_context(
    State(state): State<AppState>,
    Json(body): Json<CreateContextBody>,
) -> Result<(StatusCode, Json<Value>)> {
    if body.uri.is_empty() {
        return Err(ApiError::bad_request("uri is required"));
    }
    if body.uri.contains("..") || body.uri.contains('\0') {
        return Err(ApiError::bad_request("uri contains illegal characters"));
    }
    if state.context_store.get(&body.uri).is_some() {
        return Err(ApiError::conflict(format!("context already exists: {}", body.uri)));
    }
    let abs = body.abstract_text.unwrap_or_default();
    let mut builder = Context::builder(&body.uri).abstract_text(&abs).is_leaf(body.is_leaf.unwrap_or(false));
    if let Some(ref p) = body.parent_uri {
        builder = builder.parent_uri(p);
    }
    if let Some(ref ct) = body.context_type {
        if let Ok(parsed) = ct.parse::<ContextType>() {
            builder = builder.context_type(parsed);
        }
    }
    if let Some(ref cat) = body.category {
        builder = builder.category(cat);
    }
    let mut ctx = builder.build();
    if let Some(meta) = body.meta {
        ctx.meta = meta;
    }
    state.context_store.insert(ctx.clone());
    Ok((StatusCode::CREATED, ok_json(json!({ "context": ctx }))))
}

async fn get_context(State(state): State<AppState>, Path(uri_path): Path<String>) -> Result<Json<Value>> {
    let uri = format!("viking://{uri_path}");
    let ctx = state.context_store.get(&uri).ok_or_else(|| ApiError::not_found(format!("context not found: {uri}")))?;
    Ok(ok_json(json!({ "context": ctx })))
}

#[derive(Deserialize)]
pub struct UpdateContextBody {
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub category: Option<String>,
    pub meta: Option<HashMap<String, Value>>,
    pub is_leaf: Option<bool>,
}

async fn update_context(
    State(state): State<AppState>,
    Path(uri_path): Path<String>,
    Json(body): Json<UpdateContextBody>,
) -> Result<Json<Value>> {
    let uri = format!("viking://{uri_path}");
    let updated = state
        .context_store
        .update(&uri, |ctx| {
            if let Some(ref abs) = body.abstract_text {
                ctx.abstract_text = abs.clone();
            }
            if let Some(ref cat) = body.category {
                ctx.category = cat.clone();
            }
            if let Some(leaf) = body.is_leaf {
                ctx.is_leaf = leaf;
            }
            if let Some(ref meta) = body.meta {
                ctx.meta = meta.clone();
            }
            ctx.updated_at = chrono::Utc::now();
        })
        .ok_or_else(|| ApiError::not_found(format!("context not found: {uri}")))?;
    Ok(ok_json(json!({ "context": updated })))
}

async fn delete_context(State(state): State<AppState>, Path(uri_path): Path<String>) -> Result<StatusCode> {
    let uri = format!("viking://{uri_path}");
    state.context_store.remove(&uri).ok_or_else(|| ApiError::not_found(format!("context not found: {uri}")))?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Resource Ingestion ====================

pub fn resource_routes() -> Router<AppState> {
    Router::new().route("/api/v1/resources", post(ingest_resources))
}

#[derive(Deserialize)]
pub struct ResourceItem {
    pub uri: String,
    pub content: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct IngestBody {
    pub resources: Vec<ResourceItem>,
}

/// Ingest a batch of resources. Partial-failure tolerant: one bad item
/// doesn't fail the whole batch, its error is reported alongside the
/// successes.
async fn ingest_resources(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(body): Json<IngestBody>,
) -> Result<Json<Value>> {
    let mut ingested = 0usize;
    let mut errors = Vec::new();

    for item in &body.resources {
        match ingest_one(&state, &auth, item).await {
            Ok(()) => ingested += 1,
            Err(err) => errors.push(json!({ "uri": item.uri, "message": err.to_string() })),
        }
    }

    Ok(ok_json(json!({ "root_uri": "viking://resources", "ingested": ingested, "errors": errors })))
}

/// Ingest one resource into the L0/L1/L2/L3 hierarchy: an abstract context,
/// an overview context, a full-body context, and — if the content parses
/// into more than one chunk — an L3 context per chunk, all sharing `uri`
/// except the chunks, which hang off it via `parent_uri`.
async fn ingest_one(state: &AppState, auth: &AuthContext, item: &ResourceItem) -> anyhow::Result<()> {
    state.vfs.check_scope(auth, &item.uri)?;
    state.vfs.write_string(&item.uri, &item.content).await?;

    let account_id = auth.account_id().to_string();
    let category = item.category.clone().unwrap_or_default();
    let parsed = ov_parser::parser_for(&item.uri).parse_content(&item.content)?;

    let abstract_text = item
        .abstract_text
        .clone()
        .unwrap_or_else(|| truncate_chars(&item.content, 160));
    let overview_text = parsed
        .chunks
        .first()
        .map(|c| truncate_chars(&c.text, 512))
        .unwrap_or_else(|| truncate_chars(&item.content, 512));

    store_resource_level(state, item, &category, &account_id, Level::Abstract, abstract_text, false).await?;
    store_resource_level(state, item, &category, &account_id, Level::Overview, overview_text, false).await?;
    store_resource_level(
        state,
        item,
        &category,
        &account_id,
        Level::Full,
        item.content.clone(),
        parsed.chunks.is_empty(),
    )
    .await?;

    for (i, chunk) in parsed.chunks.iter().enumerate() {
        let chunk_uri = format!("{}#chunk-{i}", item.uri);
        let mut meta = HashMap::new();
        for (k, v) in &chunk.metadata {
            meta.insert(k.clone(), Value::String(v.clone()));
        }
        let mut ctx = Context::builder(&chunk_uri)
            .abstract_text(chunk.text.clone())
            .parent_uri(item.uri.clone())
            .context_type(ContextType::Resource)
            .category(category.clone())
            .account_id(account_id.clone())
            .level(Level::Chunk)
            .is_leaf(true)
            .meta(meta)
            .build();
        ctx.vector = Some(state.embedder.embed_dense(ctx.get_vectorization_text()));
        state.gateway.store_context(&ctx)?;
    }

    Ok(())
}

async fn store_resource_level(
    state: &AppState,
    item: &ResourceItem,
    category: &str,
    account_id: &str,
    level: Level,
    text: String,
    is_leaf: bool,
) -> anyhow::Result<()> {
    let mut ctx = Context::builder(&item.uri)
        .abstract_text(text)
        .context_type(ContextType::Resource)
        .category(category.to_string())
        .account_id(account_id.to_string())
        .level(level)
        .is_leaf(is_leaf)
        .build();
    ctx.vector = Some(state.embedder.embed_dense(ctx.get_vectorization_text()));
    state.gateway.store_context(&ctx)?;
    Ok(())
}

/// Truncate to at most `max` chars, appending an ellipsis if anything was
/// cut. Character-counted so multi-byte UTF-8 (CJK, emoji) never panics on
/// a byte boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
}

// ==================== Retrieval ====================

pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/search/find", get(search_find))
        .route("/api/v1/search/search", get(search_search))
        .route("/api/v1/search/grep", get(search_grep))
        .route("/api/v1/search/glob", get(search_glob))
}

#[derive(Deserialize)]
pub struct SearchParams {
    q: String,
    #[serde(rename = "type")]
    context_type: Option<String>,
    intent: Option<String>,
    pattern: Option<String>,
    #[serde(default)]
    trace: bool,
    limit: Option<usize>,
}

fn parse_context_type(raw: Option<&str>) -> ContextType {
    raw.and_then(|s| s.parse().ok()).unwrap_or(ContextType::Resource)
}

async fn run_typed_search(
    state: &AppState,
    auth: &AuthContext,
    params: &SearchParams,
) -> Result<(Vec<ov_router::types::RetrievedContext>, Option<Value>)> {
    let collector = TraceCollector::new(params.trace);
    collector.event("search", &params.q, "start");

    let mut query = TypedQuery::new(params.q.clone(), parse_context_type(params.context_type.as_deref()));
    if let Some(ref intent) = params.intent {
        query = query.with_intent(intent.clone());
    }

    let results = state.retriever.retrieve(auth, &query, &collector).await?;
    collector.count("search.results", results.len() as i64);

    let trace = if params.trace {
        let result = collector.finish("ok");
        Some(serde_json::to_value(&result).unwrap_or(Value::Null))
    } else {
        None
    };
    Ok((results, trace))
}

async fn search_find(State(state): State<AppState>, auth: AuthContext, Query(p): Query<SearchParams>) -> Result<Json<Value>> {
    let hit = state.gateway.get_context_by_uri(&auth, &p.q).await?;
    Ok(ok_json(json!({ "context": hit })))
}

async fn search_search(State(state): State<AppState>, auth: AuthContext, Query(p): Query<SearchParams>) -> Result<Json<Value>> {
    let (mut results, trace) = run_typed_search(&state, &auth, &p).await?;
    if let Some(limit) = p.limit {
        results.truncate(limit);
    }
    Ok(ok_json(json!({ "results": results, "trace": trace })))
}

async fn search_grep(State(state): State<AppState>, auth: AuthContext, Query(p): Query<SearchParams>) -> Result<Json<Value>> {
    let (results, trace) = run_typed_search(&state, &auth, &p).await?;
    let needle = p.q.to_lowercase();
    let mut filtered: Vec<_> = results
        .into_iter()
        .filter(|r| {
            r.context
                .meta
                .get("abstract")
                .and_then(|v| v.as_str())
                .map(|s| s.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .collect();
    if let Some(limit) = p.limit {
        filtered.truncate(limit);
    }
    Ok(ok_json(json!({ "results": filtered, "trace": trace })))
}

/// Minimal `*`-wildcard glob match: splits the pattern on `*` and checks the
/// parts occur in order within `uri`.
fn glob_match(pattern: &str, uri: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    let mut rest = uri;
    let parts: Vec<&str> = pattern.split('*').collect();
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(idx) => {
                if i == 0 && !pattern.starts_with('*') && idx != 0 {
                    return false;
                }
                rest = &rest[idx + part.len()..];
            }
            None => return false,
        }
    }
    if let Some(last) = parts.last() {
        if !pattern.ends_with('*') && !last.is_empty() && !uri.ends_with(last) {
            return false;
        }
    }
    true
}

async fn search_glob(State(state): State<AppState>, auth: AuthContext, Query(p): Query<SearchParams>) -> Result<Json<Value>> {
    let (results, trace) = run_typed_search(&state, &auth, &p).await?;
    let pattern = p.pattern.clone().unwrap_or_default();
    let mut filtered: Vec<_> = results.into_iter().filter(|r| glob_match(&pattern, &r.context.uri)).collect();
    if let Some(limit) = p.limit {
        filtered.truncate(limit);
    }
    Ok(ok_json(json!({ "results": filtered, "trace": trace })))
}

// ==================== Session Routes ====================

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/sessions", get(list_sessions).post(create_session))
        .route("/api/v1/sessions/{id}", get(get_session).delete(close_session))
        .route("/api/v1/sessions/{id}/messages", post(add_message))
        .route("/api/v1/sessions/{id}/commit", post(commit_session))
}

fn check_session_owner(auth: &AuthContext, session_user_id: &str) -> Result<()> {
    if auth.is_root() || auth.role >= Role::Admin || auth.user.user_id == session_user_id {
        Ok(())
    } else {
        Err(ApiError::permission_denied("not the owner of this session"))
    }
}

#[derive(Deserialize)]
pub struct CreateSessionBody {
    pub user_id: String,
    pub id: Option<String>,
}

async fn create_session(
    State(state): State<AppState>,
    _auth: AuthContext,
    Json(body): Json<CreateSessionBody>,
) -> Result<(StatusCode, Json<Value>)> {
    if body.user_id.is_empty() {
        return Err(ApiError::bad_request("user_id is required"));
    }
    let session = if let Some(id) = body.id {
        if state.session_manager.get(&id).is_some() {
            return Err(ApiError::conflict(format!("session already exists: {id}")));
        }
        state.session_manager.create_with_id(id, &body.user_id)
    } else {
        state.session_manager.create(&body.user_id)
    };
    Ok((StatusCode::CREATED, ok_json(json!({ "session": session }))))
}

#[derive(Deserialize)]
pub struct SessionListQuery {
    user_id: Option<String>,
    active_only: Option<bool>,
}

async fn list_sessions(State(state): State<AppState>, _auth: AuthContext, Query(q): Query<SessionListQuery>) -> Json<Value> {
    let sessions = if q.active_only.unwrap_or(false) {
        state.session_manager.list_active()
    } else if let Some(ref uid) = q.user_id {
        state.session_manager.list_by_user(uid)
    } else {
        state.session_manager.list_active()
    };
    ok_json(json!({ "sessions": sessions, "count": sessions.len() }))
}

async fn get_session(State(state): State<AppState>, auth: AuthContext, Path(id): Path<String>) -> Result<Json<Value>> {
    let session = state.session_manager.get(&id).ok_or_else(|| ApiError::not_found(format!("session not found: {id}")))?;
    check_session_owner(&auth, &session.user_id)?;
    Ok(ok_json(json!({ "session": session })))
}

async fn close_session(State(state): State<AppState>, auth: AuthContext, Path(id): Path<String>) -> Result<StatusCode> {
    let session = state.session_manager.get(&id).ok_or_else(|| ApiError::not_found(format!("session not found: {id}")))?;
    check_session_owner(&auth, &session.user_id)?;
    if !state.session_manager.close(&id) {
        return Err(ApiError::not_found(format!("session not found: {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct AddMessageBody {
    pub role: String,
    pub content: String,
}

async fn add_message(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(body): Json<AddMessageBody>,
) -> Result<(StatusCode, Json<Value>)> {
    let mut session = state.session_manager.get(&id).ok_or_else(|| ApiError::not_found(format!("session not found: {id}")))?;
    check_session_owner(&auth, &session.user_id)?;
    let role = match body.role.as_str() {
        "user" => MsgRole::User,
        "assistant" => MsgRole::Assistant,
        "system" => MsgRole::System,
        "tool" => MsgRole::Tool,
        _ => return Err(ApiError::bad_request(format!("invalid role: {}", body.role))),
    };
    let msg = session.add_message(role, vec![Part::text(&body.content)]).clone();
    state.session_manager.update(&session);
    Ok((StatusCode::CREATED, ok_json(json!({ "message": msg }))))
}

async fn commit_session(State(state): State<AppState>, auth: AuthContext, Path(id): Path<String>) -> Result<Json<Value>> {
    let mut session = state.session_manager.get(&id).ok_or_else(|| ApiError::not_found(format!("session not found: {id}")))?;
    check_session_owner(&auth, &session.user_id)?;
    let outcome = state.committer.commit_session(&auth, &mut session).await?;
    state.session_manager.update(&session);
    Ok(ok_json(json!({ "outcome": outcome, "session": session })))
}

// ==================== Admin: accounts/users/invitations ====================

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/accounts", get(list_accounts).post(create_account))
        .route("/api/v1/admin/accounts/{account_id}", delete(delete_account))
        .route(
            "/api/v1/admin/accounts/{account_id}/users",
            get(list_users).post(register_user),
        )
        .route("/api/v1/admin/accounts/{account_id}/users/{user_id}", delete(remove_user))
        .route(
            "/api/v1/admin/accounts/{account_id}/users/{user_id}/role",
            put(set_user_role),
        )
        .route(
            "/api/v1/admin/accounts/{account_id}/users/{user_id}/regenerate_key",
            post(regenerate_user_key),
        )
        .route("/api/v1/admin/invitations", get(list_invitations).post(create_invitation))
        .route("/api/v1/admin/invitations/{token_id}", delete(revoke_invitation))
}

async fn list_accounts(State(state): State<AppState>, auth: AuthContext) -> Result<Json<Value>> {
    require_role(&auth, Role::Root)?;
    let accounts = state.tenant.get_accounts().await;
    Ok(ok_json(json!({ "accounts": accounts })))
}

#[derive(Deserialize)]
pub struct CreateAccountBody {
    pub account_id: String,
    pub admin_user_id: String,
}

async fn create_account(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(body): Json<CreateAccountBody>,
) -> Result<(StatusCode, Json<Value>)> {
    require_role(&auth, Role::Root)?;
    let issued = state.tenant.create_account(&body.account_id, &body.admin_user_id).await?;
    Ok((StatusCode::CREATED, ok_json(json!({ "account_id": body.account_id, "api_key": issued.0 }))))
}

async fn delete_account(State(state): State<AppState>, auth: AuthContext, Path(account_id): Path<String>) -> Result<StatusCode> {
    require_role(&auth, Role::Root)?;
    state.tenant.delete_account(&account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users(State(state): State<AppState>, auth: AuthContext, Path(account_id): Path<String>) -> Result<Json<Value>> {
    require_root_or_own_account(&auth, &account_id)?;
    let users = state.tenant.get_users(&account_id).await?;
    Ok(ok_json(json!({ "users": users })))
}

#[derive(Deserialize)]
pub struct RegisterUserBody {
    pub user_id: String,
    pub role: Role,
}

async fn register_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(account_id): Path<String>,
    Json(body): Json<RegisterUserBody>,
) -> Result<(StatusCode, Json<Value>)> {
    require_root_or_own_account(&auth, &account_id)?;
    let issued = state.tenant.register_user(&account_id, &body.user_id, body.role).await?;
    Ok((StatusCode::CREATED, ok_json(json!({ "user_id": body.user_id, "api_key": issued.0 }))))
}

async fn remove_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((account_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    require_root_or_own_account(&auth, &account_id)?;
    state.tenant.remove_user(&account_id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct SetRoleBody {
    pub role: Role,
}

async fn set_user_role(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((account_id, user_id)): Path<(String, String)>,
    Json(body): Json<SetRoleBody>,
) -> Result<Json<Value>> {
    require_root_or_own_account(&auth, &account_id)?;
    state.tenant.set_role(&account_id, &user_id, body.role).await?;
    Ok(ok_json(json!({ "account_id": account_id, "user_id": user_id, "role": body.role })))
}

async fn regenerate_user_key(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((account_id, user_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    require_root_or_own_account(&auth, &account_id)?;
    let issued = state.tenant.regenerate_key(&account_id, &user_id).await?;
    Ok(ok_json(json!({ "user_id": user_id, "api_key": issued.0 })))
}

async fn list_invitations(State(state): State<AppState>, auth: AuthContext) -> Result<Json<Value>> {
    require_role(&auth, Role::Root)?;
    let tokens = state.tenant.list_invitation_tokens().await;
    Ok(ok_json(json!({ "tokens": tokens })))
}

#[derive(Deserialize)]
pub struct CreateInvitationBody {
    pub max_uses: Option<u32>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

async fn create_invitation(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(body): Json<CreateInvitationBody>,
) -> Result<(StatusCode, Json<Value>)> {
    require_role(&auth, Role::Root)?;
    let created_by = auth.user.user_id.clone();
    let (token_id, token) = state.tenant.create_invitation_token(&created_by, body.max_uses, body.expires_at).await?;
    Ok((StatusCode::CREATED, ok_json(json!({ "token_id": token_id, "token": token }))))
}

async fn revoke_invitation(State(state): State<AppState>, auth: AuthContext, Path(token_id): Path<String>) -> Result<StatusCode> {
    require_role(&auth, Role::Root)?;
    state.tenant.revoke_invitation_token(&token_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Unauthenticated account registration ====================

pub fn register_routes() -> Router<AppState> {
    Router::new().route("/register/account", post(register_account))
}

#[derive(Deserialize)]
pub struct RegisterAccountBody {
    pub token: String,
    pub account_id: String,
    pub admin_user_id: String,
}

async fn register_account(
    State(state): State<AppState>,
    Json(body): Json<RegisterAccountBody>,
) -> Result<(StatusCode, Json<Value>)> {
    let issued = state.tenant.create_account_with_token(&body.token, &body.account_id, &body.admin_user_id).await?;
    Ok((StatusCode::CREATED, ok_json(json!({ "account_id": body.account_id, "api_key": issued.0 }))))
}

// ==================== System status / wait ====================

pub fn system_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/system/status", get(system_status))
        .route("/api/v1/system/wait", get(system_wait))
}

async fn system_status(State(state): State<AppState>, _auth: AuthContext) -> Json<Value> {
    let (body, _) = readiness_snapshot(&state).await;
    ok_json(json!({
        "readiness": body,
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "contexts": state.context_store.count(),
        "sessions": state.session_manager.count(),
    }))
}

#[derive(Deserialize)]
pub struct WaitParams {
    timeout_ms: Option<u64>,
}

/// Block until the service reports ready, or `timeout_ms` elapses
/// (default 3s). Intended for startup scripts, not a long poll.
async fn system_wait(State(state): State<AppState>, _auth: AuthContext, Query(p): Query<WaitParams>) -> Json<Value> {
    let timeout = std::time::Duration::from_millis(p.timeout_ms.unwrap_or(3000));
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let (_, healthy) = readiness_snapshot(&state).await;
        if healthy || tokio::time::Instant::now() >= deadline {
            return ok_json(json!({ "ready": healthy }));
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_match_supports_prefix_and_suffix_wildcards() {
        assert!(glob_match("viking://resources/*", "viking://resources/docs/readme"));
        assert!(glob_match("*readme", "viking://resources/docs/readme"));
        assert!(!glob_match("viking://agent/*", "viking://resources/docs/readme"));
    }

    #[test]
    fn glob_match_empty_pattern_matches_everything() {
        assert!(glob_match("", "viking://resources/x"));
    }

    #[test]
    fn glob_match_exact_pattern_requires_exact_match() {
        assert!(glob_match("viking://resources/x", "viking://resources/x"));
        assert!(!glob_match("viking://resources/x", "viking://resources/xy"));
    }
}
