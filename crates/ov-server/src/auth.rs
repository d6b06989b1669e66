//! Auth extractor: resolves an API key off the request into a
//! [`RequestContext`] handlers consume instead of reading identity state
//! directly. Accepts `Authorization: Bearer <key>` or `X-API-Key`.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use ov_core::identity::{Role, RequestContext};

use crate::error::ApiError;
use crate::state::AppState;

const API_KEY_HEADER: &str = "x-api-key";

/// The resolved caller, injected by extraction. `Deref`s to the inner
/// [`RequestContext`] so handlers can use it like one.
pub struct AuthContext(pub RequestContext);

impl std::ops::Deref for AuthContext {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let key = extract_api_key(parts)?;
        let rc = state.tenant.resolve(&key).await?;
        Ok(AuthContext(rc))
    }
}

fn extract_api_key(parts: &Parts) -> Result<String, ApiError> {
    if let Some(value) = parts.headers.get(AUTHORIZATION) {
        if let Ok(s) = value.to_str() {
            if let Some(rest) = s.strip_prefix("Bearer ") {
                return Ok(rest.trim().to_string());
            }
        }
    }
    if let Some(value) = parts.headers.get(API_KEY_HEADER) {
        if let Ok(s) = value.to_str() {
            return Ok(s.trim().to_string());
        }
    }
    Err(ApiError::unauthenticated("missing Authorization or X-API-Key header"))
}

/// Require at least `min` role, rejecting otherwise.
pub fn require_role(auth: &AuthContext, min: Role) -> Result<(), ApiError> {
    if auth.0.role >= min {
        Ok(())
    } else {
        Err(ApiError::permission_denied(format!("requires {min} role or higher")))
    }
}

/// Require ROOT, or ADMIN scoped to their own `account_id`.
pub fn require_root_or_own_account(auth: &AuthContext, account_id: &str) -> Result<(), ApiError> {
    if auth.0.is_root() {
        return Ok(());
    }
    if auth.0.role >= Role::Admin && auth.0.account_id() == account_id {
        return Ok(());
    }
    Err(ApiError::permission_denied("requires root, or admin scoped to their own account"))
}
