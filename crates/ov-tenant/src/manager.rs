//! Account/user/invitation-token manager. Port of
//! `openviking/server/api_keys.py`'s `APIKeyManager`, generalized from a
//! single AGFS client to this repo's [`VikingFS`] abstraction.
//!
//! Resolution is strictly sequential: (1) constant-time compare against the
//! configured root key, (2) in-memory key index lookup, (3) otherwise
//! `Unauthenticated`. The root key comparison uses `subtle` rather than `==`
//! — the teacher has no existing constant-time-compare dependency, so this
//! is grounded directly on the original source's `hmac.compare_digest` call.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use ov_core::error::{OvError, Result};
use ov_core::identity::{RequestContext, Role, UserIdentifier};
use ov_storage::VikingFS;
use rand::RngCore;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;

use crate::accounts::{AccountRecord, AccountsDocument, ACCOUNTS_PATH};
use crate::invitations::{InvitationToken, InvitationTokensDocument, INVITATION_TOKENS_PATH};
use crate::users::{UserKeyEntry, UserRecord, UsersDocument};

/// A freshly minted or regenerated user's API key, returned from the calls
/// that create one so a caller can hand it back to the user exactly once.
#[derive(Debug, Clone)]
pub struct IssuedKey(pub String);

#[derive(Debug, Clone, serde::Serialize)]
pub struct AccountSummary {
    pub account_id: String,
    pub created_at: chrono::DateTime<Utc>,
    pub user_count: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UserSummary {
    pub user_id: String,
    pub role: Role,
}

struct State {
    accounts: HashMap<String, AccountRecord>,
    users: HashMap<String, HashMap<String, UserRecord>>,
    user_keys: HashMap<String, UserKeyEntry>,
    invitation_tokens: HashMap<String, InvitationToken>,
}

pub struct TenantManager {
    root_key: String,
    vfs: Arc<VikingFS>,
    state: Mutex<State>,
}

fn random_hex_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl TenantManager {
    pub fn new(root_key: impl Into<String>, vfs: Arc<VikingFS>) -> Self {
        Self {
            root_key: root_key.into(),
            vfs,
            state: Mutex::new(State {
                accounts: HashMap::new(),
                users: HashMap::new(),
                user_keys: HashMap::new(),
                invitation_tokens: HashMap::new(),
            }),
        }
    }

    /// Load accounts, users, and invitation tokens from storage into memory.
    /// On first run (no `accounts.json` yet) creates a `default` account.
    pub async fn load(&self) -> Result<()> {
        let mut accounts_doc = self.read_accounts().await?;
        if accounts_doc.accounts.is_empty() && !self.vfs_has(ACCOUNTS_PATH).await {
            accounts_doc.accounts.insert("default".into(), AccountRecord { created_at: Utc::now() });
            self.write_accounts(&accounts_doc).await?;
        }

        let mut users: HashMap<String, HashMap<String, UserRecord>> = HashMap::new();
        let mut user_keys = HashMap::new();
        for account_id in accounts_doc.accounts.keys() {
            let doc = self.read_users(account_id).await?;
            for (user_id, record) in &doc.users {
                user_keys.insert(
                    record.key.clone(),
                    UserKeyEntry { account_id: account_id.clone(), user_id: user_id.clone(), role: record.role },
                );
            }
            users.insert(account_id.clone(), doc.users);
        }

        let invitation_tokens = self.read_invitations().await?.tokens;

        let mut state = self.state.lock().await;
        state.accounts = accounts_doc.accounts;
        state.users = users;
        state.user_keys = user_keys;
        state.invitation_tokens = invitation_tokens;

        tracing::info!(
            accounts = state.accounts.len(),
            user_keys = state.user_keys.len(),
            invitation_tokens = state.invitation_tokens.len(),
            "tenant manager loaded",
        );
        Ok(())
    }

    /// Resolve an API key to a [`RequestContext`]. The root key wins a
    /// constant-time comparison first; everything else falls through to the
    /// in-memory key index.
    pub async fn resolve(&self, api_key: &str) -> Result<RequestContext> {
        if api_key.is_empty() {
            return Err(OvError::Unauthenticated("missing API key".into()));
        }
        if bool::from(api_key.as_bytes().ct_eq(self.root_key.as_bytes())) {
            return Ok(RequestContext::root());
        }

        let state = self.state.lock().await;
        match state.user_keys.get(api_key) {
            Some(entry) => Ok(RequestContext::new(
                UserIdentifier::new(entry.account_id.clone(), entry.user_id.clone(), ""),
                entry.role,
            )),
            None => Err(OvError::Unauthenticated("invalid API key".into())),
        }
    }

    /// Create a new account with its first admin user. Returns the admin's key.
    pub async fn create_account(&self, account_id: &str, admin_user_id: &str) -> Result<IssuedKey> {
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(account_id) {
            return Err(OvError::AlreadyExists(format!("account {account_id}")));
        }

        let key = random_hex_key();
        state.accounts.insert(account_id.to_string(), AccountRecord { created_at: Utc::now() });
        let mut users = HashMap::new();
        users.insert(admin_user_id.to_string(), UserRecord { role: Role::Admin, key: key.clone() });
        state.users.insert(account_id.to_string(), users);
        state
            .user_keys
            .insert(key.clone(), UserKeyEntry { account_id: account_id.to_string(), user_id: admin_user_id.to_string(), role: Role::Admin });

        self.save_accounts(&state).await?;
        self.save_users(&state, account_id).await?;
        Ok(IssuedKey(key))
    }

    /// Delete an account and evict all its user keys. Storage/vector
    /// cleanup under the account's subtree is the caller's responsibility.
    pub async fn delete_account(&self, account_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.accounts.contains_key(account_id) {
            return Err(OvError::NotFound(format!("account {account_id}")));
        }
        state.accounts.remove(account_id);
        if let Some(users) = state.users.remove(account_id) {
            for record in users.values() {
                state.user_keys.remove(&record.key);
            }
        }
        self.save_accounts(&state).await
    }

    pub async fn register_user(&self, account_id: &str, user_id: &str, role: Role) -> Result<IssuedKey> {
        let mut state = self.state.lock().await;
        if !state.accounts.contains_key(account_id) {
            return Err(OvError::NotFound(format!("account {account_id}")));
        }
        let users = state.users.entry(account_id.to_string()).or_default();
        if users.contains_key(user_id) {
            return Err(OvError::AlreadyExists(format!("user {user_id}")));
        }

        let key = random_hex_key();
        users.insert(user_id.to_string(), UserRecord { role, key: key.clone() });
        state.user_keys.insert(key.clone(), UserKeyEntry { account_id: account_id.to_string(), user_id: user_id.to_string(), role });

        self.save_users(&state, account_id).await?;
        Ok(IssuedKey(key))
    }

    pub async fn remove_user(&self, account_id: &str, user_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let users = state.users.get_mut(account_id).ok_or_else(|| OvError::NotFound(format!("account {account_id}")))?;
        let record = users.remove(user_id).ok_or_else(|| OvError::NotFound(format!("user {user_id}")))?;
        state.user_keys.remove(&record.key);
        self.save_users(&state, account_id).await
    }

    pub async fn regenerate_key(&self, account_id: &str, user_id: &str) -> Result<IssuedKey> {
        let mut state = self.state.lock().await;
        let users = state.users.get_mut(account_id).ok_or_else(|| OvError::NotFound(format!("account {account_id}")))?;
        let record = users.get_mut(user_id).ok_or_else(|| OvError::NotFound(format!("user {user_id}")))?;
        let old_key = record.key.clone();
        let new_key = random_hex_key();
        record.key = new_key.clone();
        let role = record.role;

        state.user_keys.remove(&old_key);
        state.user_keys.insert(new_key.clone(), UserKeyEntry { account_id: account_id.to_string(), user_id: user_id.to_string(), role });

        self.save_users(&state, account_id).await?;
        Ok(IssuedKey(new_key))
    }

    pub async fn set_role(&self, account_id: &str, user_id: &str, role: Role) -> Result<()> {
        let mut state = self.state.lock().await;
        let users = state.users.get_mut(account_id).ok_or_else(|| OvError::NotFound(format!("account {account_id}")))?;
        let record = users.get_mut(user_id).ok_or_else(|| OvError::NotFound(format!("user {user_id}")))?;
        record.role = role;
        let key = record.key.clone();
        if let Some(entry) = state.user_keys.get_mut(&key) {
            entry.role = role;
        }
        self.save_users(&state, account_id).await
    }

    pub async fn get_accounts(&self) -> Vec<AccountSummary> {
        let state = self.state.lock().await;
        state
            .accounts
            .iter()
            .map(|(id, info)| AccountSummary {
                account_id: id.clone(),
                created_at: info.created_at,
                user_count: state.users.get(id).map(|u| u.len()).unwrap_or(0),
            })
            .collect()
    }

    pub async fn get_users(&self, account_id: &str) -> Result<Vec<UserSummary>> {
        let state = self.state.lock().await;
        let users = state.users.get(account_id).ok_or_else(|| OvError::NotFound(format!("account {account_id}")))?;
        Ok(users.iter().map(|(id, r)| UserSummary { user_id: id.clone(), role: r.role }).collect())
    }

    pub async fn create_invitation_token(
        &self,
        created_by: &str,
        max_uses: Option<u32>,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<(String, InvitationToken)> {
        let token_id = format!("inv_{}", random_hex_key().chars().take(32).collect::<String>());
        let token = InvitationToken { max_uses, used_count: 0, expires_at, created_at: Utc::now(), created_by: created_by.to_string() };

        let mut state = self.state.lock().await;
        state.invitation_tokens.insert(token_id.clone(), token.clone());
        self.save_invitations(&state).await?;
        Ok((token_id, token))
    }

    pub async fn list_invitation_tokens(&self) -> Vec<(String, InvitationToken)> {
        let state = self.state.lock().await;
        state.invitation_tokens.iter().map(|(id, t)| (id.clone(), t.clone())).collect()
    }

    pub async fn revoke_invitation_token(&self, token_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.invitation_tokens.remove(token_id).is_none() {
            return Err(OvError::NotFound(format!("invitation token {token_id}")));
        }
        self.save_invitations(&state).await
    }

    /// Redeem an invitation token to create an account, checking expiry
    /// then the usage cap before delegating to [`Self::create_account`].
    pub async fn create_account_with_token(&self, token_id: &str, account_id: &str, admin_user_id: &str) -> Result<IssuedKey> {
        {
            let state = self.state.lock().await;
            let token = state
                .invitation_tokens
                .get(token_id)
                .ok_or_else(|| OvError::InvalidArgument("invalid invitation token".into()))?;
            if token.is_expired(Utc::now()) {
                return Err(OvError::InvalidArgument("invitation token has expired".into()));
            }
            if token.is_exhausted() {
                return Err(OvError::InvalidArgument("invitation token has reached maximum uses".into()));
            }
        }

        let issued = self.create_account(account_id, admin_user_id).await?;

        let mut state = self.state.lock().await;
        if let Some(token) = state.invitation_tokens.get_mut(token_id) {
            token.used_count += 1;
        }
        self.save_invitations(&state).await?;
        Ok(issued)
    }

    async fn vfs_has(&self, uri: &str) -> bool {
        self.vfs.read(uri).await.is_ok()
    }

    async fn read_accounts(&self) -> Result<AccountsDocument> {
        match self.vfs.read_string(ACCOUNTS_PATH).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(_) => Ok(AccountsDocument::default()),
        }
    }

    async fn write_accounts(&self, doc: &AccountsDocument) -> Result<()> {
        self.vfs.write_string(ACCOUNTS_PATH, &serde_json::to_string_pretty(doc)?).await
    }

    async fn read_users(&self, account_id: &str) -> Result<UsersDocument> {
        match self.vfs.read_string(&crate::accounts::users_path(account_id)).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(_) => Ok(UsersDocument::default()),
        }
    }

    async fn read_invitations(&self) -> Result<InvitationTokensDocument> {
        match self.vfs.read_string(INVITATION_TOKENS_PATH).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(_) => Ok(InvitationTokensDocument::default()),
        }
    }

    async fn save_accounts(&self, state: &State) -> Result<()> {
        let doc = AccountsDocument { accounts: state.accounts.clone() };
        self.write_accounts(&doc).await
    }

    async fn save_users(&self, state: &State, account_id: &str) -> Result<()> {
        let users = state.users.get(account_id).cloned().unwrap_or_default();
        let doc = UsersDocument { users };
        self.vfs.write_string(&crate::accounts::users_path(account_id), &serde_json::to_string_pretty(&doc)?).await
    }

    async fn save_invitations(&self, state: &State) -> Result<()> {
        let doc = InvitationTokensDocument { tokens: state.invitation_tokens.clone() };
        self.vfs.write_string(INVITATION_TOKENS_PATH, &serde_json::to_string_pretty(&doc)?).await
    }
}
