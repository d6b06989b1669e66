//! Multi-tenant identity: accounts, users, agents, and the role model.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Access role attached to a [`RequestContext`], ordered from least to most
/// privileged so `Role::Admin >= Role::User` etc. hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Root,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::OvError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "root" => Ok(Self::Root),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(crate::error::OvError::InvalidUri(format!("unknown role: {other}"))),
        }
    }
}

fn short_digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, p) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\0");
        }
        hasher.update(p.as_bytes());
    }
    let digest = hasher.finalize();
    // URL-safe, lower-hex, truncated: collision-resistant enough for a space
    // name within one account's namespace while staying path-friendly.
    digest.iter().take(16).map(|b| format!("{b:02x}")).collect()
}

/// `(account_id, user_id, agent_id)` — the stable identity triple.
///
/// `user_space_name`/`agent_space_name` are pure functions of `user_id` (and
/// `agent_id`); they deliberately never fold in `account_id` so that the same
/// person's space name is recognizable across accounts while still being
/// opaque to other tenants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentifier {
    pub account_id: String,
    pub user_id: String,
    pub agent_id: String,
}

impl UserIdentifier {
    pub fn new(
        account_id: impl Into<String>,
        user_id: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            user_id: user_id.into(),
            agent_id: agent_id.into(),
        }
    }

    /// Stable, account-agnostic space name derived from `user_id` alone.
    pub fn user_space_name(&self) -> String {
        short_digest(&[&self.user_id])
    }

    /// Stable, account-agnostic space name derived from `(user_id, agent_id)`.
    pub fn agent_space_name(&self) -> String {
        short_digest(&[&self.user_id, &self.agent_id])
    }

    /// `viking://agent/<agent_space>/memories`.
    pub fn memory_space_uri(&self) -> String {
        format!("viking://agent/{}/memories", self.agent_space_name())
    }

    /// `viking://agent/<agent_space>/workspaces`.
    pub fn work_space_uri(&self) -> String {
        format!("viking://agent/{}/workspaces", self.agent_space_name())
    }
}

/// The (user, role) pair threaded through every core operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub user: UserIdentifier,
    pub role: Role,
}

impl RequestContext {
    pub fn new(user: UserIdentifier, role: Role) -> Self {
        Self { user, role }
    }

    /// Build a ROOT context with no specific account binding.
    pub fn root() -> Self {
        Self {
            user: UserIdentifier::new("", "", ""),
            role: Role::Root,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.user.account_id
    }

    pub fn is_root(&self) -> bool {
        self.role == Role::Root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_space_name_stable_across_agent_and_account() {
        let a = UserIdentifier::new("acme", "alice", "agent-1");
        let b = UserIdentifier::new("other_co", "alice", "agent-2");
        assert_eq!(a.user_space_name(), b.user_space_name());
    }

    #[test]
    fn agent_space_name_stable_across_account() {
        let a = UserIdentifier::new("acme", "alice", "agent-1");
        let b = UserIdentifier::new("other_co", "alice", "agent-1");
        assert_eq!(a.agent_space_name(), b.agent_space_name());
    }

    #[test]
    fn agent_space_name_varies_with_agent_id() {
        let a = UserIdentifier::new("acme", "alice", "agent-1");
        let b = UserIdentifier::new("acme", "alice", "agent-2");
        assert_ne!(a.agent_space_name(), b.agent_space_name());
    }

    #[test]
    fn different_users_differ() {
        let a = UserIdentifier::new("acme", "alice", "");
        let b = UserIdentifier::new("acme", "bob", "");
        assert_ne!(a.user_space_name(), b.user_space_name());
    }

    #[test]
    fn memory_and_work_space_uris() {
        let u = UserIdentifier::new("acme", "alice", "agent-1");
        let space = u.agent_space_name();
        assert_eq!(u.memory_space_uri(), format!("viking://agent/{space}/memories"));
        assert_eq!(u.work_space_uri(), format!("viking://agent/{space}/workspaces"));
    }

    #[test]
    fn role_ordering() {
        assert!(Role::Root > Role::Admin);
        assert!(Role::Admin > Role::User);
    }

    #[test]
    fn role_roundtrip() {
        for r in [Role::Root, Role::Admin, Role::User] {
            let s = r.as_str();
            assert_eq!(s.parse::<Role>().unwrap(), r);
        }
    }

    #[test]
    fn role_invalid() {
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn request_context_root_helper() {
        let ctx = RequestContext::root();
        assert!(ctx.is_root());
        assert_eq!(ctx.account_id(), "");
    }
}
