//! On-disk shape of `/local/<account_id>/_system/users.json`: one account's
//! user registry, `{user_id: {role, key}}`.

use std::collections::HashMap;

use ov_core::identity::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub role: Role,
    pub key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersDocument {
    #[serde(default)]
    pub users: HashMap<String, UserRecord>,
}

/// In-memory `key -> (account_id, user_id, role)` index entry, rebuilt from
/// every account's [`UsersDocument`] on startup.
#[derive(Debug, Clone)]
pub struct UserKeyEntry {
    pub account_id: String,
    pub user_id: String,
    pub role: Role,
}
