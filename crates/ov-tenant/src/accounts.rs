//! On-disk shape of `/local/_system/accounts.json`: the global account list.
//! Port of `openviking/server/api_keys.py`'s `AccountInfo`/accounts document.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ACCOUNTS_PATH: &str = "/local/_system/accounts.json";

pub fn users_path(account_id: &str) -> String {
    format!("/local/{account_id}/_system/users.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountsDocument {
    #[serde(default)]
    pub accounts: HashMap<String, AccountRecord>,
}
