//! On-disk shape of `/local/_system/invitation_tokens.json` and the token
//! lifecycle rules: monotone `used_count`, expiry checked only on use.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const INVITATION_TOKENS_PATH: &str = "/local/_system/invitation_tokens.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationToken {
    pub max_uses: Option<u32>,
    pub used_count: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl InvitationToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|e| now > e).unwrap_or(false)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_uses.map(|m| self.used_count >= m).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvitationTokensDocument {
    #[serde(default)]
    pub tokens: HashMap<String, InvitationToken>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(max_uses: Option<u32>, used: u32, expires_at: Option<DateTime<Utc>>) -> InvitationToken {
        InvitationToken { max_uses, used_count: used, expires_at, created_at: Utc::now(), created_by: "root".into() }
    }

    #[test]
    fn unlimited_token_never_exhausts() {
        assert!(!token(None, 1_000_000, None).is_exhausted());
    }

    #[test]
    fn capped_token_exhausts_at_limit() {
        assert!(token(Some(3), 3, None).is_exhausted());
        assert!(!token(Some(3), 2, None).is_exhausted());
    }

    #[test]
    fn expiry_is_checked_against_the_given_instant() {
        let now = Utc::now();
        assert!(token(None, 0, Some(now - Duration::days(1))).is_expired(now));
        assert!(!token(None, 0, Some(now + Duration::days(1))).is_expired(now));
    }

    #[test]
    fn no_expiry_never_expires() {
        assert!(!token(None, 0, None).is_expired(Utc::now()));
    }
}
