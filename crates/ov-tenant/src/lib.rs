//! Account/user/invitation-token management and API-key resolution.
//!
//! Port of `openviking/server/api_keys.py`'s `APIKeyManager`, generalized
//! from a single AGFS-backed store to this repo's [`ov_storage::VikingFS`].

pub mod accounts;
pub mod invitations;
pub mod manager;
pub mod users;

pub use invitations::InvitationToken;
pub use manager::{AccountSummary, IssuedKey, TenantManager, UserSummary};
