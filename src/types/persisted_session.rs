use serde::{Deserialize, Serialize};

use crate::types::Account;

/// The identity state written to local storage.
///
/// The three fields mirror the `token`, `user` and `accounts` keys and must
/// agree with each other: whenever `accounts` is non-empty, `user` is one of
/// them and `token` is that user's token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// Bearer token of the active account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// The active account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Account>,

    /// Every cached account in insertion order.
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl PersistedSession {
    /// Builds the persisted form of a cache with `active` selected.
    pub fn new(accounts: Vec<Account>, active: Option<Account>) -> Self {
        Self {
            token: active.as_ref().map(|account| account.token.clone()),
            user: active,
            accounts,
        }
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none() && self.accounts.is_empty()
    }
}
