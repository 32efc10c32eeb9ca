//! The multi-account identity cache.
//!
//! Several authenticated accounts can be held locally at once; exactly one of
//! them (or none, for a guest) is active and lends its token to outgoing
//! requests.  Every change is written through to a [`SessionStore`] before it
//! becomes visible in memory.

use std::sync::Arc;

use crate::observability::IDENTITY_SWITCHES;
use crate::store::SessionStore;
use crate::types::{Account, PersistedSession};
use crate::{Error, Result};

/// What a login, switch or logout left the session as.
///
/// Both outcomes require the caller to reset the active thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityChange {
    /// `Account` is now the active identity.
    Activated(Account),
    /// The last account was removed; the session is a guest session.
    SignedOut,
}

/// Locally cached accounts plus the active pointer.
///
/// Invariants: no two cached accounts share an email, and the active account,
/// if any, is one of the cached accounts.
pub struct IdentityCache {
    store: Arc<dyn SessionStore>,
    accounts: Vec<Account>,
    active: Option<String>,
}

impl IdentityCache {
    /// Restores the cache from `store`, repairing inconsistent state.
    pub fn open(store: Arc<dyn SessionStore>) -> Result<Self> {
        let persisted = store.load()?.unwrap_or_default();
        let (accounts, active) = reconcile(&persisted);
        let cache = Self {
            store,
            accounts,
            active,
        };
        let canonical = cache.persisted_form(&cache.accounts, cache.active.as_deref());
        if canonical != persisted && !persisted.is_empty() {
            tracing::warn!("stored session was inconsistent; rewriting it");
            cache.store.save(&canonical)?;
        }
        Ok(cache)
    }

    /// Every cached account, in insertion order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// The active account, or `None` for a guest.
    pub fn active(&self) -> Option<&Account> {
        let email = self.active.as_deref()?;
        self.accounts.iter().find(|a| a.email == email)
    }

    /// The bearer token of the active account.
    pub fn token(&self) -> Option<&str> {
        self.active().map(|a| a.token.as_str())
    }

    /// Returns true if some account is active.
    pub fn is_authenticated(&self) -> bool {
        self.active.is_some()
    }

    /// Cached accounts other than the active one.
    pub fn other_accounts(&self) -> impl Iterator<Item = &Account> {
        let active = self.active.as_deref();
        self.accounts
            .iter()
            .filter(move |a| Some(a.email.as_str()) != active)
    }

    /// Adds or replaces `account` and makes it active.
    pub fn login(&mut self, account: Account) -> Result<IdentityChange> {
        if account.email.trim().is_empty() {
            return Err(Error::validation(
                "account email must not be empty",
                Some("email".to_string()),
            ));
        }
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|a| a.email != account.email)
            .cloned()
            .collect();
        accounts.push(account.clone());
        self.commit(accounts, Some(account.email.clone()))?;
        tracing::info!(email = %account.email, "logged in");
        Ok(IdentityChange::Activated(account))
    }

    /// Makes an already cached account active without touching the cache set.
    pub fn switch_account(&mut self, email: &str) -> Result<IdentityChange> {
        let Some(account) = self.accounts.iter().find(|a| a.email == email).cloned() else {
            return Err(Error::validation(
                format!("no cached account for {email}"),
                Some("email".to_string()),
            ));
        };
        self.commit(self.accounts.clone(), Some(account.email.clone()))?;
        tracing::info!(email = %account.email, "switched account");
        Ok(IdentityChange::Activated(account))
    }

    /// Removes the active account.
    ///
    /// The first remaining account becomes active; when none remain, all
    /// persisted state is cleared and the session reverts to guest.
    pub fn logout(&mut self) -> Result<IdentityChange> {
        let remaining: Vec<Account> = match self.active.as_deref() {
            Some(email) => self
                .accounts
                .iter()
                .filter(|a| a.email != email)
                .cloned()
                .collect(),
            None => self.accounts.clone(),
        };

        match remaining.first().cloned() {
            Some(next) => {
                self.commit(remaining, Some(next.email.clone()))?;
                tracing::info!(email = %next.email, "logged out; switched to next account");
                Ok(IdentityChange::Activated(next))
            }
            None => {
                self.store.clear()?;
                self.accounts.clear();
                self.active = None;
                IDENTITY_SWITCHES.click();
                tracing::info!("logged out; now a guest");
                Ok(IdentityChange::SignedOut)
            }
        }
    }

    /// Writes the new state through to the store, then adopts it.
    fn commit(&mut self, accounts: Vec<Account>, active: Option<String>) -> Result<()> {
        let persisted = self.persisted_form(&accounts, active.as_deref());
        self.store.save(&persisted)?;
        self.accounts = accounts;
        self.active = active;
        IDENTITY_SWITCHES.click();
        Ok(())
    }

    fn persisted_form(&self, accounts: &[Account], active: Option<&str>) -> PersistedSession {
        let user = active.and_then(|email| accounts.iter().find(|a| a.email == email).cloned());
        PersistedSession::new(accounts.to_vec(), user)
    }
}

/// Derive a consistent cache from whatever was stored.
fn reconcile(persisted: &PersistedSession) -> (Vec<Account>, Option<String>) {
    let mut accounts: Vec<Account> = Vec::new();
    for account in &persisted.accounts {
        accounts.retain(|a| a.email != account.email);
        accounts.push(account.clone());
    }

    let active = match &persisted.user {
        Some(user) if accounts.iter().any(|a| a.email == user.email) => Some(user.email.clone()),
        Some(user) => {
            accounts.push(user.clone());
            Some(user.email.clone())
        }
        None => accounts.first().map(|a| a.email.clone()),
    };
    (accounts, active)
}
