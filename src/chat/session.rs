//! Core chat session management.
//!
//! This module provides the `ChatSession` struct, the process-wide session
//! that composes the identity cache, the history syncer and the thread
//! engine, and applies the cross-component reset rules: any identity change
//! empties the active thread, and destructive history operations keep the
//! active thread consistent with what is left on the service.

use std::sync::Arc;

use crate::backend::ChatBackend;
use crate::chat::commands::ThreadRef;
use crate::chat::config::ChatConfig;
use crate::engine::{AskOutcome, ThreadEngine};
use crate::history::{Confirm, HistorySyncer};
use crate::identity::{IdentityCache, IdentityChange};
use crate::render::Renderer;
use crate::store::SessionStore;
use crate::types::{Account, ContextMode, HistorySummary, Thread, Tier};
use crate::{Error, Result};

/// A chat session: who is asking, what they asked before, and the
/// conversation currently on screen.
pub struct ChatSession {
    identity: IdentityCache,
    history: HistorySyncer,
    engine: ThreadEngine,
}

impl ChatSession {
    /// Restores the identity cache from `store` and loads its history.
    ///
    /// A history fetch failure is logged and leaves the summaries empty.
    pub async fn open(
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn ChatBackend>,
        config: &ChatConfig,
    ) -> Result<Self> {
        let identity = IdentityCache::open(store)?;
        let history = HistorySyncer::new(backend.clone());
        let engine = ThreadEngine::new(backend)
            .with_tier(config.tier)
            .with_context(config.context);
        let mut session = Self {
            identity,
            history,
            engine,
        };
        session.refresh_history().await;
        Ok(session)
    }

    /// The identity cache.
    pub fn identity(&self) -> &IdentityCache {
        &self.identity
    }

    /// The active account, or `None` for a guest.
    pub fn active_account(&self) -> Option<&Account> {
        self.identity.active()
    }

    /// The active thread.
    pub fn thread(&self) -> &Thread {
        self.engine.thread()
    }

    /// The confirmed chat id of the active thread.
    pub fn chat_id(&self) -> Option<&str> {
        self.engine.chat_id()
    }

    /// The thread engine, for reading the live answer and phase.
    pub fn engine(&self) -> &ThreadEngine {
        &self.engine
    }

    /// The history summaries as they should be listed.
    pub fn summaries(&self) -> Vec<HistorySummary> {
        self.history.display()
    }

    /// True while an answer is streaming.
    pub fn is_loading(&self) -> bool {
        self.engine.is_loading()
    }

    /// Changes the tier used for new questions.
    pub fn set_tier(&mut self, tier: Tier) {
        self.engine.set_tier(tier);
    }

    /// Chooses whether earlier turns are sent with new questions.
    pub fn set_context(&mut self, context: ContextMode) {
        self.engine.set_context(context);
    }

    /// Asks `question` in the active thread as the active identity.
    pub async fn ask(&mut self, question: &str, renderer: &mut dyn Renderer) -> Result<AskOutcome> {
        let token = self.identity.token().map(str::to_owned);
        self.engine
            .ask(question, token.as_deref(), &mut self.history, renderer)
            .await
    }

    /// Reloads the history summaries of the active identity.
    pub async fn refresh_history(&mut self) -> bool {
        let token = self.identity.token().map(str::to_owned);
        self.history.refresh_summaries(token.as_deref()).await
    }

    /// Adds or refreshes `account`, makes it active and starts an empty thread.
    pub async fn login(&mut self, account: Account) -> Result<()> {
        let change = self.identity.login(account)?;
        self.apply_identity_change(change).await;
        Ok(())
    }

    /// Makes the cached account `email` active and starts an empty thread.
    pub async fn switch_account(&mut self, email: &str) -> Result<()> {
        let change = self.identity.switch_account(email)?;
        self.apply_identity_change(change).await;
        Ok(())
    }

    /// Removes the active account.
    ///
    /// Returns the account that became active, or `None` if the session is
    /// now a guest session.
    pub async fn logout(&mut self) -> Result<Option<Account>> {
        let change = self.identity.logout()?;
        let next = match &change {
            IdentityChange::Activated(account) => Some(account.clone()),
            IdentityChange::SignedOut => None,
        };
        self.apply_identity_change(change).await;
        Ok(next)
    }

    async fn apply_identity_change(&mut self, change: IdentityChange) {
        self.engine.new_conversation();
        self.history.clear_local();
        if let IdentityChange::Activated(account) = change {
            self.history.refresh_summaries(Some(&account.token)).await;
        }
    }

    /// Abandons the active thread and starts an empty one.
    pub fn new_conversation(&mut self) {
        self.engine.new_conversation();
    }

    /// Resolves a user-typed reference against the listed summaries.
    pub fn resolve(&self, thread: &ThreadRef) -> Result<String> {
        match thread {
            ThreadRef::ChatId(id) => Ok(id.clone()),
            ThreadRef::Position(n) => {
                let listed = self.history.display();
                let summary = n
                    .checked_sub(1)
                    .and_then(|i| listed.get(i))
                    .ok_or_else(|| {
                        Error::validation(
                            format!("no history entry #{n}"),
                            Some("thread".to_string()),
                        )
                    })?;
                summary.chat_id().map(str::to_owned).ok_or_else(|| {
                    Error::validation(
                        format!("history entry #{n} has no chat id"),
                        Some("thread".to_string()),
                    )
                })
            }
        }
    }

    /// Opens a thread from history and makes it the active thread.
    pub async fn open_thread(&mut self, chat_id: &str) -> Result<()> {
        let token = self.identity.token().map(str::to_owned);
        self.engine
            .open_thread(&self.history, token.as_deref(), chat_id)
            .await
    }

    /// Renames a thread; a blank title is ignored and returns `Ok(false)`.
    pub async fn rename_thread(&mut self, chat_id: &str, new_title: &str) -> Result<bool> {
        let token = self.identity.token().map(str::to_owned);
        self.history
            .rename_thread(token.as_deref(), chat_id, new_title)
            .await
    }

    /// Deletes a thread after confirmation.
    ///
    /// Deleting the active thread also resets it.
    pub async fn delete_thread(&mut self, chat_id: &str, confirm: &mut dyn Confirm) -> Result<bool> {
        let token = self.identity.token().map(str::to_owned);
        let deleted = self
            .history
            .delete_thread(token.as_deref(), chat_id, confirm)
            .await?;
        if deleted && self.engine.chat_id() == Some(chat_id) {
            self.engine.new_conversation();
        }
        Ok(deleted)
    }

    /// Deletes all history after confirmation and resets the active thread.
    pub async fn clear_all_history(&mut self, confirm: &mut dyn Confirm) -> bool {
        let token = self.identity.token().map(str::to_owned);
        let cleared = self
            .history
            .clear_all_history(token.as_deref(), confirm)
            .await;
        if cleared {
            self.engine.new_conversation();
        }
        cleared
    }
}
