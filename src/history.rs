//! The per-identity history summary cache.
//!
//! The authoritative list lives on the service.  The syncer keeps the last
//! list it fetched and always replaces it wholesale; mutations are followed by
//! a full refetch instead of a local patch.  Fetch failures are logged and
//! leave the cache at its last known good value.

use std::sync::Arc;

use crate::backend::ChatBackend;
use crate::observability::{HISTORY_REFRESH_FAILURES, HISTORY_REFRESHES};
use crate::types::{HistorySummary, Message, RenameRequest, dedup_summaries};
use crate::{Error, Result};

/// Asks the user to approve a destructive action.
pub trait Confirm {
    /// Returns true if the user approved `prompt`.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Prompt shown before deleting one thread.
pub const DELETE_THREAD_PROMPT: &str = "Delete this chat thread?";
/// Prompt shown before deleting every thread.
pub const CLEAR_HISTORY_PROMPT: &str = "Delete all history?";

/// Fetches and mutates the remote summary list for the active identity.
pub struct HistorySyncer {
    backend: Arc<dyn ChatBackend>,
    summaries: Vec<HistorySummary>,
}

impl HistorySyncer {
    /// Creates a syncer with an empty cache.
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            summaries: Vec::new(),
        }
    }

    /// The cached summaries exactly as the service returned them.
    pub fn summaries(&self) -> &[HistorySummary] {
        &self.summaries
    }

    /// The cached summaries de-duplicated for display.
    pub fn display(&self) -> Vec<HistorySummary> {
        dedup_summaries(&self.summaries)
    }

    /// Drops the local cache without contacting the service.
    pub fn clear_local(&mut self) {
        self.summaries.clear();
    }

    /// Replaces the cache with the service's current list.
    ///
    /// Does nothing for a guest.  Returns true if the cache was replaced.
    pub async fn refresh_summaries(&mut self, token: Option<&str>) -> bool {
        let Some(token) = token else {
            return false;
        };
        HISTORY_REFRESHES.click();
        match self.backend.history(token).await {
            Ok(summaries) => {
                self.summaries = summaries;
                true
            }
            Err(err) => {
                HISTORY_REFRESH_FAILURES.click();
                tracing::warn!(error = %err, "history refresh failed; keeping cached summaries");
                false
            }
        }
    }

    /// Fetches the full message sequence of `chat_id`.
    pub async fn load_thread(&self, token: Option<&str>, chat_id: &str) -> Result<Vec<Message>> {
        let token = require_token(token)?;
        self.backend.thread(token, chat_id).await
    }

    /// Renames a thread, then reloads the summaries.
    ///
    /// A title that is empty after trimming is rejected silently: nothing is
    /// sent and `Ok(false)` is returned.
    pub async fn rename_thread(
        &mut self,
        token: Option<&str>,
        chat_id: &str,
        new_title: &str,
    ) -> Result<bool> {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return Ok(false);
        }
        let token = require_token(token)?;
        let request = RenameRequest {
            chat_id: chat_id.to_string(),
            new_title: new_title.to_string(),
        };
        self.backend.rename_thread(token, &request).await?;
        self.refresh_summaries(Some(token)).await;
        Ok(true)
    }

    /// Deletes a thread after confirmation, then reloads the summaries.
    ///
    /// Returns `Ok(false)` if the user declined.
    pub async fn delete_thread(
        &mut self,
        token: Option<&str>,
        chat_id: &str,
        confirm: &mut dyn Confirm,
    ) -> Result<bool> {
        if !confirm.confirm(DELETE_THREAD_PROMPT) {
            return Ok(false);
        }
        let token = require_token(token)?;
        self.backend.delete_thread(token, chat_id).await?;
        self.refresh_summaries(Some(token)).await;
        Ok(true)
    }

    /// Deletes every thread after confirmation and empties the cache.
    ///
    /// The bulk delete is only sent when authenticated; the local cache is
    /// cleared either way once the user confirmed.  Returns false if the user
    /// declined.
    pub async fn clear_all_history(
        &mut self,
        token: Option<&str>,
        confirm: &mut dyn Confirm,
    ) -> bool {
        if !confirm.confirm(CLEAR_HISTORY_PROMPT) {
            return false;
        }
        if let Some(token) = token
            && let Err(err) = self.backend.clear_history(token).await
        {
            tracing::warn!(error = %err, "bulk history delete failed");
        }
        self.summaries.clear();
        true
    }
}

fn require_token(token: Option<&str>) -> Result<&str> {
    token.ok_or_else(|| Error::authentication("this operation requires a signed-in account"))
}
