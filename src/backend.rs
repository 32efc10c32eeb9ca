//! The remote question/answer service as seen by the session engine.
//!
//! [`ChatBackend`] is the seam between the engine and the network.  The
//! production implementation is [`crate::Client`]; tests substitute an
//! in-memory fake.

use std::pin::Pin;

use futures::Stream;

use crate::Result;
use crate::types::{AskRequest, HistorySummary, Message, RenameRequest};

/// Ordered, forward-only stream of answer deltas for one exchange.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Operations the session engine needs from the service.
///
/// Every method that takes a `token` requires an authenticated identity;
/// [`ChatBackend::ask`] also works for guests.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// `GET /history`: every summary stored for the identity, in server order.
    async fn history(&self, token: &str) -> Result<Vec<HistorySummary>>;

    /// `GET /history/{chatId}`: the full message sequence of one thread.
    async fn thread(&self, token: &str, chat_id: &str) -> Result<Vec<Message>>;

    /// `POST /ask`: submit a question and stream back the answer.
    async fn ask(&self, token: Option<&str>, request: &AskRequest) -> Result<DeltaStream>;

    /// `DELETE /history`: remove every thread of the identity.
    async fn clear_history(&self, token: &str) -> Result<()>;

    /// `PUT /history/rename`: change the title of one thread.
    async fn rename_thread(&self, token: &str, request: &RenameRequest) -> Result<()>;

    /// `DELETE /history/{chatId}`: remove one thread.
    async fn delete_thread(&self, token: &str, chat_id: &str) -> Result<()>;
}
