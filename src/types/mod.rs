// Public modules
pub mod account;
pub mod ask_request;
pub mod history_summary;
pub mod message;
pub mod persisted_session;
pub mod thread;
pub mod tier;

// Re-exports
pub use account::Account;
pub use ask_request::{AskRequest, ChatRole, ChatTurn, ContextMode, RenameRequest};
pub use history_summary::{HistorySummary, dedup_summaries};
pub use message::Message;
pub use persisted_session::PersistedSession;
pub use thread::Thread;
pub use tier::Tier;
