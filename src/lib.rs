// Public modules
pub mod backend;
pub mod chat;
pub mod client;
pub mod engine;
pub mod error;
pub mod history;
pub mod identity;
pub mod observability;
pub mod render;
pub mod sse;
pub mod store;
pub mod types;

// Re-exports
pub use backend::{ChatBackend, DeltaStream};
pub use client::Client;
pub use engine::{AskOutcome, ERROR_NOTICE, Exchange, Phase, ThreadEngine};
pub use error::{Error, Result};
pub use history::{Confirm, HistorySyncer};
pub use identity::{IdentityCache, IdentityChange};
pub use observability::register_biometrics;
pub use render::{NullRenderer, PlainTextRenderer, Renderer};
pub use sse::{StreamDecoder, process_sse};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use types::*;
