//! Chat application module for interactive question/answer sessions.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! askstream engine. It supports:
//!
//! - Streaming answers with real-time display
//! - Several cached accounts with switching
//! - Browsing, renaming and deleting history threads
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: The session composing identity, history and the thread engine
//! - [`commands`]: Slash command parsing

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, ThreadRef, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use session::ChatSession;
