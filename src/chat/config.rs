//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::types::{ContextMode, Tier};

/// Default whole-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// File name of the session store inside the home directory.
const SESSION_FILE: &str = ".askstream/session.json";

/// Command-line arguments for the askstream-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the question/answer service.
    #[arrrg(optional, "Service base URL (default: $ASKSTREAM_BASE_URL or http://localhost:8000/api/v1/)", "URL")]
    pub base_url: Option<String>,

    /// Tier to ask with.
    #[arrrg(optional, "Answer tier: free or pro (default: free)", "TIER")]
    pub tier: Option<String>,

    /// Where to persist accounts.
    #[arrrg(optional, "Session file (default: ~/.askstream/session.json)", "PATH")]
    pub store: Option<String>,

    /// Send only the question, never the earlier turns.
    #[arrrg(flag, "Do not send earlier turns with each question")]
    pub no_context: bool,

    /// Request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Service base URL; `None` defers to the environment and then the default.
    pub base_url: Option<String>,

    /// Tier for new questions.
    pub tier: Tier,

    /// Whether prior turns are sent with new questions.
    pub context: ContextMode,

    /// Path of the JSON session file.
    pub store_path: PathBuf,

    /// Request timeout.
    pub timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Tier: free
    /// - Context: full history
    /// - Timeout: 60 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: None,
            tier: Tier::default(),
            context: ContextMode::default(),
            store_path: default_store_path(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            use_color: true,
        }
    }

    /// Sets the service base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the tier.
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    /// Sets the context mode.
    pub fn with_context(mut self, context: ContextMode) -> Self {
        self.context = context;
        self
    }

    /// Sets the session file.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let tier = args
            .tier
            .map(|s| {
                s.parse::<Tier>().unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "falling back to the free tier");
                    Tier::Free
                })
            })
            .unwrap_or_default();
        let context = if args.no_context {
            ContextMode::QuestionOnly
        } else {
            ContextMode::WithHistory
        };

        ChatConfig {
            base_url: args.base_url,
            tier,
            context,
            store_path: args.store.map(PathBuf::from).unwrap_or_else(default_store_path),
            timeout: Duration::from_secs(args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            use_color: !args.no_color,
        }
    }
}

/// `$HOME/.askstream/session.json`, or a file in the working directory
/// when no home directory is known.
fn default_store_path() -> PathBuf {
    match env::var_os("HOME").filter(|h| !h.is_empty()) {
        Some(home) => PathBuf::from(home).join(SESSION_FILE),
        None => PathBuf::from(".askstream-session.json"),
    }
}
