use serde::{Deserialize, Serialize};

use crate::types::{Thread, Tier};

/// Speaker of a reconstructed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The person asking.
    User,
    /// The service answering.
    Assistant,
}

/// One prior turn sent as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who said it.
    pub role: ChatRole,
    /// What was said.
    pub content: String,
}

impl ChatTurn {
    /// Creates a new turn.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Whether an ask request reconstructs the conversation so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextMode {
    /// Send only the question; the service looks up context by chat id.
    QuestionOnly,
    /// Also send every prior turn followed by the new question.
    #[default]
    WithHistory,
}

/// Body of `POST /ask`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    /// Prior turns plus the new question, when context is included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatTurn>>,

    /// The question being asked.
    pub question: String,

    /// The conversation the question belongs to.
    #[serde(rename = "chatId")]
    pub chat_id: String,

    /// Requested tier.
    pub tier: Tier,
}

impl AskRequest {
    /// Builds the request for `question` asked in `thread`.
    ///
    /// `thread` must not yet contain the placeholder for `question`.
    pub fn build(
        thread: &Thread,
        question: &str,
        chat_id: &str,
        tier: Tier,
        context: ContextMode,
    ) -> Self {
        let messages = match context {
            ContextMode::QuestionOnly => None,
            ContextMode::WithHistory => {
                let mut turns = thread.turns();
                turns.push(ChatTurn::new(ChatRole::User, question));
                Some(turns)
            }
        };
        Self {
            messages,
            question: question.to_string(),
            chat_id: chat_id.to_string(),
            tier,
        }
    }
}

/// Body of `PUT /history/rename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRequest {
    /// The thread to rename.
    #[serde(rename = "chatId")]
    pub chat_id: String,

    /// The new title.
    #[serde(rename = "newTitle")]
    pub new_title: String,
}
