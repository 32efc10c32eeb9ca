use serde::{Deserialize, Serialize};

use crate::types::Tier;

/// One question/answer exchange inside a thread.
///
/// A message is created with an empty answer when the question is submitted
/// and receives its answer exactly once, when the exchange settles.  Whether
/// it settled is tracked separately from the answer text, so a legitimately
/// empty answer is not mistaken for a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The question as the user typed it.
    pub question: String,

    /// The answer text; empty until the exchange settles.
    #[serde(default)]
    pub answer: String,

    /// The conversation this message belongs to.
    #[serde(rename = "chatId", default)]
    pub chat_id: String,

    /// The tier the question was asked with.
    #[serde(default)]
    pub tier: Tier,

    /// Messages from the service are always answered.
    #[serde(skip, default = "settled")]
    answered: bool,
}

fn settled() -> bool {
    true
}

impl Message {
    /// Creates a placeholder message for a freshly submitted question.
    pub fn placeholder(question: impl Into<String>, chat_id: impl Into<String>, tier: Tier) -> Self {
        Self {
            question: question.into(),
            answer: String::new(),
            chat_id: chat_id.into(),
            tier,
            answered: false,
        }
    }

    /// Creates an already answered message.
    pub fn answered(
        question: impl Into<String>,
        answer: impl Into<String>,
        chat_id: impl Into<String>,
        tier: Tier,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            chat_id: chat_id.into(),
            tier,
            answered: true,
        }
    }

    /// Returns true while the message is still waiting for its answer.
    pub fn is_pending(&self) -> bool {
        !self.answered
    }

    /// Stores the final answer and marks the message settled.
    pub(crate) fn settle(&mut self, answer: String) {
        self.answer = answer;
        self.answered = true;
    }
}
