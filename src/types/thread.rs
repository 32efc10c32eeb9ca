use crate::types::{ChatRole, ChatTurn, Message};
use crate::{Error, Result};

/// The ordered messages of one conversation.
///
/// Messages are appended in chronological order.  Answers are committed by
/// index rather than by mutating "the last message", and every mutation bumps
/// [`Thread::version`], so a settle that races with a newer mutation can be
/// detected by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Thread {
    messages: Vec<Message>,
    version: u64,
}

impl Thread {
    /// Creates an empty thread.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a thread from messages fetched from the service.
    ///
    /// Every loaded message counts as answered.
    pub fn from_messages(mut messages: Vec<Message>) -> Self {
        for message in &mut messages {
            if message.is_pending() {
                let answer = std::mem::take(&mut message.answer);
                message.settle(answer);
            }
        }
        Self {
            messages,
            version: 0,
        }
    }

    /// Returns the messages in chronological order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the thread has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the mutation counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Appends a message and returns its index.
    pub fn push(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.version += 1;
        self.messages.len() - 1
    }

    /// Commits the final answer of the message at `index`.
    ///
    /// A message is answered at most once; committing into an already
    /// answered message is refused.
    pub fn commit(&mut self, index: usize, answer: impl Into<String>) -> Result<()> {
        let Some(message) = self.messages.get_mut(index) else {
            return Err(Error::validation(
                format!("no message at index {index}"),
                Some("index".to_string()),
            ));
        };
        if !message.is_pending() {
            return Err(Error::validation(
                format!("message {index} already has an answer"),
                Some("index".to_string()),
            ));
        }
        message.settle(answer.into());
        self.version += 1;
        Ok(())
    }

    /// Rebuilds prior turns as alternating user/assistant entries.
    pub fn turns(&self) -> Vec<ChatTurn> {
        self.messages
            .iter()
            .flat_map(|message| {
                [
                    ChatTurn::new(ChatRole::User, message.question.clone()),
                    ChatTurn::new(ChatRole::Assistant, message.answer.clone()),
                ]
            })
            .collect()
    }
}
