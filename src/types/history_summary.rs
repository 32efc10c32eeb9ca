use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A displayable reference to a stored thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    /// The conversation id; some legacy entries carry none.
    #[serde(rename = "chatId", default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,

    /// The title shown in the history list.
    #[serde(rename = "displayQuestion", default)]
    pub display_question: String,
}

impl HistorySummary {
    /// Creates a new summary.
    pub fn new(chat_id: impl Into<String>, display_question: impl Into<String>) -> Self {
        Self {
            chat_id: Some(chat_id.into()),
            display_question: display_question.into(),
        }
    }

    /// Creates a summary without a chat id.
    pub fn untracked(display_question: impl Into<String>) -> Self {
        Self {
            chat_id: None,
            display_question: display_question.into(),
        }
    }

    /// Returns the chat id when it is present and non-empty.
    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Collapses summaries to one entry per chat id.
///
/// Order is preserved and the first occurrence of each chat id wins.  Entries
/// without a chat id are never treated as duplicates and are always kept.
pub fn dedup_summaries(summaries: &[HistorySummary]) -> Vec<HistorySummary> {
    let mut seen = HashSet::new();
    summaries
        .iter()
        .filter(|summary| match summary.chat_id() {
            Some(id) => seen.insert(id),
            None => true,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_occurrence_wins() {
        let summaries = vec![
            HistorySummary::new("a", "first a"),
            HistorySummary::new("b", "first b"),
            HistorySummary::new("a", "second a"),
            HistorySummary::new("b", "second b"),
        ];
        let view = dedup_summaries(&summaries);
        assert_eq!(
            view,
            vec![
                HistorySummary::new("a", "first a"),
                HistorySummary::new("b", "first b"),
            ]
        );
    }

    #[test]
    fn entries_without_chat_id_are_kept() {
        let summaries = vec![
            HistorySummary::untracked("x"),
            HistorySummary::new("a", "a"),
            HistorySummary::untracked("x"),
            HistorySummary {
                chat_id: Some(String::new()),
                display_question: "empty id".to_string(),
            },
            HistorySummary::new("a", "again"),
        ];
        let view = dedup_summaries(&summaries);
        assert_eq!(view.len(), 4);
        assert_eq!(view[0], HistorySummary::untracked("x"));
        assert_eq!(view[1], HistorySummary::new("a", "a"));
        assert_eq!(view[2], HistorySummary::untracked("x"));
        assert_eq!(view[3].display_question, "empty id");
    }

    #[test]
    fn summary_wire_format() {
        let summary: HistorySummary =
            serde_json::from_value(json!({"chatId": "c1", "displayQuestion": "Title"})).unwrap();
        assert_eq!(summary, HistorySummary::new("c1", "Title"));

        let legacy: HistorySummary = serde_json::from_value(json!({"displayQuestion": "Old"})).unwrap();
        assert_eq!(legacy.chat_id(), None);
    }
}
