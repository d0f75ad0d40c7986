//! The persisted note model and note search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pinnote_editor_core::Document;

use crate::reminder::Reminder;

/// One sticky note as stored on disk. `content` is the editor's markup
/// string; everything else is presentation and bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content: String,
    pub background_color: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

impl Note {
    pub fn new(id: impl Into<String>, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            background_color: "#fff9c4".to_string(),
            created: now,
            updated: now,
            reminders: Vec::new(),
        }
    }

    /// Tag-stripped plain text of the note, for search and previews.
    pub fn plain_text(&self) -> String {
        match Document::from_markup(&self.content) {
            Ok(doc) => doc.text_content(),
            Err(_) => self.content.clone(),
        }
    }

    /// The note's first line, used as its display title.
    pub fn title(&self) -> String {
        self.plain_text()
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    pub fn matches(&self, query: &str) -> bool {
        self.plain_text()
            .to_lowercase()
            .contains(&query.to_lowercase())
    }
}

/// Case-insensitive substring search over note text.
pub fn search<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    let query = query.trim();
    if query.is_empty() {
        return notes.iter().collect();
    }
    notes.iter().filter(|n| n.matches(query)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn note(id: &str, content: &str) -> Note {
        Note::new(id, content, Utc::now())
    }

    #[test]
    fn test_plain_text_strips_tags() {
        let n = note("1", "<h1>Groceries</h1><p>buy <strong>milk</strong></p>");
        assert_eq!(n.plain_text(), "Groceries\nbuy milk");
        assert_eq!(n.title(), "Groceries");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let notes = vec![
            note("1", "<p>Buy MILK</p>"),
            note("2", "<p>call dentist</p>"),
        ];
        let hits = search(&notes, "milk");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
    }

    #[test]
    fn test_search_ignores_markup() {
        let notes = vec![note("1", "<p>plain</p>")];
        // Tag names never match.
        assert!(search(&notes, "strong").is_empty());
        let notes = vec![note("2", "<p>a <strong>strong</strong> word</p>")];
        assert_eq!(search(&notes, "strong").len(), 1);
    }

    #[test]
    fn test_empty_query_returns_all() {
        let notes = vec![note("1", "<p>a</p>"), note("2", "<p>b</p>")];
        assert_eq!(search(&notes, "  ").len(), 2);
    }

    #[test]
    fn test_serde_camel_case_fields() {
        let n = note("abc", "<p>x</p>");
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("\"backgroundColor\""));
        assert!(json.contains("\"created\""));
        assert!(json.contains("\"reminders\""));
        let back: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(back, n);
    }

    #[test]
    fn test_missing_reminders_defaults_empty() {
        let json = r##"{
            "id": "1",
            "content": "<p>x</p>",
            "backgroundColor": "#fff",
            "created": "2026-08-25T10:00:00Z",
            "updated": "2026-08-25T10:00:00Z"
        }"##;
        let n: Note = serde_json::from_str(json).unwrap();
        assert!(n.reminders.is_empty());
    }
}
