//! Annotation record types
//!
//! Records are serialized with the same camelCase field names the browser
//! extension has always written to local storage, so an existing export of
//! the `annotations` key loads unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::highlight::Color;

use super::error::StoreError;

/// A persisted annotation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Unique identifier, assigned by the store
    pub id: String,
    /// Highlight or note
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    /// The selected text, trimmed
    pub text: String,
    /// Free-text note (notes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Highlight color
    pub color: Color,
    /// Structural path of the first marker, when one was placed
    #[serde(rename = "xpath", default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    /// Full page URL at capture time
    pub url: String,
    /// Page title at capture time
    #[serde(default)]
    pub title: String,
    /// Capture timestamp
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Types of annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// Colored highlight only
    Highlight,
    /// Highlight with an attached note
    Note,
}

/// Page identity captured alongside a selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub url: String,
    pub title: String,
}

impl PageInfo {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// A record as submitted by a capture surface, before the store assigns
/// identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnnotation {
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub color: Color,
    #[serde(rename = "xpath", default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl NewAnnotation {
    /// Create a highlight draft
    pub fn highlight(text: &str, color: Color, locator: Option<String>, page: &PageInfo) -> Self {
        Self {
            annotation_type: AnnotationType::Highlight,
            text: text.to_string(),
            note: None,
            color,
            locator,
            url: page.url.clone(),
            title: page.title.clone(),
        }
    }

    /// Create a note draft
    pub fn note(
        text: &str,
        note: &str,
        color: Color,
        locator: Option<String>,
        page: &PageInfo,
    ) -> Self {
        Self {
            annotation_type: AnnotationType::Note,
            note: Some(note.to_string()),
            ..Self::highlight(text, color, locator, page)
        }
    }

    /// Trim text fields and check the record rules
    pub fn validate(mut self) -> Result<Self, StoreError> {
        self.text = self.text.trim().to_string();
        if self.text.is_empty() {
            return Err(StoreError::EmptyText);
        }

        self.note = self
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        match (self.annotation_type, &self.note) {
            (AnnotationType::Note, None) => Err(StoreError::MissingNote),
            (AnnotationType::Highlight, Some(_)) => Err(StoreError::NoteOnHighlight),
            _ => Ok(self),
        }
    }

    /// Stamp identity onto a validated draft
    pub(crate) fn into_record(self, id: String, created_at: DateTime<Utc>) -> AnnotationRecord {
        AnnotationRecord {
            id,
            annotation_type: self.annotation_type,
            text: self.text,
            note: self.note,
            color: self.color,
            locator: self.locator,
            url: self.url,
            title: self.title,
            created_at,
        }
    }
}

impl AnnotationRecord {
    pub fn has_note(&self) -> bool {
        self.note.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageInfo {
        PageInfo::new("https://example.com/article", "Example")
    }

    #[test]
    fn test_create_highlight() {
        let draft = NewAnnotation::highlight("  hello world \n", Color::Green, None, &page())
            .validate()
            .unwrap();

        assert_eq!(draft.annotation_type, AnnotationType::Highlight);
        assert_eq!(draft.text, "hello world");
        assert_eq!(draft.color, Color::Green);
        assert!(draft.note.is_none());
    }

    #[test]
    fn test_create_note() {
        let draft = NewAnnotation::note("quote", "  my thoughts ", Color::Blue, None, &page())
            .validate()
            .unwrap();

        assert_eq!(draft.annotation_type, AnnotationType::Note);
        assert_eq!(draft.note.as_deref(), Some("my thoughts"));
    }

    #[test]
    fn test_validate_rejects_bad_drafts() {
        let empty = NewAnnotation::highlight(" \t ", Color::Yellow, None, &page());
        assert!(matches!(empty.validate(), Err(StoreError::EmptyText)));

        let blank_note = NewAnnotation::note("text", "   ", Color::Yellow, None, &page());
        assert!(matches!(blank_note.validate(), Err(StoreError::MissingNote)));

        let mut highlight = NewAnnotation::highlight("text", Color::Yellow, None, &page());
        highlight.note = Some("stray".to_string());
        assert!(matches!(highlight.validate(), Err(StoreError::NoteOnHighlight)));
    }

    #[test]
    fn test_serialization() {
        let record = NewAnnotation::highlight(
            "hello",
            Color::Pink,
            Some("/html[1]/body[1]/span[1]".to_string()),
            &page(),
        )
        .into_record("abc".to_string(), Utc::now());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "highlight");
        assert_eq!(json["color"], "pink");
        assert_eq!(json["xpath"], "/html[1]/body[1]/span[1]");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("note").is_none());

        let parsed: AnnotationRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_draft_from_extension_message() {
        let draft: NewAnnotation = serde_json::from_value(serde_json::json!({
            "type": "note",
            "text": "selected",
            "note": "remember this",
            "color": "orange",
            "url": "https://example.com/",
            "title": "Example"
        }))
        .unwrap();

        assert_eq!(draft.annotation_type, AnnotationType::Note);
        assert_eq!(draft.color, Color::Orange);
        assert_eq!(draft.locator, None);
    }
}
