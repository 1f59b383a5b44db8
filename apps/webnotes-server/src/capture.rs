//! Capture flow
//!
//! Turns user commands into annotation drafts. A [`CaptureSession`] carries
//! the per-page state (current color, page identity); every command reads
//! the selection at the moment it is handled.
//!
//! [`PageAgent`] ties a session to a [`ServiceClient`] so captured drafts are
//! sent to the service that owns the store.

use serde::{Deserialize, Serialize};

use crate::annotations::{AnnotationRecord, NewAnnotation, PageInfo};
use crate::dom::{DomTree, Range, Selection};
use crate::highlight::{highlight, Color, HighlightOutcome};
use crate::service::bus::ServiceClient;

/// Context menu entry that highlights in yellow
pub const MENU_HIGHLIGHT: &str = "webnotes-highlight";
/// Context menu entry that opens the note prompt
pub const MENU_NOTE: &str = "webnotes-note";

/// Longest selection excerpt shown in the note prompt
pub const PREVIEW_CHARS: usize = 100;

/// A capture command, as sent to a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// Highlight the selection. `None` keeps the session color.
    Highlight {
        #[serde(default = "default_command_color")]
        color: Option<Color>,
    },
    /// Open the note prompt for the selection
    AddNote,
}

fn default_command_color() -> Option<Color> {
    Some(Color::default())
}

impl Command {
    /// Map a key press: Ctrl+Shift+H highlights, Ctrl+Shift+N adds a note
    pub fn from_shortcut(ctrl: bool, shift: bool, key: &str) -> Option<Self> {
        if !(ctrl && shift) {
            return None;
        }
        if key.eq_ignore_ascii_case("h") {
            Some(Command::Highlight { color: None })
        } else if key.eq_ignore_ascii_case("n") {
            Some(Command::AddNote)
        } else {
            None
        }
    }

    pub fn from_menu_item(id: &str) -> Option<Self> {
        match id {
            MENU_HIGHLIGHT => Some(Command::Highlight {
                color: Some(Color::Yellow),
            }),
            MENU_NOTE => Some(Command::AddNote),
            _ => None,
        }
    }
}

/// Short-lived feedback shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Highlighted,
    Saved,
    SavedWithoutDisplay,
    SelectTextFirst,
    /// The record never reached the store
    SaveFailed,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::Highlighted => "Highlighted",
            Notice::Saved => "Saved",
            Notice::SavedWithoutDisplay => "Saved (could not display highlight)",
            Notice::SelectTextFirst => "Select text first",
            Notice::SaveFailed => "Could not save annotation",
        }
    }

    /// Feedback for a finished highlight attempt
    pub fn for_outcome(outcome: &HighlightOutcome) -> Self {
        match outcome {
            HighlightOutcome::Highlighted { .. } => Notice::Highlighted,
            HighlightOutcome::SaveOnly => Notice::Saved,
            HighlightOutcome::Degraded { .. } => Notice::SavedWithoutDisplay,
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of a capture command
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Nothing usable was selected; no feedback
    Ignored,
    /// A draft ready to be saved
    Captured {
        draft: NewAnnotation,
        notice: Notice,
    },
}

/// Result of opening the note prompt
#[derive(Debug, Clone, PartialEq)]
pub enum NotePrompt {
    Open(NoteDraft),
    Rejected(Notice),
    Ignored,
}

/// State of an open note prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    text: String,
    color: Color,
}

impl NoteDraft {
    /// The full selected text, trimmed
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Excerpt shown above the note input
    pub fn preview(&self) -> String {
        if self.text.chars().count() > PREVIEW_CHARS {
            let head: String = self.text.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.text.clone()
        }
    }

    /// Pick a color in the prompt. This also becomes the session color.
    pub fn select_color(&mut self, session: &mut CaptureSession, color: Color) {
        self.color = color;
        session.set_color(color);
    }
}

/// Per-page capture state
#[derive(Debug, Clone, Default)]
pub struct CaptureSession {
    color: Color,
    page: PageInfo,
}

impl CaptureSession {
    pub fn new(page: PageInfo) -> Self {
        Self {
            color: Color::default(),
            page,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn page(&self) -> &PageInfo {
        &self.page
    }

    /// Highlight the current selection in the session color
    ///
    /// Always yields a draft for a non-blank selection, even when no marker
    /// could be placed. The selection is cleared afterwards.
    pub fn highlight_selection<T: DomTree + ?Sized>(
        &mut self,
        tree: &mut T,
        selection: &mut Selection,
    ) -> CaptureOutcome {
        let Some((range, text)) = selected(tree, selection) else {
            return CaptureOutcome::Ignored;
        };

        let outcome = highlight(tree, &range, self.color);
        selection.clear();

        let locator = outcome.locator().map(str::to_string);
        tracing::debug!(
            color = %self.color,
            visible = outcome.is_visible(),
            locator = ?locator,
            "Captured highlight"
        );

        CaptureOutcome::Captured {
            draft: NewAnnotation::highlight(&text, self.color, locator, &self.page),
            notice: Notice::for_outcome(&outcome),
        }
    }

    /// Open the note prompt for the current selection
    pub fn begin_note<T: DomTree + ?Sized>(&self, tree: &T, selection: &Selection) -> NotePrompt {
        if selection.is_collapsed() {
            return NotePrompt::Rejected(Notice::SelectTextFirst);
        }
        match selected(tree, selection) {
            Some((_, text)) => NotePrompt::Open(NoteDraft {
                text,
                color: self.color,
            }),
            None => NotePrompt::Ignored,
        }
    }

    /// Save an open note prompt
    ///
    /// Highlights whatever is selected now and produces one record: a note
    /// when `note` has content, a plain highlight otherwise. The text is the
    /// one captured when the prompt opened.
    pub fn save_note<T: DomTree + ?Sized>(
        &mut self,
        tree: &mut T,
        selection: &mut Selection,
        draft: NoteDraft,
        note: &str,
    ) -> CaptureOutcome {
        self.color = draft.color;

        let (locator, notice) = match selected(tree, selection) {
            Some((range, _)) => {
                let outcome = highlight(tree, &range, self.color);
                selection.clear();
                let notice = match outcome {
                    HighlightOutcome::Degraded { .. } => Notice::SavedWithoutDisplay,
                    _ => Notice::Saved,
                };
                (outcome.locator().map(str::to_string), notice)
            }
            None => (None, Notice::Saved),
        };

        let note = note.trim();
        let draft = if note.is_empty() {
            NewAnnotation::highlight(&draft.text, self.color, locator, &self.page)
        } else {
            NewAnnotation::note(&draft.text, note, self.color, locator, &self.page)
        };

        CaptureOutcome::Captured { draft, notice }
    }
}

// Non-collapsed selection with non-blank text, plus that text trimmed.
fn selected<T: DomTree + ?Sized>(
    tree: &T,
    selection: &Selection,
) -> Option<(Range, String)> {
    let range = *selection.range()?;
    if range.is_collapsed() {
        return None;
    }
    let text = range.to_text(tree).trim().to_string();
    if text.is_empty() {
        return None;
    }
    Some((range, text))
}

/// What a page did with a command
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    /// Finished, with optional feedback
    Done(Option<Notice>),
    /// The note prompt is open and waits for input
    Prompt(NoteDraft),
}

/// A page wired to the annotation service
pub struct PageAgent {
    session: CaptureSession,
    client: ServiceClient,
}

impl PageAgent {
    pub fn new(page: PageInfo, client: ServiceClient) -> Self {
        Self {
            session: CaptureSession::new(page),
            client,
        }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CaptureSession {
        &mut self.session
    }

    /// Annotations already saved for this page
    ///
    /// Markers are not restored from these yet; they are only counted.
    pub async fn load_existing(&self) -> Vec<AnnotationRecord> {
        let records = self.client.annotations_for(&self.session.page().url).await;
        if !records.is_empty() {
            tracing::info!(
                url = %self.session.page().url,
                count = records.len(),
                "Loaded existing annotations"
            );
        }
        records
    }

    pub async fn handle_command<T: DomTree + ?Sized>(
        &mut self,
        tree: &mut T,
        selection: &mut Selection,
        command: Command,
    ) -> Handled {
        match command {
            Command::Highlight { color } => {
                if let Some(color) = color {
                    self.session.set_color(color);
                }
                Handled::Done(self.highlight(tree, selection).await)
            }
            Command::AddNote => match self.session.begin_note(tree, selection) {
                NotePrompt::Open(draft) => Handled::Prompt(draft),
                NotePrompt::Rejected(notice) => Handled::Done(Some(notice)),
                NotePrompt::Ignored => Handled::Done(None),
            },
        }
    }

    pub async fn highlight<T: DomTree + ?Sized>(
        &mut self,
        tree: &mut T,
        selection: &mut Selection,
    ) -> Option<Notice> {
        let outcome = self.session.highlight_selection(tree, selection);
        self.submit(outcome).await
    }

    pub async fn save_note<T: DomTree + ?Sized>(
        &mut self,
        tree: &mut T,
        selection: &mut Selection,
        draft: NoteDraft,
        note: &str,
    ) -> Option<Notice> {
        let outcome = self.session.save_note(tree, selection, draft, note);
        self.submit(outcome).await
    }

    async fn submit(&self, outcome: CaptureOutcome) -> Option<Notice> {
        match outcome {
            CaptureOutcome::Ignored => None,
            CaptureOutcome::Captured { draft, notice } => {
                match self.client.save(draft).await {
                    Some(id) => {
                        tracing::debug!(id = %id, "Annotation saved");
                        Some(notice)
                    }
                    None => {
                        tracing::warn!("Annotation was not saved");
                        Some(Notice::SaveFailed)
                    }
                }
            }
        }
    }
}
