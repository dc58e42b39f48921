//! Plain in-memory rows and pages.
//!
//! Used by the CLI to annotate row dumps stored as JSON, and by tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::annotator::InboxPage;
use crate::error::Result;
use crate::indicator::Badge;
use crate::row::InboxRow;

const fn one() -> u32 {
    1
}

/// A row described by plain data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlainRow {
    /// Attributes of the row element.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Number of table cells.
    #[serde(default = "one")]
    pub cells: u32,
    /// Number of text spans.
    #[serde(default = "one")]
    pub spans: u32,
    /// Sender text.
    #[serde(default)]
    pub sender: Option<String>,
    /// Subject text.
    #[serde(default)]
    pub subject: Option<String>,
    /// Indicators currently rendered into the row.
    #[serde(skip)]
    pub badges: Vec<Badge>,
}

impl Default for PlainRow {
    fn default() -> Self {
        Self {
            attributes: BTreeMap::new(),
            cells: 1,
            spans: 1,
            sender: None,
            subject: None,
            badges: Vec::new(),
        }
    }
}

impl PlainRow {
    /// Set an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Set the sender text.
    #[must_use]
    pub fn with_sender(mut self, sender: &str) -> Self {
        self.sender = Some(sender.to_string());
        self
    }

    /// Set the subject text.
    #[must_use]
    pub fn with_subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    /// Set the cell and span counts.
    #[must_use]
    pub const fn with_structure(mut self, cells: u32, spans: u32) -> Self {
        self.cells = cells;
        self.spans = spans;
        self
    }

    /// The single rendered badge, if exactly one is present.
    #[must_use]
    pub fn badge(&self) -> Option<&Badge> {
        match self.badges.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

impl InboxRow for PlainRow {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn has_cell(&self) -> bool {
        self.cells > 0
    }

    fn has_span(&self) -> bool {
        self.spans > 0
    }

    fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    fn remove_indicators(&mut self) {
        self.badges.clear();
    }

    fn append_indicator(&mut self, badge: Badge) {
        self.badges.push(badge);
    }
}

/// An inbox page made of [`PlainRow`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlainPage {
    /// Rows in display order.
    pub rows: Vec<PlainRow>,
}

impl PlainPage {
    /// Build a page from rows.
    #[must_use]
    pub const fn new(rows: Vec<PlainRow>) -> Self {
        Self { rows }
    }

    /// Parse a page from JSON: either `{"rows": [...]}` or a bare array.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is neither shape.
    pub fn from_json(text: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Page(PlainPage),
            Rows(Vec<PlainRow>),
        }

        Ok(match serde_json::from_str(text)? {
            Shape::Page(page) => page,
            Shape::Rows(rows) => Self::new(rows),
        })
    }
}

impl InboxPage for PlainPage {
    type Row = PlainRow;

    fn rows_mut(&mut self) -> impl Iterator<Item = &mut PlainRow> {
        self.rows.iter_mut()
    }
}
