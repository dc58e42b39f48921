//! The narrow interface between a host page and the matcher.
//!
//! A host exposes each inbox row through [`InboxRow`]. Matching only ever
//! sees the [`RowKeys`] extracted from it, so the matching rules can be
//! tested without any particular markup.

use crate::indicator::Badge;

/// Row attributes that may carry a message identifier, most specific first.
pub const ID_ATTRIBUTES: [&str; 5] = [
    "data-legacy-message-id",
    "data-message-id",
    "data-legacy-last-message-id",
    "data-thread-id",
    "id",
];

/// One listing row of a webmail inbox.
pub trait InboxRow {
    /// Value of an attribute on the row element.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Whether the row contains at least one table cell.
    fn has_cell(&self) -> bool;

    /// Whether the row contains at least one text span.
    fn has_span(&self) -> bool;

    /// Sender address of the row, or the sender's display text when no
    /// address is exposed.
    fn sender(&self) -> Option<&str>;

    /// Subject text shown in the row.
    fn subject(&self) -> Option<&str>;

    /// Remove every indicator previously rendered into the row.
    fn remove_indicators(&mut self);

    /// Render an indicator into the row, in addition to any already there.
    fn append_indicator(&mut self, badge: Badge);

    /// Structural heuristic for "this is an email row".
    fn is_candidate(&self) -> bool {
        self.has_cell() && self.has_span()
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Best-effort identifiers of a row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowKeys {
    /// First non-empty identifier attribute.
    pub id: Option<String>,
    /// Sender text.
    pub sender: Option<String>,
    /// Subject text.
    pub subject: Option<String>,
}

impl RowKeys {
    /// Extract keys from a row.
    #[must_use]
    pub fn extract<R: InboxRow + ?Sized>(row: &R) -> Self {
        let id = ID_ATTRIBUTES
            .iter()
            .find_map(|name| clean(row.attribute(name)));
        Self {
            id,
            sender: clean(row.sender()),
            subject: clean(row.subject()),
        }
    }

    /// Keys with only an identifier.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Keys with only sender and/or subject text.
    #[must_use]
    pub fn with_text(sender: Option<&str>, subject: Option<&str>) -> Self {
        Self {
            id: None,
            sender: clean(sender),
            subject: clean(subject),
        }
    }

    /// Whether nothing usable was found.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.id.is_none() && self.sender.is_none() && self.subject.is_none()
    }
}
