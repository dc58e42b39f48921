//! Rendering indicators across a page.

use phishwatch_core::{EmailVerdict, SnapshotStore};
use tracing::{debug, info};

use crate::error::Result;
use crate::indicator::{Badge, Indicator};
use crate::matcher::{MatchKind, find_match};
use crate::row::{InboxRow, RowKeys};

/// A host page holding inbox rows.
pub trait InboxPage {
    /// Row type of the page.
    type Row: InboxRow;

    /// Every row currently present, candidates or not.
    fn rows_mut(&mut self) -> impl Iterator<Item = &mut Self::Row>;
}

/// Counts from one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Rows inspected.
    pub rows_seen: usize,
    /// Rows that passed the structural heuristic.
    pub candidates: usize,
    /// Green rows.
    pub safe: usize,
    /// Red rows.
    pub danger: usize,
    /// Yellow rows.
    pub warning: usize,
    /// Neutral rows.
    pub unknown: usize,
    /// Matches by exact identifier.
    pub by_id: usize,
    /// Matches by identifier suffix.
    pub by_suffix: usize,
    /// Matches by sender or subject.
    pub by_text: usize,
}

impl ScanReport {
    /// Rows with a danger or warning indicator.
    #[must_use]
    pub const fn flagged(&self) -> usize {
        self.danger + self.warning
    }

    fn count(&mut self, indicator: Indicator, kind: Option<MatchKind>) {
        match indicator {
            Indicator::Safe => self.safe += 1,
            Indicator::Danger => self.danger += 1,
            Indicator::Warning => self.warning += 1,
            Indicator::Unknown => self.unknown += 1,
        }
        match kind {
            Some(MatchKind::ExactId) => self.by_id += 1,
            Some(MatchKind::IdSuffix) => self.by_suffix += 1,
            Some(MatchKind::SenderOrSubject) => self.by_text += 1,
            None => {}
        }
    }
}

/// Matches rows against the current verdict list and renders one
/// indicator per candidate row.
#[derive(Debug, Clone, Default)]
pub struct Annotator {
    emails: Vec<EmailVerdict>,
}

impl Annotator {
    /// Create an annotator over a verdict list.
    #[must_use]
    pub const fn new(emails: Vec<EmailVerdict>) -> Self {
        Self { emails }
    }

    /// Create an annotator over whatever the cache currently holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read.
    pub async fn from_store(store: &SnapshotStore) -> Result<Self> {
        let status = store.status().await?;
        debug!(count = status.emails.len(), "Loaded verdicts from cache");
        Ok(Self::new(status.emails))
    }

    /// Current verdicts.
    #[must_use]
    pub fn emails(&self) -> &[EmailVerdict] {
        &self.emails
    }

    /// Swap in a new verdict list.
    pub fn replace_emails(&mut self, emails: Vec<EmailVerdict>) {
        self.emails = emails;
    }

    /// Re-render a single row and return its indicator.
    ///
    /// Non-candidate rows are left untouched and yield `None`.
    pub fn annotate_row<R: InboxRow>(&self, row: &mut R) -> Option<(Indicator, Option<MatchKind>)> {
        if !row.is_candidate() {
            return None;
        }

        let keys = RowKeys::extract(row);
        let matched = find_match(&keys, &self.emails);
        let badge = Badge::for_verdict(matched.map(|m| m.verdict));
        let indicator = badge.indicator;

        row.remove_indicators();
        row.append_indicator(badge);

        Some((indicator, matched.map(|m| m.kind)))
    }

    /// Re-render every candidate row of a page.
    pub fn scan<P: InboxPage>(&self, page: &mut P) -> ScanReport {
        let mut report = ScanReport::default();

        for row in page.rows_mut() {
            report.rows_seen += 1;
            if let Some((indicator, kind)) = self.annotate_row(row) {
                report.candidates += 1;
                report.count(indicator, kind);
            }
        }

        info!(
            rows_seen = report.rows_seen,
            candidates = report.candidates,
            safe = report.safe,
            flagged = report.flagged(),
            unknown = report.unknown,
            "Annotated inbox"
        );
        report
    }
}
