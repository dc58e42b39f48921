//! Row-to-verdict matching.
//!
//! Rules are tried in order and the first rule with a hit wins:
//! 1. the row identifier equals a verdict's `email_id`
//! 2. for identifiers of at least [`SUFFIX_LEN`] characters, the last
//!    [`SUFFIX_LEN`] of them equal, or occur inside, a verdict's `email_id`
//! 3. the row sender occurs inside a verdict's sender, or the row subject
//!    occurs inside a verdict's subject, ignoring case
//!
//! Within a rule the first verdict in snapshot order wins. Empty keys never
//! match anything, and text keys shorter than [`MIN_TEXT_KEY_LEN`]
//! characters (such as a bare `me` in the sender column) are ignored.

use phishwatch_core::EmailVerdict;

use crate::row::RowKeys;

/// Number of trailing identifier characters used by the suffix rule.
pub const SUFFIX_LEN: usize = 16;

/// Shortest sender or subject text the containment rule will use.
pub const MIN_TEXT_KEY_LEN: usize = 3;

/// Which rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// Identifier equality.
    ExactId,
    /// Identifier suffix.
    IdSuffix,
    /// Sender or subject text.
    SenderOrSubject,
}

/// A verdict matched to a row.
#[derive(Debug, Clone, Copy)]
pub struct RowMatch<'a> {
    /// The matched verdict.
    pub verdict: &'a EmailVerdict,
    /// The rule that matched.
    pub kind: MatchKind,
}

fn id_suffix(id: &str) -> Option<&str> {
    let skip = id.chars().count().checked_sub(SUFFIX_LEN)?;
    id.char_indices().nth(skip).map(|(at, _)| &id[at..])
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    !haystack.is_empty() && haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Find the verdict for a row.
#[must_use]
pub fn find_match<'a>(keys: &RowKeys, emails: &'a [EmailVerdict]) -> Option<RowMatch<'a>> {
    let hit = |verdict: &'a EmailVerdict, kind: MatchKind| Some(RowMatch { verdict, kind });

    if let Some(id) = keys.id.as_deref() {
        if let Some(v) = emails.iter().find(|e| e.email_id == id) {
            return hit(v, MatchKind::ExactId);
        }

        if let Some(v) = id_suffix(id)
            .and_then(|suffix| emails.iter().find(|e| e.email_id.contains(suffix)))
        {
            return hit(v, MatchKind::IdSuffix);
        }
    }

    fn usable(key: &Option<String>) -> Option<&str> {
        key.as_deref()
            .filter(|k| k.chars().count() >= MIN_TEXT_KEY_LEN)
    }
    let sender = usable(&keys.sender);
    let subject = usable(&keys.subject);
    if sender.is_none() && subject.is_none() {
        return None;
    }

    emails
        .iter()
        .find(|e| {
            sender.is_some_and(|s| contains_ignore_case(&e.sender, s))
                || subject.is_some_and(|s| contains_ignore_case(&e.subject, s))
        })
        .and_then(|v| hit(v, MatchKind::SenderOrSubject))
}
