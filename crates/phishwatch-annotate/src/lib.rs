//! # phishwatch-annotate
//!
//! Marks inbox rows with the verdicts held by the `PhishWatch` cache.
//!
//! The host page is reached only through the [`InboxRow`] and [`InboxPage`]
//! traits. [`Annotator`] matches and renders; [`AnnotatorTask`] decides when
//! to re-render (after the page settles, on poller notifications, and on
//! debounced scrolls).
//!
//! ```no_run
//! use phishwatch_annotate::{Annotator, PlainPage};
//!
//! # fn main() -> phishwatch_annotate::Result<()> {
//! let mut page = PlainPage::from_json(r#"[{"attributes":{"data-legacy-message-id":"abc123"}}]"#)?;
//! let report = Annotator::default().scan(&mut page);
//! assert_eq!(report.unknown, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod annotator;
mod error;
pub mod fixture;
pub mod indicator;
pub mod matcher;
pub mod row;
pub mod schedule;

pub use annotator::{Annotator, InboxPage, ScanReport};
pub use error::{Error, Result};
pub use fixture::{PlainPage, PlainRow};
pub use indicator::{BADGE_CLASS, Badge, Indicator};
pub use matcher::{MIN_TEXT_KEY_LEN, MatchKind, RowMatch, find_match};
pub use row::{ID_ATTRIBUTES, InboxRow, RowKeys};
pub use schedule::{AnnotatorTask, ScanRecord, Timing, Trigger};
