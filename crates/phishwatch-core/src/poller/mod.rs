//! Background polling of the remote classification API.
//!
//! The poller fetches on a fixed cadence and on demand, replaces the cached
//! snapshot on success and falls back to the cached snapshot on failure.

mod source;
mod task;

pub use source::{ApiClient, SnapshotSource};
pub use task::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_REFRESH_INTERVAL, PollCommand, PollOutcome, PollState, Poller,
    PollerHandle,
};
