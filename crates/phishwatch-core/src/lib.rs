//! # phishwatch-core
//!
//! Core logic for the `PhishWatch` inbox guard.
//!
//! This crate provides:
//! - Typed verdict records validated at the API boundary
//! - **Snapshot Cache** - the last good snapshot, persisted in `SQLite`
//! - **Poller** - timed and on-demand fetches with stale/offline fallback
//! - **Status Panel** - display projection plus refresh and clear commands
//! - Inter-context messages and host-context liveness
//! - Settings

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod context;
mod error;
pub mod panel;
pub mod poller;
pub mod protocol;
pub mod verdict;

pub use cache::{CacheKey, CacheStatus, SnapshotStore};
pub use config::Settings;
pub use context::HostContext;
pub use error::{Error, Result};
pub use panel::{PanelView, StatusPanel, VerdictReport};
pub use poller::{ApiClient, PollOutcome, PollState, Poller, PollerHandle, SnapshotSource};
pub use protocol::{Ack, LatestData, Message, Reply};
pub use verdict::{ApiResponse, Breakdown, EmailVerdict, Snapshot, ThreatLevel};
