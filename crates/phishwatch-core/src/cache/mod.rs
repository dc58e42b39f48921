//! Local snapshot cache.
//!
//! This module persists the last successfully fetched snapshot so that the
//! annotator and the status panel keep working while the remote API is
//! unavailable.

mod model;
mod repository;

pub use model::{CacheKey, CacheStatus};
pub use repository::SnapshotStore;
