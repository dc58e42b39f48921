//! Read-only status panel over the snapshot cache.
//!
//! The panel never decides anything: it formats what the cache holds and
//! forwards the two commands it offers (force-refresh and clear-cache).

mod report;
mod view;

pub use report::VerdictReport;
pub use view::{LastUpdate, Notice, NoticeKind, PanelView, ServiceStatus};

use chrono::Utc;
use tracing::{info, warn};

use crate::cache::SnapshotStore;
use crate::poller::{PollOutcome, Poller, PollerHandle, SnapshotSource};
use crate::verdict::EmailVerdict;
use crate::{Error, Result};

/// Status panel bound to a store and, optionally, a running poller.
#[derive(Debug, Clone)]
pub struct StatusPanel {
    store: SnapshotStore,
    poller: Option<PollerHandle>,
}

impl StatusPanel {
    /// Create a panel that can only read and clear the cache.
    #[must_use]
    pub const fn new(store: SnapshotStore) -> Self {
        Self {
            store,
            poller: None,
        }
    }

    /// Attach a poller so force-refresh is available.
    #[must_use]
    pub fn with_poller(mut self, poller: PollerHandle) -> Self {
        self.poller = Some(poller);
        self
    }

    /// Current view of the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read.
    pub async fn load(&self) -> Result<PanelView> {
        let status = self.store.status().await?;
        Ok(PanelView::from_status(&status))
    }

    /// Look up one cached verdict by its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read.
    pub async fn find(&self, email_id: &str) -> Result<Option<EmailVerdict>> {
        let status = self.store.status().await?;
        Ok(status.emails.into_iter().find(|e| e.email_id == email_id))
    }

    /// Ask the poller to fetch now, then re-read the cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PollerStopped`] if no poller is attached or it has
    /// exited, or an error if the cache cannot be read.
    pub async fn force_refresh(&self) -> Result<PanelView> {
        let poller = self.poller.as_ref().ok_or(Error::PollerStopped)?;
        let outcome = poller.force_refresh().await?;
        self.after_refresh(&outcome).await
    }

    /// Fetch once through `poller` without a running poll loop, then re-read
    /// the cache. For one-shot hosts that have no timer to race with.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read.
    pub async fn refresh_once<S: SnapshotSource>(&self, poller: &Poller<S>) -> Result<PanelView> {
        let outcome = poller.poll_once().await;
        self.after_refresh(&outcome).await
    }

    async fn after_refresh(&self, outcome: &PollOutcome) -> Result<PanelView> {
        let notice = match outcome {
            PollOutcome::Updated { .. } => Notice::success("Data refreshed successfully!"),
            PollOutcome::Stale { .. } | PollOutcome::ContextLost => {
                Notice::error("Refresh failed. Check API connection.")
            }
        };
        Ok(self.load().await?.with_notice(notice))
    }

    /// Remove every cached key.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be cleared.
    pub async fn clear_cache(&self) -> Result<PanelView> {
        self.store.clear().await?;
        info!("Cache cleared");
        let mut view = self.load().await?;
        view.last_update = LastUpdate::Cleared;
        Ok(view.with_notice(Notice::success("Cache cleared successfully!")))
    }

    /// Fetch directly from `source`, bypassing the poller, and store the
    /// result on success.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cache cannot be read or written; remote
    /// failures are reported through the view's notice.
    pub async fn test_connection<S: SnapshotSource>(&self, source: &S) -> Result<PanelView> {
        let fetched = source
            .fetch()
            .await
            .and_then(|body| body.into_snapshot(Utc::now()));

        match fetched {
            Ok(snapshot) => {
                self.store.replace_snapshot(&snapshot).await?;
                let text = format!("API Connected! Found {} flagged emails.", snapshot.total_count);
                Ok(self.load().await?.with_notice(Notice::success(text)))
            }
            Err(Error::Rejected) => Ok(self
                .load()
                .await?
                .with_notice(Notice::error("API responded but no data available."))),
            Err(e) => {
                warn!("API test failed: {e}");
                let mut view = self.load().await?;
                view.status = ServiceStatus::Inactive;
                Ok(view.with_notice(Notice::error(format!("API Error: {e}"))))
            }
        }
    }
}
