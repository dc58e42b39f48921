//! When to re-render.
//!
//! [`AnnotatorTask::run`] scans once after the page has had time to settle,
//! again on every `UpdateWarnings` notification, and once per burst of
//! scroll events after the burst has been quiet for the debounce window.

use std::collections::VecDeque;
use std::time::Duration;

use phishwatch_core::{HostContext, Message};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::annotator::{Annotator, InboxPage, ScanReport};

/// Delay before the first scan of a freshly loaded page.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Quiet period after the last scroll event before rescanning.
pub const DEFAULT_SCROLL_DEBOUNCE: Duration = Duration::from_secs(1);

/// Number of recent scans kept for inspection.
pub const SCAN_HISTORY: usize = 32;

/// Rescan timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Delay before the first scan.
    pub settle_delay: Duration,
    /// Scroll debounce window.
    pub scroll_debounce: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            scroll_debounce: DEFAULT_SCROLL_DEBOUNCE,
        }
    }
}

/// What caused a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The settle delay after load elapsed.
    Settled,
    /// A new snapshot was announced.
    Notification,
    /// A burst of scrolling ended.
    Scroll,
}

/// One completed scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRecord {
    /// Why the scan ran.
    pub trigger: Trigger,
    /// What it found.
    pub report: ScanReport,
}

/// Owns a page and keeps its indicators current.
#[derive(Debug)]
pub struct AnnotatorTask<P> {
    page: P,
    annotator: Annotator,
    timing: Timing,
    context: HostContext,
    recent: VecDeque<ScanRecord>,
    scan_count: watch::Sender<u64>,
}

impl<P: InboxPage> AnnotatorTask<P> {
    /// Create a task for a page.
    pub fn new(page: P, annotator: Annotator, timing: Timing, context: HostContext) -> Self {
        Self {
            page,
            annotator,
            timing,
            context,
            recent: VecDeque::with_capacity(SCAN_HISTORY),
            scan_count: watch::channel(0).0,
        }
    }

    /// The page being annotated.
    pub const fn page(&self) -> &P {
        &self.page
    }

    /// The last [`SCAN_HISTORY`] scans, oldest first.
    pub const fn scans(&self) -> &VecDeque<ScanRecord> {
        &self.recent
    }

    /// Total number of scans run, including those no longer in history.
    pub fn scan_count(&self) -> u64 {
        *self.scan_count.borrow()
    }

    /// Follow the scan count while the task runs elsewhere.
    pub fn watch_scan_count(&self) -> watch::Receiver<u64> {
        self.scan_count.subscribe()
    }

    /// Give the page back.
    pub fn into_page(self) -> P {
        self.page
    }

    /// Scan now, unless the context is gone.
    pub fn rescan(&mut self, trigger: Trigger) -> Option<ScanReport> {
        if !self.context.is_alive() {
            debug!(?trigger, "Context torn down, skipping scan");
            return None;
        }

        let report = self.annotator.scan(&mut self.page);
        if self.recent.len() == SCAN_HISTORY {
            self.recent.pop_front();
        }
        self.recent.push_back(ScanRecord { trigger, report });
        self.scan_count.send_modify(|count| *count += 1);
        Some(report)
    }

    /// Drive scans until the context is torn down or there is nothing left
    /// to wait for.
    ///
    /// Lagged notifications are skipped; the next one carries the full list
    /// anyway.
    pub async fn run(
        mut self,
        mut notifications: broadcast::Receiver<Message>,
        mut scrolls: mpsc::Receiver<()>,
    ) -> Self {
        let context = self.context.clone();
        let mut settle = Some(Instant::now() + self.timing.settle_delay);
        let mut debounce: Option<Instant> = None;
        let mut notifications_open = true;
        let mut scrolls_open = true;

        info!(
            settle_ms = self.timing.settle_delay.as_millis(),
            "Annotator started"
        );

        loop {
            if !notifications_open && !scrolls_open && settle.is_none() && debounce.is_none() {
                break;
            }

            tokio::select! {
                biased;

                () = context.torn_down() => {
                    debug!("Context torn down, annotator stopping");
                    break;
                }

                () = sleep_until(settle.unwrap_or_else(Instant::now)), if settle.is_some() => {
                    settle = None;
                    self.rescan(Trigger::Settled);
                }

                message = notifications.recv(), if notifications_open => match message {
                    Ok(Message::UpdateWarnings { emails, count, .. }) => {
                        debug!(count, "Received new warnings");
                        self.annotator.replace_emails(emails);
                        self.rescan(Trigger::Notification);
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Annotator fell behind on notifications");
                    }
                    Err(broadcast::error::RecvError::Closed) => notifications_open = false,
                },

                scroll = scrolls.recv(), if scrolls_open => match scroll {
                    Some(()) => debounce = Some(Instant::now() + self.timing.scroll_debounce),
                    None => scrolls_open = false,
                },

                () = sleep_until(debounce.unwrap_or_else(Instant::now)), if debounce.is_some() => {
                    debounce = None;
                    self.rescan(Trigger::Scroll);
                }
            }
        }

        self
    }
}
