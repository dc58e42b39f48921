//! The polling task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::source::SnapshotSource;
use crate::cache::SnapshotStore;
use crate::context::HostContext;
use crate::protocol::{Ack, LatestData, Message, Reply};
use crate::verdict::{Breakdown, Snapshot};
use crate::{Error, Result};

/// Default cadence of the refresh timer.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Default bound on a single fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

const EVENT_CAPACITY: usize = 16;
const COMMAND_CAPACITY: usize = 8;

/// Where the poller is in its cycle.
///
/// `Updated` and `Stale` are resting states: the poller is idle until the
/// next tick or force-refresh moves it back to `Fetching`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    /// Nothing fetched yet.
    #[default]
    Idle,
    /// A fetch is in flight.
    Fetching,
    /// The last fetch replaced the snapshot.
    Updated,
    /// The last fetch failed; the previous snapshot is still served.
    Stale,
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The cache now holds the fetched snapshot.
    Updated {
        /// Flagged count reported by the server.
        count: u64,
        /// Monitored count reported by the server.
        total_emails: u64,
    },
    /// The fetch failed and the cached snapshot was kept.
    Stale {
        /// Why the fetch failed.
        reason: String,
        /// Number of verdicts still served from the cache.
        cached: usize,
    },
    /// The hosting context is gone; nothing was attempted.
    ContextLost,
}

/// Commands accepted by [`Poller::run`].
#[derive(Debug)]
pub enum PollCommand {
    /// Fetch now and report the outcome.
    ForceRefresh {
        /// Where to send the outcome.
        reply: oneshot::Sender<PollOutcome>,
    },
}

/// Cloneable handle for sending commands to a running poller.
#[derive(Debug, Clone)]
pub struct PollerHandle {
    commands: mpsc::Sender<PollCommand>,
}

impl PollerHandle {
    /// Create a handle and the receiver to pass to [`Poller::run`].
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<PollCommand>) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        (Self { commands: tx }, rx)
    }

    /// Ask the poller to fetch immediately, without waiting for the timer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PollerStopped`] if the poller task has exited.
    pub async fn force_refresh(&self) -> Result<PollOutcome> {
        let (reply, outcome) = oneshot::channel();
        self.commands
            .send(PollCommand::ForceRefresh { reply })
            .await
            .map_err(|_| Error::PollerStopped)?;
        outcome.await.map_err(|_| Error::PollerStopped)
    }
}

/// Fetches snapshots on a timer and on demand, keeping the cache current.
pub struct Poller<S> {
    source: S,
    store: SnapshotStore,
    context: HostContext,
    events: broadcast::Sender<Message>,
    state: watch::Sender<PollState>,
    fetch_timeout: Duration,
    attempts: AtomicU64,
}

impl<S: SnapshotSource> Poller<S> {
    /// Create a poller writing into `store`.
    #[must_use]
    pub fn new(source: S, store: SnapshotStore, context: HostContext) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (state, _) = watch::channel(PollState::Idle);
        Self {
            source,
            store,
            context,
            events,
            state,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            attempts: AtomicU64::new(0),
        }
    }

    /// Override the per-fetch timeout.
    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.events.subscribe()
    }

    /// Observe state transitions.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    /// Number of fetches attempted so far.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Fetch once and reconcile the cache.
    ///
    /// Never fails: every error degrades to a stale read of the cache.
    pub async fn poll_once(&self) -> PollOutcome {
        if !self.context.is_alive() {
            info!("Context inactive, skipping fetch");
            return PollOutcome::ContextLost;
        }

        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        self.state.send_replace(PollState::Fetching);
        debug!(attempt, "Fetching flagged emails");

        let fetched = match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(response) => response.and_then(|body| body.into_snapshot(Utc::now())),
            Err(_) => Err(Error::Timeout(self.fetch_timeout)),
        };

        let stored = match fetched {
            Ok(snapshot) => self
                .store
                .replace_snapshot(&snapshot)
                .await
                .map(|()| snapshot),
            Err(e) => Err(e),
        };

        match stored {
            Ok(snapshot) => self.publish(&snapshot),
            Err(e) => self.fall_back(&e).await,
        }
    }

    fn publish(&self, snapshot: &Snapshot) -> PollOutcome {
        let breakdown = Breakdown::of(&snapshot.emails);
        info!(
            count = snapshot.total_count,
            total_emails = snapshot.total_emails,
            phishing = breakdown.phishing,
            safe = breakdown.safe,
            other = breakdown.other,
            "Updated flagged emails"
        );

        self.state.send_replace(PollState::Updated);
        if let Err(e) = self.events.send(Message::update_warnings(snapshot)) {
            debug!("No observers for update: {e}");
        }

        PollOutcome::Updated {
            count: snapshot.total_count,
            total_emails: snapshot.total_emails,
        }
    }

    async fn fall_back(&self, err: &Error) -> PollOutcome {
        match err {
            Error::Timeout(_) => error!("Request timeout - server not responding"),
            Error::Http(e) if e.is_timeout() => error!("Request timeout - server not responding"),
            e if e.is_remote() => error!("Failed to fetch emails: {e}"),
            e => error!("Failed to store snapshot: {e}"),
        }

        if let Err(e) = self.store.mark_offline().await {
            error!("Could not mark server offline: {e}");
        }

        let cached = match self.store.status().await {
            Ok(status) if status.has_data() => {
                warn!(
                    emails = status.emails.len(),
                    last_update = ?status.last_update,
                    "Using cached data"
                );
                status.emails.len()
            }
            Ok(_) => {
                warn!("No cached data available - waiting for server");
                0
            }
            Err(e) => {
                error!("Could not access storage: {e}");
                0
            }
        };

        self.state.send_replace(PollState::Stale);
        PollOutcome::Stale {
            reason: err.to_string(),
            cached,
        }
    }

    /// Answer a message from another context.
    ///
    /// Returns `None` for messages that need no reply.
    pub async fn handle_message(&self, message: Message) -> Option<Reply> {
        if !self.context.is_alive() {
            return Some(Reply::Ack(Ack::failed(Error::ContextLost.to_string())));
        }

        match message {
            Message::GetLatestData => {
                let latest = match self.store.status().await {
                    Ok(status) => LatestData::from(status),
                    Err(e) => {
                        error!("Could not access storage: {e}");
                        LatestData::default()
                    }
                };
                Some(Reply::LatestData(latest))
            }
            Message::ForceRefresh => {
                info!("Force refresh requested");
                let ack = match self.poll_once().await {
                    PollOutcome::ContextLost => Ack::failed(Error::ContextLost.to_string()),
                    _ => Ack::ok("Refresh completed"),
                };
                Some(Reply::Ack(ack))
            }
            Message::UpdateWarnings { .. } | Message::DataUpdated => None,
        }
    }

    /// Poll immediately, then on every `interval` tick and every command,
    /// until the hosting context is torn down.
    pub async fn run(&self, interval: Duration, mut commands: mpsc::Receiver<PollCommand>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut commands_open = true;

        info!(interval = ?interval, "Poller started");
        loop {
            tokio::select! {
                biased;
                () = self.context.torn_down() => {
                    info!("Stopping refresh interval - context inactive");
                    break;
                }
                command = commands.recv(), if commands_open => match command {
                    Some(PollCommand::ForceRefresh { reply }) => {
                        info!("Force refresh requested");
                        let outcome = self.poll_once().await;
                        let _ = reply.send(outcome);
                    }
                    None => commands_open = false,
                },
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::verdict::ApiResponse;

    enum Step {
        Body(&'static str),
        Fail,
        Hang,
    }

    #[derive(Clone, Default)]
    struct ScriptedSource {
        steps: Arc<Mutex<VecDeque<Step>>>,
    }

    impl ScriptedSource {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: Arc::new(Mutex::new(steps.into())),
            }
        }
    }

    impl SnapshotSource for ScriptedSource {
        async fn fetch(&self) -> Result<ApiResponse> {
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Body(body)) => ApiResponse::from_body(body),
                Some(Step::Fail) | None => Err(Error::Status {
                    status: 503,
                    reason: "Service Unavailable".into(),
                }),
                Some(Step::Hang) => std::future::pending().await,
            }
        }
    }

    const ONE_PHISH: &str = r#"{"success": true, "count": 1, "total_emails": 10,
        "timestamp": "2026-01-24T10:00:00Z",
        "emails": [{"email_id": "abc123", "is_phishing": true, "threat_level": "HIGH"}]}"#;

    const TWO_SAFE: &str = r#"{"success": true, "count": 2, "total_emails": 11,
        "emails": [{"email_id": "s1", "is_phishing": false}, {"email_id": "s2", "is_phishing": false}]}"#;

    async fn poller(steps: Vec<Step>) -> Poller<ScriptedSource> {
        let store = SnapshotStore::in_memory().await.unwrap();
        Poller::new(ScriptedSource::new(steps), store, HostContext::new())
    }

    fn ids(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.emails.iter().map(|e| e.email_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_success_replaces_snapshot_and_notifies() {
        let poller = poller(vec![Step::Body(ONE_PHISH)]).await;
        let mut events = poller.subscribe();

        let outcome = poller.poll_once().await;
        assert_eq!(
            outcome,
            PollOutcome::Updated {
                count: 1,
                total_emails: 10
            }
        );
        assert_eq!(*poller.watch_state().borrow(), PollState::Updated);

        let snapshot = poller.store.load_snapshot().await.unwrap().unwrap();
        assert_eq!(ids(&snapshot), ["abc123"]);
        assert!(snapshot.online);

        match events.try_recv().unwrap() {
            Message::UpdateWarnings {
                emails,
                count,
                total_emails,
            } => {
                assert_eq!(emails.len(), 1);
                assert_eq!(count, 1);
                assert_eq!(total_emails, 10);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_keeps_emails_and_marks_offline() {
        let poller = poller(vec![Step::Body(ONE_PHISH), Step::Fail]).await;
        poller.poll_once().await;
        let mut events = poller.subscribe();

        let outcome = poller.poll_once().await;
        assert!(matches!(outcome, PollOutcome::Stale { cached: 1, .. }));
        assert_eq!(*poller.watch_state().borrow(), PollState::Stale);

        let snapshot = poller.store.load_snapshot().await.unwrap().unwrap();
        assert_eq!(ids(&snapshot), ["abc123"]);
        assert!(!snapshot.online);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rejected_body_is_a_failure() {
        let poller = poller(vec![
            Step::Body(ONE_PHISH),
            Step::Body(r#"{"success": false}"#),
            Step::Body("not json"),
        ])
        .await;
        poller.poll_once().await;

        for _ in 0..2 {
            let outcome = poller.poll_once().await;
            assert!(matches!(outcome, PollOutcome::Stale { cached: 1, .. }));
        }
        let snapshot = poller.store.load_snapshot().await.unwrap().unwrap();
        assert_eq!(ids(&snapshot), ["abc123"]);
    }

    #[tokio::test]
    async fn test_success_after_failure_goes_back_online() {
        let poller = poller(vec![Step::Body(ONE_PHISH), Step::Fail, Step::Body(TWO_SAFE)]).await;
        for _ in 0..3 {
            poller.poll_once().await;
        }

        let snapshot = poller.store.load_snapshot().await.unwrap().unwrap();
        assert_eq!(ids(&snapshot), ["s1", "s2"]);
        assert!(snapshot.online);
        assert_eq!(poller.attempts(), 3);
    }

    #[tokio::test]
    async fn test_timeout_marks_offline() {
        let timeout = Duration::from_millis(100);
        let poller = poller(vec![Step::Body(ONE_PHISH), Step::Hang])
            .await
            .with_fetch_timeout(timeout);
        poller.poll_once().await;

        let started = tokio::time::Instant::now();
        let outcome = poller.poll_once().await;
        assert!(started.elapsed() >= timeout);

        match outcome {
            PollOutcome::Stale { reason, cached } => {
                assert!(reason.contains("timed out"));
                assert_eq!(cached, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let status = poller.store.status().await.unwrap();
        assert!(!status.server_online);
        assert_eq!(status.emails.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_without_cache() {
        let poller = poller(vec![Step::Fail]).await;
        let outcome = poller.poll_once().await;
        assert!(matches!(outcome, PollOutcome::Stale { cached: 0, .. }));
        assert!(poller.store.load_snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_torn_down_context_skips_fetch() {
        let poller = poller(vec![Step::Body(ONE_PHISH)]).await;
        poller.context.tear_down();

        assert_eq!(poller.poll_once().await, PollOutcome::ContextLost);
        assert_eq!(poller.attempts(), 0);
        assert!(poller.store.load_snapshot().await.unwrap().is_none());

        let reply = poller.handle_message(Message::GetLatestData).await;
        assert_eq!(
            reply,
            Some(Reply::Ack(Ack::failed("Service worker inactive")))
        );
    }

    #[tokio::test]
    async fn test_get_latest_data() {
        let poller = poller(vec![Step::Body(ONE_PHISH)]).await;

        let empty = poller.handle_message(Message::GetLatestData).await;
        assert_eq!(empty, Some(Reply::LatestData(LatestData::default())));

        poller.poll_once().await;
        let Some(Reply::LatestData(latest)) = poller.handle_message(Message::GetLatestData).await
        else {
            panic!("expected latest data");
        };
        assert_eq!(latest.emails.len(), 1);
        assert_eq!(latest.total_emails, 10);
        assert!(latest.server_online);
        assert!(latest.last_update.is_some());
    }

    #[tokio::test]
    async fn test_force_refresh_message() {
        let poller = poller(vec![Step::Fail]).await;
        let reply = poller.handle_message(Message::ForceRefresh).await;
        assert_eq!(reply, Some(Reply::Ack(Ack::ok("Refresh completed"))));
        assert_eq!(poller.attempts(), 1);

        assert_eq!(poller.handle_message(Message::DataUpdated).await, None);
    }

    #[tokio::test]
    async fn test_run_polls_on_interval_and_stops_on_tear_down() {
        let interval = Duration::from_millis(50);
        let poller = Arc::new(poller(vec![Step::Body(ONE_PHISH), Step::Fail, Step::Fail]).await);
        let (_handle, commands) = PollerHandle::channel();

        let task = {
            let poller = Arc::clone(&poller);
            tokio::spawn(async move { poller.run(interval, commands).await })
        };

        tokio::time::sleep(interval * 3).await;
        assert!(poller.attempts() >= 2);

        poller.context.tear_down();
        tokio_test::assert_ok!(task.await);

        let stopped_at = poller.attempts();
        tokio::time::sleep(interval * 3).await;
        assert_eq!(poller.attempts(), stopped_at);
    }

    #[tokio::test]
    async fn test_force_refresh_does_not_wait_for_timer() {
        let poller = Arc::new(poller(vec![Step::Fail, Step::Body(ONE_PHISH)]).await);
        let (handle, commands) = PollerHandle::channel();

        let task = {
            let poller = Arc::clone(&poller);
            tokio::spawn(async move { poller.run(Duration::from_secs(3600), commands).await })
        };

        let started = tokio::time::Instant::now();
        let first = handle.force_refresh().await.unwrap();
        let second = handle.force_refresh().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(poller.attempts(), 3);
        assert!(matches!(first, PollOutcome::Stale { .. } | PollOutcome::Updated { .. }));
        assert!(matches!(second, PollOutcome::Updated { .. } | PollOutcome::Stale { .. }));

        poller.context.tear_down();
        task.await.unwrap();
        assert!(matches!(
            handle.force_refresh().await,
            Err(Error::PollerStopped)
        ));
    }
}
