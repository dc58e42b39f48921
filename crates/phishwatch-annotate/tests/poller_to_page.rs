//! Poller notifications flowing into page annotations.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tokio::sync::mpsc;

use phishwatch_annotate::{
    Annotator, AnnotatorTask, Indicator, PlainPage, PlainRow, Timing, Trigger,
};
use phishwatch_core::{
    ApiResponse, HostContext, PollOutcome, Poller, Result, SnapshotSource, SnapshotStore,
};

const ONE_PHISH: &str = r#"{"success":true,"count":1,"total_emails":2,"emails":[{"email_id":"abc123","sender":"billing@paypa1.com","subject":"Verify your account","is_phishing":true,"threat_level":"HIGH","confidence_percentage":97.5}]}"#;

struct FixedSource;

impl SnapshotSource for FixedSource {
    async fn fetch(&self) -> Result<ApiResponse> {
        ApiResponse::from_body(ONE_PHISH)
    }
}

fn inbox() -> PlainPage {
    PlainPage::new(vec![
        PlainRow::default().with_attribute("data-legacy-message-id", "abc123"),
        PlainRow::default().with_attribute("data-legacy-message-id", "xyz999"),
        PlainRow::default().with_sender("BILLING@paypa1.com"),
    ])
}

fn quick() -> Timing {
    Timing {
        settle_delay: Duration::from_millis(10),
        scroll_debounce: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_update_notification_recolors_rows() {
    let store = SnapshotStore::in_memory().await.unwrap();
    let context = HostContext::new();
    let poller = Poller::new(FixedSource, store.clone(), context.clone());

    let annotator = Annotator::from_store(&store).await.unwrap();
    let (scrolls, scroll_rx) = mpsc::channel(4);
    let task = AnnotatorTask::new(inbox(), annotator, quick(), context.clone());
    let running = tokio::spawn(task.run(poller.subscribe(), scroll_rx));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        poller.poll_once().await,
        PollOutcome::Updated {
            count: 1,
            total_emails: 2
        }
    );

    drop(poller);
    drop(scrolls);
    let task = running.await.unwrap();

    let triggers: Vec<Trigger> = task.scans().iter().map(|s| s.trigger).collect();
    assert_eq!(triggers, vec![Trigger::Settled, Trigger::Notification]);
    assert_eq!(task.scans()[0].report.unknown, 3);

    let rows = &task.page().rows;
    assert!(rows.iter().all(|r| r.badges.len() == 1));
    assert_eq!(rows[0].badge().unwrap().indicator, Indicator::Danger);
    assert_eq!(rows[1].badge().unwrap().indicator, Indicator::Unknown);
    assert_eq!(rows[2].badge().unwrap().indicator, Indicator::Danger);
    assert_eq!(
        rows[2].badge().unwrap().tooltip.as_deref(),
        Some("Phishing (97.5%)")
    );
}

#[tokio::test]
async fn test_annotator_reads_cached_snapshot() {
    let store = SnapshotStore::in_memory().await.unwrap();
    let poller = Poller::new(FixedSource, store.clone(), HostContext::new());
    poller.poll_once().await;
    store.mark_offline().await.unwrap();

    let mut page = inbox();
    let report = Annotator::from_store(&store)
        .await
        .unwrap()
        .scan(&mut page);

    assert_eq!(report.danger, 2);
    assert_eq!(report.by_id, 1);
    assert_eq!(report.by_text, 1);
    assert_eq!(report.unknown, 1);
}
