//! Property tests for snapshot replacement semantics.

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use proptest::prelude::*;

use phishwatch_core::{EmailVerdict, Snapshot, SnapshotStore};

fn snapshot(ids: &[String]) -> Snapshot {
    Snapshot {
        emails: ids
            .iter()
            .map(|id| EmailVerdict {
                email_id: id.clone(),
                ..Default::default()
            })
            .collect(),
        fetched_at: Utc::now(),
        total_count: ids.len() as u64,
        total_emails: 0,
        online: true,
    }
}

/// A step is either a successful fetch with the given ids or a failed one.
fn steps() -> impl Strategy<Value = Vec<Option<Vec<String>>>> {
    prop::collection::vec(
        prop::option::of(prop::collection::vec("[a-z0-9]{1,12}", 0..6)),
        1..8,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cache_holds_exactly_the_last_successful_list(steps in steps()) {
        tokio_test::block_on(async {
            let store = SnapshotStore::in_memory().await.unwrap();
            let mut expected: Option<Vec<String>> = None;
            let mut last_ok = false;

            for step in &steps {
                match step {
                    Some(ids) => {
                        store.replace_snapshot(&snapshot(ids)).await.unwrap();
                        expected = Some(ids.clone());
                        last_ok = true;
                    }
                    None => {
                        store.mark_offline().await.unwrap();
                        last_ok = false;
                    }
                }
            }

            let loaded = store.load_snapshot().await.unwrap();
            match expected {
                Some(ids) => {
                    let loaded = loaded.unwrap();
                    let got: Vec<String> = loaded.emails.into_iter().map(|e| e.email_id).collect();
                    assert_eq!(got, ids);
                    assert_eq!(loaded.online, last_ok);
                }
                None => assert!(loaded.is_none()),
            }
        });
    }
}
