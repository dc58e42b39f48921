//! Messages exchanged between the poller, the annotator and the status panel.
//!
//! The JSON shape is `{"action": "...", ...}` with camelCase field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheStatus;
use crate::verdict::{EmailVerdict, Snapshot};

/// A message between contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    /// New snapshot available; observers should re-render.
    #[serde(rename_all = "camelCase")]
    UpdateWarnings {
        /// The new verdicts.
        emails: Vec<EmailVerdict>,
        /// Flagged count reported by the server.
        count: u64,
        /// Monitored count reported by the server.
        total_emails: u64,
    },
    /// Fetch now instead of waiting for the timer.
    ForceRefresh,
    /// Ask for the cached data.
    GetLatestData,
    /// Something in the cache changed; re-read it.
    DataUpdated,
}

impl Message {
    /// Build the change notification for a freshly stored snapshot.
    #[must_use]
    pub fn update_warnings(snapshot: &Snapshot) -> Self {
        Self::UpdateWarnings {
            emails: snapshot.emails.clone(),
            count: snapshot.total_count,
            total_emails: snapshot.total_emails,
        }
    }
}

/// Reply to [`Message::GetLatestData`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestData {
    /// Cached verdicts.
    pub emails: Vec<EmailVerdict>,
    /// Time of the last successful fetch.
    pub last_update: Option<DateTime<Utc>>,
    /// Monitored count.
    pub total_emails: u64,
    /// Whether the last fetch attempt succeeded.
    pub server_online: bool,
}

impl From<CacheStatus> for LatestData {
    fn from(status: CacheStatus) -> Self {
        Self {
            emails: status.emails,
            last_update: status.last_update,
            total_emails: status.total_emails,
            server_online: status.server_online,
        }
    }
}

/// Acknowledgement for commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Whether the command ran.
    pub success: bool,
    /// Human-readable outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Ack {
    /// Successful acknowledgement.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    /// Failed acknowledgement.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Reply to a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    /// Cached data.
    LatestData(LatestData),
    /// Command acknowledgement.
    Ack(Ack),
}
