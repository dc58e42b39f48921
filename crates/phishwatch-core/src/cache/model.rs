//! Cache data models.

use chrono::{DateTime, Utc};

use crate::verdict::EmailVerdict;

/// Keys of the flat key-value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey {
    /// JSON array of verdicts.
    FlaggedEmails,
    /// RFC 3339 timestamp of the last successful fetch.
    LastUpdate,
    /// Number of flagged emails reported by the server.
    TotalCount,
    /// Number of monitored emails reported by the server.
    TotalEmails,
    /// Whether the last fetch attempt succeeded.
    ServerOnline,
}

impl CacheKey {
    /// Every key, in the order they are written.
    pub const ALL: [Self; 5] = [
        Self::FlaggedEmails,
        Self::LastUpdate,
        Self::TotalCount,
        Self::TotalEmails,
        Self::ServerOnline,
    ];

    /// Stored key name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FlaggedEmails => "flaggedEmails",
            Self::LastUpdate => "lastUpdate",
            Self::TotalCount => "totalCount",
            Self::TotalEmails => "totalEmails",
            Self::ServerOnline => "serverOnline",
        }
    }
}

/// Everything the cache currently knows, with defaults for missing keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheStatus {
    /// Cached verdicts (empty when never fetched or cleared).
    pub emails: Vec<EmailVerdict>,
    /// Time of the last successful fetch.
    pub last_update: Option<DateTime<Utc>>,
    /// Flagged count reported by the server, if any.
    pub total_count: Option<u64>,
    /// Monitored count reported by the server.
    pub total_emails: u64,
    /// Whether the last fetch attempt succeeded.
    pub server_online: bool,
}

impl CacheStatus {
    /// Whether the cache holds any verdicts.
    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.emails.is_empty()
    }
}
