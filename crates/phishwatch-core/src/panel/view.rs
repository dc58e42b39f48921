//! Display projection of the cache.

use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::cache::CacheStatus;

/// Whether the remote API answered the last fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    /// Last fetch succeeded.
    Active,
    /// Last fetch failed or never happened.
    Inactive,
}

impl ServiceStatus {
    /// Status line shown in the panel.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active - Monitoring Gmail",
            Self::Inactive => "Inactive - API Unreachable",
        }
    }
}

/// What the "Last Update" line shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastUpdate {
    /// Nothing cached yet.
    Waiting,
    /// The cache was just cleared.
    Cleared,
    /// Time of the last successful fetch.
    At(DateTime<Utc>),
}

impl LastUpdate {
    /// Render in the given time zone.
    #[must_use]
    pub fn render_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: fmt::Display,
    {
        match self {
            Self::Waiting => "Waiting for data...".to_string(),
            Self::Cleared => "Cache cleared".to_string(),
            Self::At(ts) => ts
                .with_timezone(tz)
                .format("%H:%M:%S on %Y-%m-%d")
                .to_string(),
        }
    }
}

/// Severity of a one-off panel notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Informational.
    Info,
    /// A command succeeded.
    Success,
    /// A command failed.
    Error,
}

/// A one-off message shown above the counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Text.
    pub text: String,
}

impl Notice {
    /// Informational notice.
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    /// Success notice.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    /// Error notice.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// Everything the status panel displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    /// Online/offline line.
    pub status: ServiceStatus,
    /// Number of flagged emails.
    pub flagged_count: u64,
    /// Number of URLs across flagged emails.
    pub total_urls: u64,
    /// Last update line.
    pub last_update: LastUpdate,
    /// Optional notice.
    pub notice: Option<Notice>,
}

impl PanelView {
    /// Project the cache into a view.
    #[must_use]
    pub fn from_status(status: &CacheStatus) -> Self {
        let service = if status.server_online {
            ServiceStatus::Active
        } else {
            ServiceStatus::Inactive
        };

        if !status.has_data() {
            return Self {
                status: service,
                flagged_count: 0,
                total_urls: 0,
                last_update: LastUpdate::Waiting,
                notice: Some(Notice::info("No flagged emails yet. Monitoring active...")),
            };
        }

        Self {
            status: service,
            flagged_count: status
                .total_count
                .filter(|&count| count > 0)
                .unwrap_or(status.emails.len() as u64),
            total_urls: status.emails.iter().map(|e| e.url_total()).sum(),
            last_update: status.last_update.map_or(LastUpdate::Waiting, LastUpdate::At),
            notice: None,
        }
    }

    /// Replace the notice.
    #[must_use]
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    /// Render the panel with times in the given zone.
    #[must_use]
    pub fn render_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: fmt::Display,
    {
        let mut out = String::new();
        if let Some(notice) = &self.notice {
            let marker = match notice.kind {
                NoticeKind::Info => "i",
                NoticeKind::Success => "+",
                NoticeKind::Error => "!",
            };
            out.push_str(&format!("[{marker}] {}\n", notice.text));
        }
        out.push_str(&format!("Status:       {}\n", self.status.label()));
        out.push_str(&format!("Flagged:      {}\n", self.flagged_count));
        out.push_str(&format!("URLs:         {}\n", self.total_urls));
        out.push_str(&format!("Last Update:  {}", self.last_update.render_in(tz)));
        out
    }
}

impl fmt::Display for PanelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_in(&Local))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::verdict::EmailVerdict;

    fn at(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_empty_cache_waits_for_data() {
        let view = PanelView::from_status(&CacheStatus::default());
        assert_eq!(view.flagged_count, 0);
        assert_eq!(view.total_urls, 0);
        assert_eq!(view.status, ServiceStatus::Inactive);

        let text = view.render_in(&Utc);
        assert!(text.contains("Waiting for data..."));
        assert!(text.contains("No flagged emails yet. Monitoring active..."));
    }

    #[test]
    fn test_counts_and_timestamp() {
        let status = CacheStatus {
            emails: vec![
                EmailVerdict {
                    url_count: Some(3),
                    ..Default::default()
                },
                EmailVerdict {
                    urls_found: vec!["http://a".into()],
                    ..Default::default()
                },
            ],
            last_update: Some(at("2026-01-24T10:05:09Z")),
            total_count: Some(5),
            total_emails: 40,
            server_online: true,
        };

        let view = PanelView::from_status(&status);
        assert_eq!(view.flagged_count, 5);
        assert_eq!(view.total_urls, 4);
        assert_eq!(view.status, ServiceStatus::Active);
        assert_eq!(view.notice, None);

        let text = view.render_in(&Utc);
        assert!(text.contains("Active - Monitoring Gmail"));
        assert!(text.contains("10:05:09 on 2026-01-24"));
    }

    #[test]
    fn test_flagged_count_falls_back_to_list_length() {
        let status = CacheStatus {
            emails: vec![EmailVerdict::default(); 2],
            total_count: Some(0),
            ..Default::default()
        };
        assert_eq!(PanelView::from_status(&status).flagged_count, 2);
    }

    #[test]
    fn test_offline_with_cached_data() {
        let status = CacheStatus {
            emails: vec![EmailVerdict::default()],
            server_online: false,
            ..Default::default()
        };
        let text = PanelView::from_status(&status).render_in(&Utc);
        assert!(text.contains("Inactive - API Unreachable"));
        assert!(text.contains("Flagged:      1"));
    }
}
