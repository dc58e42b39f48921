//! Verdict data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discrete severity bucket assigned by the remote classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    /// No threat detected.
    Safe,
    /// Minor indicators only.
    Low,
    /// Suspicious, needs a second look.
    Medium,
    /// Likely phishing.
    High,
    /// Confirmed phishing.
    Critical,
}

impl ThreatLevel {
    /// Parse the wire representation. Unknown levels yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SAFE" => Some(Self::Safe),
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Accent color used by detail views.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Critical => "#dc3545",
            Self::High => "#fd7e14",
            Self::Medium => "#ffc107",
            Self::Low | Self::Safe => "#28a745",
        }
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single warning sign found by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RedFlag {
    /// Severity label (e.g. `HIGH`).
    pub severity: String,
    /// Category label (e.g. `URL`, `SENDER`).
    pub category: String,
    /// Short title of the flag.
    #[serde(default)]
    pub flag: String,
    /// Longer explanation.
    pub description: String,
}

/// A suggested action for the reader of a flagged email.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recommendation {
    /// Priority label (e.g. `IMMEDIATE`).
    pub priority: String,
    /// What to do.
    pub action: String,
    /// Why.
    pub description: String,
}

/// Classification of one email, as produced by the remote API.
///
/// Verdicts are immutable once received. String identifiers that were
/// missing on the wire are stored empty; empty fields never match anything.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailVerdict {
    /// Opaque identifier assigned by the mail provider.
    pub email_id: String,
    /// Sender address or display string.
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// `Some(true)` for phishing, `Some(false)` for safe, `None` when unknown.
    pub is_phishing: Option<bool>,
    /// Classifier confidence in percent, clamped to `0..=100`.
    pub confidence_percentage: f64,
    /// Severity bucket, if the classifier assigned a known one.
    pub threat_level: Option<ThreatLevel>,
    /// URLs extracted from the body.
    #[serde(default)]
    pub urls_found: Vec<String>,
    /// Warning signs.
    #[serde(default)]
    pub red_flags: Vec<RedFlag>,
    /// Suggested actions.
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    /// Number of URLs reported by the classifier.
    #[serde(default)]
    pub url_count: Option<u32>,
    /// Aggregate risk score (0-100).
    #[serde(default)]
    pub risk_score: Option<u32>,
    /// When the email was received, as reported by the provider.
    #[serde(default)]
    pub date_received: Option<String>,
    /// When the classifier analyzed the email.
    #[serde(default)]
    pub analyzed_at: Option<String>,
}

impl EmailVerdict {
    /// Number of URLs in this email, preferring the classifier's own count.
    #[must_use]
    pub fn url_total(&self) -> u64 {
        self.url_count
            .map_or(self.urls_found.len() as u64, u64::from)
    }
}

/// Aggregate counts over a list of verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Breakdown {
    /// Verdicts with `is_phishing == Some(true)`.
    pub phishing: usize,
    /// Verdicts with `is_phishing == Some(false)`.
    pub safe: usize,
    /// Everything else.
    pub other: usize,
}

impl Breakdown {
    /// Count phishing, safe and undetermined verdicts.
    #[must_use]
    pub fn of(emails: &[EmailVerdict]) -> Self {
        let phishing = emails.iter().filter(|e| e.is_phishing == Some(true)).count();
        let safe = emails.iter().filter(|e| e.is_phishing == Some(false)).count();
        Self {
            phishing,
            safe,
            other: emails.len() - phishing - safe,
        }
    }
}

/// The complete set of classified emails as of the last successful fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    /// Classified emails, in server order.
    pub emails: Vec<EmailVerdict>,
    /// Server timestamp of the fetch.
    pub fetched_at: DateTime<Utc>,
    /// Number of flagged emails reported by the server.
    pub total_count: u64,
    /// Number of emails the server has monitored in total.
    pub total_emails: u64,
    /// Whether the last fetch attempt succeeded.
    pub online: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threat_level_parse() {
        assert_eq!(ThreatLevel::parse("HIGH"), Some(ThreatLevel::High));
        assert_eq!(ThreatLevel::parse(" critical "), Some(ThreatLevel::Critical));
        assert_eq!(ThreatLevel::parse("severe"), None);
        assert_eq!(ThreatLevel::parse(""), None);
    }

    #[test]
    fn test_threat_level_serde_uppercase() {
        let json = serde_json::to_string(&ThreatLevel::Medium).unwrap_or_default();
        assert_eq!(json, "\"MEDIUM\"");
    }

    #[test]
    fn test_url_total_prefers_reported_count() {
        let mut verdict = EmailVerdict {
            urls_found: vec!["http://a".into(), "http://b".into()],
            ..Default::default()
        };
        assert_eq!(verdict.url_total(), 2);

        verdict.url_count = Some(7);
        assert_eq!(verdict.url_total(), 7);
    }

    #[test]
    fn test_breakdown() {
        let emails = vec![
            EmailVerdict {
                is_phishing: Some(true),
                ..Default::default()
            },
            EmailVerdict {
                is_phishing: Some(false),
                ..Default::default()
            },
            EmailVerdict::default(),
        ];
        let breakdown = Breakdown::of(&emails);
        assert_eq!(breakdown.phishing, 1);
        assert_eq!(breakdown.safe, 1);
        assert_eq!(breakdown.other, 1);
    }
}
