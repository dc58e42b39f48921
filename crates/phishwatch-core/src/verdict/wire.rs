//! Wire format of the remote classification API.
//!
//! The API is not under our control. The envelope is decoded strictly, but
//! each email record is read field by field from raw JSON so that one odd
//! record cannot take the rest of the snapshot down with it.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::model::{EmailVerdict, RedFlag, Recommendation, Snapshot, ThreatLevel};
use crate::{Error, Result};

/// Body of `GET /api/emails`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    /// Whether the server considers the payload valid.
    #[serde(default)]
    pub success: bool,
    /// Classified emails, still as raw JSON records.
    #[serde(default)]
    pub emails: Option<Vec<Value>>,
    /// RFC 3339 time the server produced the payload.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Number of flagged emails.
    #[serde(default)]
    pub count: Option<Value>,
    /// Number of emails monitored in total.
    #[serde(default)]
    pub total_emails: Option<Value>,
}

impl ApiResponse {
    /// Decode a response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if the body is not a JSON object of the
    /// expected shape.
    pub fn from_body(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| Error::Malformed(e.to_string()))
    }

    /// Flagged count as reported, if it is a usable number.
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        self.count.as_ref().and_then(whole_number)
    }

    /// Validate the payload and convert it into a fresh, online snapshot.
    ///
    /// Records that are not JSON objects are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] when `success` is false or no email list
    /// was sent.
    pub fn into_snapshot(self, received_at: DateTime<Utc>) -> Result<Snapshot> {
        if !self.success {
            return Err(Error::Rejected);
        }
        let count = self.count();
        let total_emails = self.total_emails.as_ref().and_then(whole_number);
        let Some(records) = self.emails else {
            return Err(Error::Rejected);
        };

        let emails: Vec<EmailVerdict> = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let verdict = record.as_object().map(verdict_from_record);
                if verdict.is_none() {
                    warn!(index, "Skipping email record that is not an object");
                }
                verdict
            })
            .collect();

        let fetched_at = self
            .timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map_or(received_at, |ts| ts.with_timezone(&Utc));

        Ok(Snapshot {
            total_count: count.unwrap_or(emails.len() as u64),
            total_emails: total_emails.unwrap_or(0),
            emails,
            fetched_at,
            online: true,
        })
    }
}

/// Strings are trimmed; numbers are accepted as their decimal text.
fn text(record: &Map<String, Value>, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn optional_text(record: &Map<String, Value>, key: &str) -> Option<String> {
    Some(text(record, key)).filter(|s| !s.is_empty())
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn whole_number(value: &Value) -> Option<u64> {
    number(value)
        .filter(|n| *n >= 0.0)
        .map(|n| n.round().min(u64::MAX as f64) as u64)
}

fn small_number(record: &Map<String, Value>, key: &str) -> Option<u32> {
    record
        .get(key)
        .and_then(whole_number)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

fn flag(record: &Map<String, Value>, key: &str) -> Option<bool> {
    match record.get(key) {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn objects<'a>(
    record: &'a Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> {
    record
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn verdict_from_record(record: &Map<String, Value>) -> EmailVerdict {
    let confidence = record
        .get("confidence_percentage")
        .and_then(number)
        .or_else(|| record.get("confidence").and_then(number).map(|c| c * 100.0))
        .unwrap_or(0.0)
        .clamp(0.0, 100.0);

    EmailVerdict {
        email_id: text(record, "email_id"),
        sender: text(record, "sender"),
        subject: text(record, "subject"),
        is_phishing: flag(record, "is_phishing"),
        confidence_percentage: confidence,
        threat_level: record
            .get("threat_level")
            .and_then(Value::as_str)
            .and_then(ThreatLevel::parse),
        urls_found: record
            .get("urls_found")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        red_flags: objects(record, "red_flags")
            .map(|f| RedFlag {
                severity: text(f, "severity"),
                category: text(f, "category"),
                flag: text(f, "flag"),
                description: text(f, "description"),
            })
            .collect(),
        recommendations: objects(record, "recommendations")
            .map(|r| Recommendation {
                priority: text(r, "priority"),
                action: text(r, "action"),
                description: text(r, "description"),
            })
            .collect(),
        url_count: small_number(record, "url_count"),
        risk_score: small_number(record, "risk_score"),
        date_received: optional_text(record, "date_received"),
        analyzed_at: optional_text(record, "analyzed_at"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_full_payload() {
        let body = r#"{
            "success": true,
            "emails": [{
                "email_id": "abc123",
                "sender": "billing@paypa1.com",
                "subject": "Verify your account",
                "is_phishing": true,
                "confidence_percentage": 97.5,
                "threat_level": "HIGH",
                "urls_found": ["http://paypa1.com/login"],
                "red_flags": [{"severity": "HIGH", "category": "URL", "flag": "Lookalike domain", "description": "paypa1 vs paypal"}],
                "recommendations": [{"priority": "IMMEDIATE", "action": "Do not click", "description": "Delete the email"}]
            }],
            "timestamp": "2026-01-24T10:00:00Z",
            "count": 1,
            "total_emails": 40
        }"#;

        let snapshot = ApiResponse::from_body(body)
            .unwrap()
            .into_snapshot(Utc::now())
            .unwrap();

        assert!(snapshot.online);
        assert_eq!(snapshot.total_count, 1);
        assert_eq!(snapshot.total_emails, 40);
        assert_eq!(snapshot.fetched_at.to_rfc3339(), "2026-01-24T10:00:00+00:00");

        let verdict = &snapshot.emails[0];
        assert_eq!(verdict.email_id, "abc123");
        assert_eq!(verdict.is_phishing, Some(true));
        assert_eq!(verdict.threat_level, Some(ThreatLevel::High));
        assert_eq!(verdict.red_flags[0].flag, "Lookalike domain");
        assert_eq!(verdict.recommendations[0].action, "Do not click");
    }

    #[test]
    fn test_missing_fields_fail_closed() {
        let body = r#"{"success": true, "emails": [{"threat_level": "apocalyptic"}]}"#;
        let received = Utc::now();
        let snapshot = ApiResponse::from_body(body)
            .unwrap()
            .into_snapshot(received)
            .unwrap();

        let verdict = &snapshot.emails[0];
        assert!(verdict.email_id.is_empty());
        assert!(verdict.sender.is_empty());
        assert_eq!(verdict.is_phishing, None);
        assert_eq!(verdict.threat_level, None);
        assert_eq!(snapshot.total_count, 1);
        assert_eq!(snapshot.fetched_at, received);
    }

    #[test]
    fn test_confidence_fallback_and_clamp() {
        let body = r#"{"success": true, "emails": [
            {"email_id": "a", "confidence": 0.42},
            {"email_id": "b", "confidence_percentage": 180.0}
        ]}"#;
        let snapshot = ApiResponse::from_body(body)
            .unwrap()
            .into_snapshot(Utc::now())
            .unwrap();

        assert!((snapshot.emails[0].confidence_percentage - 42.0).abs() < 1e-9);
        assert!((snapshot.emails[1].confidence_percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_success_false_is_rejected() {
        let body = r#"{"success": false, "emails": []}"#;
        let result = ApiResponse::from_body(body).unwrap().into_snapshot(Utc::now());
        assert!(matches!(result, Err(Error::Rejected)));
    }

    #[test]
    fn test_missing_emails_is_rejected() {
        let body = r#"{"success": true}"#;
        let result = ApiResponse::from_body(body).unwrap().into_snapshot(Utc::now());
        assert!(matches!(result, Err(Error::Rejected)));
    }

    #[test]
    fn test_odd_record_does_not_sink_the_snapshot() {
        let body = r#"{"success": true, "count": 2.0, "emails": [
            {"email_id": "abc123", "is_phishing": true, "threat_level": "HIGH"},
            {"email_id": "x", "risk_score": 72.5, "url_count": "3"},
            {"email_id": 12345, "is_phishing": "false"},
            "not a record",
            {"email_id": "y", "urls_found": ["http://a.example", 7], "red_flags": [null, {"flag": "Urgency"}]}
        ]}"#;
        let snapshot = ApiResponse::from_body(body)
            .unwrap()
            .into_snapshot(Utc::now())
            .unwrap();

        assert_eq!(snapshot.total_count, 2);
        assert_eq!(snapshot.emails.len(), 4);

        let good = &snapshot.emails[0];
        assert_eq!(good.email_id, "abc123");
        assert_eq!(good.is_phishing, Some(true));
        assert_eq!(good.threat_level, Some(ThreatLevel::High));

        assert_eq!(snapshot.emails[1].risk_score, Some(73));
        assert_eq!(snapshot.emails[1].url_count, Some(3));
        assert_eq!(snapshot.emails[2].email_id, "12345");
        assert_eq!(snapshot.emails[2].is_phishing, Some(false));
        assert_eq!(snapshot.emails[3].urls_found, vec!["http://a.example"]);
        assert_eq!(snapshot.emails[3].red_flags.len(), 1);
        assert_eq!(snapshot.emails[3].red_flags[0].flag, "Urgency");
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            ApiResponse::from_body("<html>502 Bad Gateway</html>"),
            Err(Error::Malformed(_))
        ));
        assert!(matches!(
            ApiResponse::from_body(r#"{"success": true, "emails": "nope"}"#),
            Err(Error::Malformed(_))
        ));
    }
}
