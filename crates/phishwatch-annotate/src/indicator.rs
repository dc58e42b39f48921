//! Status indicators rendered next to inbox rows.

use phishwatch_core::{EmailVerdict, ThreatLevel};

/// CSS class shared by every rendered indicator.
pub const BADGE_CLASS: &str = "phishing-threat-circle";

/// Color bucket of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// Green.
    Safe,
    /// Red.
    Danger,
    /// Yellow.
    Warning,
    /// Neutral; no verdict or an undetermined one.
    Unknown,
}

impl Indicator {
    /// Map a matched verdict (or its absence) to a color bucket.
    ///
    /// Safe signals are checked first, then danger, then `MEDIUM`.
    #[must_use]
    pub fn classify(verdict: Option<&EmailVerdict>) -> Self {
        let Some(v) = verdict else {
            return Self::Unknown;
        };

        if v.is_phishing == Some(false)
            || matches!(v.threat_level, Some(ThreatLevel::Safe | ThreatLevel::Low))
        {
            Self::Safe
        } else if v.is_phishing == Some(true)
            || matches!(
                v.threat_level,
                Some(ThreatLevel::High | ThreatLevel::Critical)
            )
        {
            Self::Danger
        } else if v.threat_level == Some(ThreatLevel::Medium) {
            Self::Warning
        } else {
            Self::Unknown
        }
    }

    /// Modifier class added next to [`BADGE_CLASS`].
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Danger => "danger",
            Self::Warning => "warning",
            Self::Unknown => "unknown",
        }
    }

    /// Fill color.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Safe => "#28a745",
            Self::Danger => "#dc3545",
            Self::Warning => "#ffc107",
            Self::Unknown => "#ffffff",
        }
    }

    /// Short label for text output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Danger => "PHISHING",
            Self::Warning => "SUSPICIOUS",
            Self::Unknown => "NO DATA",
        }
    }
}

/// One rendered indicator: a color and an optional hover text.
#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    /// Color bucket.
    pub indicator: Indicator,
    /// Hover text, if any.
    pub tooltip: Option<String>,
}

impl Badge {
    /// Build the badge for a row given its matched verdict.
    #[must_use]
    pub fn for_verdict(verdict: Option<&EmailVerdict>) -> Self {
        let indicator = Indicator::classify(verdict);
        let tooltip = match (verdict, indicator) {
            (None, _) => Some("Not analyzed yet".to_string()),
            (Some(v), Indicator::Safe) => Some(format!("Safe ({:.1}%)", v.confidence_percentage)),
            (Some(v), Indicator::Danger) => {
                Some(format!("Phishing ({:.1}%)", v.confidence_percentage))
            }
            (Some(v), Indicator::Warning) => {
                Some(format!("Suspicious ({:.1}%)", v.confidence_percentage))
            }
            (Some(_), Indicator::Unknown) => None,
        };
        Self { indicator, tooltip }
    }

    /// Full class attribute of the rendered element.
    #[must_use]
    pub fn class_list(&self) -> String {
        format!("{BADGE_CLASS} {}", self.indicator.css_class())
    }
}
