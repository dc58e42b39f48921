//! Detail report for a single verdict.

use std::fmt::{self, Write as _};

use crate::verdict::EmailVerdict;

/// Plain-text detail view of one classified email.
#[derive(Debug, Clone, Copy)]
pub struct VerdictReport<'a> {
    verdict: &'a EmailVerdict,
}

impl<'a> VerdictReport<'a> {
    /// Wrap a verdict for display.
    #[must_use]
    pub const fn new(verdict: &'a EmailVerdict) -> Self {
        Self { verdict }
    }

    fn headline(&self) -> &'static str {
        match self.verdict.is_phishing {
            Some(true) => "PHISHING EMAIL DETECTED",
            Some(false) => "Email looks safe",
            None => "Email not classified",
        }
    }
}

fn or<'s>(value: &'s str, fallback: &'s str) -> &'s str {
    if value.is_empty() { fallback } else { value }
}

impl fmt::Display for VerdictReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.verdict;
        let level = v.threat_level.map_or("UNKNOWN", |t| t.as_str());

        let mut out = String::new();
        writeln!(out, "{}", self.headline())?;
        writeln!(
            out,
            "Threat Level: {level} ({:.1}% confidence)",
            v.confidence_percentage
        )?;
        writeln!(
            out,
            "Risk Score: {}/100 | Red Flags: {}",
            v.risk_score.unwrap_or(0),
            v.red_flags.len()
        )?;
        writeln!(out)?;
        writeln!(out, "From:    {}", or(&v.sender, "Unknown"))?;
        writeln!(out, "Subject: {}", or(&v.subject, "(No Subject)"))?;
        writeln!(out, "Date:    {}", v.date_received.as_deref().unwrap_or("Unknown"))?;
        if let Some(analyzed) = &v.analyzed_at {
            writeln!(out, "Analyzed: {analyzed}")?;
        }

        if !v.red_flags.is_empty() {
            writeln!(out, "\nSecurity Red Flags:")?;
            for flag in &v.red_flags {
                writeln!(out, "  [{}] {}: {}", flag.severity, flag.category, flag.flag)?;
                if !flag.description.is_empty() {
                    writeln!(out, "      {}", flag.description)?;
                }
            }
        }

        if !v.urls_found.is_empty() {
            writeln!(out, "\nSuspicious URLs Found ({}):", v.url_total())?;
            for url in &v.urls_found {
                writeln!(out, "  {url}  (do not click)")?;
            }
        }

        if !v.recommendations.is_empty() {
            writeln!(out, "\nRecommended Actions:")?;
            for rec in &v.recommendations {
                writeln!(out, "  [{}] {}", rec.priority, rec.action)?;
                if !rec.description.is_empty() {
                    writeln!(out, "      {}", rec.description)?;
                }
            }
        }

        f.write_str(out.trim_end())
    }
}
