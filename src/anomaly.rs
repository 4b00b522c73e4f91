//! Statistical and timeline anomaly detection
//!
//! Looks for three anomaly families over a finding set: timeline
//! impossibilities (contradictory date ranges such as concurrent
//! employments), statistical outliers against a typical subject profile,
//! and credential inflation. Per-anomaly likelihoods roll up into one
//! deception-likelihood score using weighted-max-with-reinforcement: the
//! dominant anomaly sets a floor and co-occurring anomalies add a bounded
//! bonus.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::AnomalyConfig;
use crate::core::{Finding, FindingCategory, Severity};

static CREDENTIAL_MISMATCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)unverifi|fabricat|diploma mill|inflat|claimed").expect("static pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyType {
    TimelineConflict,
    StatisticalOutlier,
    CredentialInflation,
}

impl AnomalyType {
    pub fn display_name(self) -> &'static str {
        match self {
            AnomalyType::TimelineConflict => "timeline conflict",
            AnomalyType::StatisticalOutlier => "statistical outlier",
            AnomalyType::CredentialInflation => "credential inflation",
        }
    }
}

/// One detected anomaly with its supporting evidence
///
/// Never constructed with an empty supporting set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    /// Ids of the findings supporting this anomaly, never empty
    pub supporting_findings: Vec<String>,
    /// Likelihood that this anomaly indicates deception, in [0, 1]
    pub likelihood: f64,
}

/// Aggregated deception estimate over all detected anomalies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeceptionAssessment {
    pub anomalies: Vec<Anomaly>,
    /// Combined deception likelihood, in [0, 1]
    pub deception_likelihood: f64,
}

impl DeceptionAssessment {
    pub fn empty() -> Self {
        Self {
            anomalies: Vec::new(),
            deception_likelihood: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    /// Confidence in the deception estimate, driven by evidence breadth
    pub fn confidence(&self) -> f64 {
        let supporting: usize = self
            .anomalies
            .iter()
            .map(|a| a.supporting_findings.len())
            .sum();
        // Two supporting findings already give reasonable confidence
        (0.4 + 0.15 * supporting as f64).min(0.95)
    }
}

/// Detector over an ordered finding set; pure given its configuration
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Detect all anomaly families and aggregate the deception likelihood
    pub fn detect(&self, findings: &[Finding]) -> DeceptionAssessment {
        let mut anomalies = Vec::new();
        anomalies.extend(self.detect_timeline_conflicts(findings));
        anomalies.extend(self.detect_statistical_outliers(findings));
        anomalies.extend(self.detect_credential_inflation(findings));

        let deception_likelihood = self.combine_likelihoods(&anomalies);
        DeceptionAssessment {
            anomalies,
            deception_likelihood,
        }
    }

    /// Dominant anomaly sets the floor; co-occurring anomalies add a
    /// bounded reinforcement bonus, clamped to 1.0
    fn combine_likelihoods(&self, anomalies: &[Anomaly]) -> f64 {
        if anomalies.is_empty() {
            return 0.0;
        }
        let dominant = anomalies
            .iter()
            .map(|a| a.likelihood)
            .fold(0.0, f64::max);
        let reinforcement: f64 =
            anomalies.iter().map(|a| a.likelihood).sum::<f64>() - dominant;
        (dominant + self.config.reinforcement_bonus * reinforcement).clamp(0.0, 1.0)
    }

    /// Overlapping date ranges within the employment category indicate
    /// contradictory concurrent engagements
    fn detect_timeline_conflicts(&self, findings: &[Finding]) -> Vec<Anomaly> {
        let dated: Vec<(&str, crate::core::DateRange)> = findings
            .iter()
            .filter(|f| f.category == FindingCategory::Employment)
            .filter_map(|f| f.date_range.map(|range| (f.id.as_str(), range)))
            .collect();

        let mut conflicts = Vec::new();
        for (i, (id_a, ra)) in dated.iter().enumerate() {
            for (id_b, rb) in dated.iter().skip(i + 1) {
                if ra.overlaps(rb) {
                    conflicts.push((id_a.to_string(), id_b.to_string()));
                }
            }
        }

        if conflicts.is_empty() {
            return Vec::new();
        }

        let mut supporting: Vec<String> = conflicts
            .into_iter()
            .flat_map(|(a, b)| [a, b])
            .collect();
        supporting.sort();
        supporting.dedup();
        let pair_count = supporting.len() / 2;

        vec![Anomaly {
            anomaly_type: AnomalyType::TimelineConflict,
            severity: Severity::High,
            likelihood: (0.6 + 0.1 * pair_count.saturating_sub(1) as f64).min(0.9),
            supporting_findings: supporting,
        }]
    }

    /// Finding density per category far beyond the typical subject profile
    fn detect_statistical_outliers(&self, findings: &[Finding]) -> Vec<Anomaly> {
        let mut by_category: HashMap<FindingCategory, Vec<&Finding>> = HashMap::new();
        for f in findings {
            by_category.entry(f.category).or_default().push(f);
        }

        let mut outliers: Vec<Anomaly> = by_category
            .into_iter()
            .filter(|(_, group)| group.len() >= self.config.outlier_category_count)
            .map(|(_, group)| {
                let excess = group.len() - self.config.outlier_category_count;
                Anomaly {
                    anomaly_type: AnomalyType::StatisticalOutlier,
                    severity: Severity::Medium,
                    likelihood: (0.4 + 0.1 * excess as f64).min(0.8),
                    supporting_findings: group.iter().map(|f| f.id.clone()).collect(),
                }
            })
            .collect();
        // Deterministic output order regardless of hash iteration
        outliers.sort_by(|a, b| a.supporting_findings.cmp(&b.supporting_findings));
        outliers
    }

    /// Claimed-versus-verified credential mismatch patterns
    fn detect_credential_inflation(&self, findings: &[Finding]) -> Vec<Anomaly> {
        let supporting: Vec<String> = findings
            .iter()
            .filter(|f| {
                f.category == FindingCategory::Education
                    && CREDENTIAL_MISMATCH.is_match(&f.subcategory)
            })
            .map(|f| f.id.clone())
            .collect();

        if supporting.is_empty() {
            return Vec::new();
        }

        let count = supporting.len();
        vec![Anomaly {
            anomaly_type: AnomalyType::CredentialInflation,
            severity: if count > 1 {
                Severity::High
            } else {
                Severity::Medium
            },
            likelihood: (0.5 + 0.15 * (count - 1) as f64).min(0.85),
            supporting_findings: supporting,
        }]
    }
}
