//! Human-readable rendering of the aggregation trail
//!
//! Thin presentation layer over the assessment: the ordered adjustment
//! trail as display rows, a severity/category distribution, and a
//! one-line summary naming the primary factor. Redaction and report
//! formatting happen downstream.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregation::ComprehensiveRiskAssessment;
use crate::classify::ClassifiedFinding;

/// One adjustment rendered for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactorDisplay {
    pub label: String,
    pub delta: f64,
    pub weight: f64,
    pub confidence: f64,
}

/// Finding counts per severity and category
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub by_severity: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub total_findings: usize,
}

/// Explainable view over one assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskExplanation {
    pub summary: String,
    pub factors: Vec<RiskFactorDisplay>,
    pub distribution: RiskDistribution,
}

/// Render an assessment and its findings into an explanation
pub fn explain(
    assessment: &ComprehensiveRiskAssessment,
    classified: &[ClassifiedFinding],
) -> RiskExplanation {
    let factors: Vec<RiskFactorDisplay> = assessment
        .adjustments
        .iter()
        .map(|a| RiskFactorDisplay {
            label: format!("{} ({})", a.signal_id, a.kind.display_name()),
            delta: a.delta,
            weight: a.weight,
            confidence: a.confidence,
        })
        .collect();

    RiskExplanation {
        summary: summarize(assessment, &factors),
        factors,
        distribution: distribution(classified),
    }
}

fn summarize(
    assessment: &ComprehensiveRiskAssessment,
    factors: &[RiskFactorDisplay],
) -> String {
    if assessment.insufficient_evidence {
        return "Insufficient evidence: no findings and no prior history.".to_string();
    }
    let mut summary = format!(
        "Risk {:.2} ({}), confidence {:.2}, recommendation: {}.",
        assessment.final_score,
        assessment.risk_level.display_name(),
        assessment.confidence,
        assessment.recommendation.display_name()
    );
    if let Some(primary) = factors.iter().max_by(|a, b| {
        a.delta
            .partial_cmp(&b.delta)
            .unwrap_or(std::cmp::Ordering::Equal)
    }) {
        summary.push_str(&format!(
            " Primary factor: {} (+{:.2}).",
            primary.label, primary.delta
        ));
    }
    summary
}

fn distribution(classified: &[ClassifiedFinding]) -> RiskDistribution {
    let mut by_severity: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    for c in classified {
        *by_severity
            .entry(c.severity.severity.display_name().to_string())
            .or_insert(0) += 1;
        *by_category
            .entry(c.category.display_name().to_string())
            .or_insert(0) += 1;
    }
    RiskDistribution {
        by_severity,
        by_category,
        total_findings: classified.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{AggregationInputs, RiskAggregator};
    use crate::anomaly::DeceptionAssessment;
    use crate::classify::FindingClassifier;
    use crate::connections::ConnectionAnalysisResult;
    use crate::core::{Finding, FindingCategory, RoleCategory, Severity};
    use crate::patterns::PatternSummary;
    use chrono::{TimeZone, Utc};

    #[test]
    fn explanation_names_primary_factor() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let classifier = FindingClassifier::new();
        let findings = vec![
            Finding::new("f1", FindingCategory::Criminal, Severity::High, 0.9, at),
            Finding::new("f2", FindingCategory::Financial, Severity::Medium, 0.8, at),
        ];
        let classified: Vec<_> = findings
            .iter()
            .map(|f| classifier.classify(f, RoleCategory::General, at))
            .collect();

        let anomalies = DeceptionAssessment {
            anomalies: vec![crate::anomaly::Anomaly {
                anomaly_type: crate::anomaly::AnomalyType::TimelineConflict,
                severity: Severity::High,
                supporting_findings: vec!["f1".to_string(), "f2".to_string()],
                likelihood: 0.7,
            }],
            deception_likelihood: 0.7,
        };
        let patterns = PatternSummary::default();
        let connections = ConnectionAnalysisResult::empty();
        let assessment = RiskAggregator::default().aggregate(&AggregationInputs {
            classified: &classified,
            anomalies: &anomalies,
            patterns: &patterns,
            connections: &connections,
            evaluated_at: at,
        });

        let explanation = explain(&assessment, &classified);
        assert_eq!(explanation.factors.len(), 1);
        assert!(explanation.summary.contains("anomaly:deception-likelihood"));
        assert_eq!(explanation.distribution.total_findings, 2);
        assert_eq!(explanation.distribution.by_category["criminal"], 1);
    }

    #[test]
    fn insufficient_evidence_summary() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let assessment = RiskAggregator::default().aggregate(&AggregationInputs {
            classified: &[],
            anomalies: &DeceptionAssessment::empty(),
            patterns: &PatternSummary::default(),
            connections: &ConnectionAnalysisResult::empty(),
            evaluated_at: at,
        });
        let explanation = explain(&assessment, &[]);
        assert!(explanation.summary.contains("Insufficient evidence"));
        assert!(explanation.factors.is_empty());
    }
}
