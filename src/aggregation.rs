//! Weighted multi-source risk aggregation
//!
//! Combines the base severity score of the classified findings with
//! anomaly, pattern, and connection adjustments. Each adjustment carries
//! its source signal id, weight, and confidence so the full trail stays
//! explainable. The base curve is a saturating exponential: more findings
//! always increase the score, with diminishing returns, and the result
//! never leaves [0, 1].

use chrono::{DateTime, Utc};
use im::Vector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::anomaly::DeceptionAssessment;
use crate::classify::ClassifiedFinding;
use crate::config::{AggregationConfig, SignalWeights, SYSTEM_DEFAULT_THRESHOLDS};
use crate::connections::ConnectionAnalysisResult;
use crate::core::{Recommendation, RiskLevel, Severity};
use crate::patterns::PatternSummary;

/// Floor used when combining confidences so a zero-confidence signal
/// cannot collapse the geometric mean to exactly zero
const CONFIDENCE_EPSILON: f64 = 0.01;

/// Signal class an adjustment originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    Anomaly,
    Pattern,
    Connection,
}

impl SignalKind {
    pub fn display_name(self) -> &'static str {
        match self {
            SignalKind::Anomaly => "anomaly",
            SignalKind::Pattern => "pattern",
            SignalKind::Connection => "connection",
        }
    }
}

/// One traceable adjustment applied on top of the base score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAdjustment {
    /// Non-empty id of the signal that produced this adjustment
    pub signal_id: String,
    pub kind: SignalKind,
    pub weight: f64,
    pub confidence: f64,
    /// Delta applied to the base score
    pub delta: f64,
}

/// The aggregated, explainable risk verdict for one subject evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveRiskAssessment {
    pub base_score: f64,
    /// Ordered adjustment trail, anomaly then pattern then connection
    pub adjustments: Vector<RiskAdjustment>,
    pub final_score: f64,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub recommendation: Recommendation,
    /// Saturating per-category base scores, for temporal category deltas
    pub category_scores: BTreeMap<String, f64>,
    /// Whether the verdict rests on no evidence at all
    pub insufficient_evidence: bool,
    pub evaluated_at: DateTime<Utc>,
}

/// Inputs to one aggregation call; all produced upstream
#[derive(Debug, Clone)]
pub struct AggregationInputs<'a> {
    pub classified: &'a [ClassifiedFinding],
    pub anomalies: &'a DeceptionAssessment,
    pub patterns: &'a PatternSummary,
    pub connections: &'a ConnectionAnalysisResult,
    pub evaluated_at: DateTime<Utc>,
}

/// Aggregator; pure over (inputs, configuration)
#[derive(Debug, Clone, Default)]
pub struct RiskAggregator {
    weights: SignalWeights,
    config: AggregationConfig,
}

impl RiskAggregator {
    pub fn new(weights: SignalWeights, config: AggregationConfig) -> Self {
        Self { weights, config }
    }

    pub fn aggregate(&self, inputs: &AggregationInputs) -> ComprehensiveRiskAssessment {
        if inputs.classified.is_empty()
            && inputs.anomalies.is_empty()
            && inputs.patterns.is_empty()
            && inputs.connections.is_empty()
        {
            return self.insufficient_evidence_assessment(inputs.evaluated_at);
        }

        let base_score = self.base_score(inputs.classified);
        let adjustments = self.collect_adjustments(inputs);
        let final_score = (base_score + adjustments.iter().map(|a| a.delta).sum::<f64>())
            .clamp(0.0, 1.0);
        let confidence = self.combine_confidence(inputs, &adjustments);
        let recommendation = self.recommend(final_score, inputs.classified);

        ComprehensiveRiskAssessment {
            base_score,
            final_score,
            confidence,
            risk_level: SYSTEM_DEFAULT_THRESHOLDS.classify(final_score),
            recommendation,
            category_scores: self.category_scores(inputs.classified),
            adjustments: adjustments.into(),
            insufficient_evidence: false,
            evaluated_at: inputs.evaluated_at,
        }
    }

    /// Saturating base score: monotone in added findings, bounded by 1.0
    fn base_score(&self, classified: &[ClassifiedFinding]) -> f64 {
        let mass: f64 = classified.iter().map(|c| c.weighted_severity()).sum();
        1.0 - (-mass / self.config.saturation_k).exp()
    }

    fn category_scores(&self, classified: &[ClassifiedFinding]) -> BTreeMap<String, f64> {
        let mut mass: BTreeMap<String, f64> = BTreeMap::new();
        for c in classified {
            *mass.entry(c.category.display_name().to_string()).or_insert(0.0) +=
                c.weighted_severity();
        }
        mass.into_iter()
            .map(|(category, m)| (category, 1.0 - (-m / self.config.saturation_k).exp()))
            .collect()
    }

    fn collect_adjustments(&self, inputs: &AggregationInputs) -> Vec<RiskAdjustment> {
        let mut adjustments = Vec::new();

        if !inputs.anomalies.is_empty() {
            let magnitude = inputs.anomalies.deception_likelihood;
            let confidence = inputs.anomalies.confidence();
            adjustments.push(RiskAdjustment {
                signal_id: "anomaly:deception-likelihood".to_string(),
                kind: SignalKind::Anomaly,
                weight: self.weights.anomaly,
                confidence,
                delta: magnitude * self.weights.anomaly * confidence,
            });
        }

        if !inputs.patterns.is_empty() {
            let magnitude = inputs.patterns.combined_magnitude();
            let confidence = inputs.patterns.confidence();
            adjustments.push(RiskAdjustment {
                signal_id: "pattern:combined-magnitude".to_string(),
                kind: SignalKind::Pattern,
                weight: self.weights.pattern,
                confidence,
                delta: magnitude * self.weights.pattern * confidence,
            });
        }

        if !inputs.connections.is_empty() {
            let magnitude = inputs.connections.network_risk();
            let confidence = inputs.connections.confidence();
            adjustments.push(RiskAdjustment {
                signal_id: "connection:network-risk".to_string(),
                kind: SignalKind::Connection,
                weight: self.weights.connection,
                confidence,
                delta: magnitude * self.weights.connection * confidence,
            });
        }

        adjustments
    }

    /// Weighted geometric mean of the evidence confidences
    ///
    /// Not a plain average: a weak signal drags overall certainty down
    /// multiplicatively, so a high score built on thin evidence reports
    /// low confidence.
    fn combine_confidence(
        &self,
        inputs: &AggregationInputs,
        adjustments: &[RiskAdjustment],
    ) -> f64 {
        let mut log_sum = 0.0;
        let mut weight_sum = 0.0;

        if !inputs.classified.is_empty() {
            let mean_finding_confidence = inputs
                .classified
                .iter()
                .map(|c| c.finding.confidence)
                .sum::<f64>()
                / inputs.classified.len() as f64;
            log_sum += mean_finding_confidence.max(CONFIDENCE_EPSILON).ln();
            weight_sum += 1.0;
        }

        for adjustment in adjustments {
            log_sum += adjustment.weight * adjustment.confidence.max(CONFIDENCE_EPSILON).ln();
            weight_sum += adjustment.weight;
        }

        if weight_sum == 0.0 {
            return self.config.confidence_floor;
        }
        (log_sum / weight_sum)
            .exp()
            .clamp(self.config.confidence_floor, 1.0)
    }

    /// Score bands plus the critical-finding safety floor
    fn recommend(&self, final_score: f64, classified: &[ClassifiedFinding]) -> Recommendation {
        let by_score = match final_score {
            s if s >= self.config.escalate_band => Recommendation::Escalate,
            s if s >= self.config.review_band => Recommendation::ManualReview,
            s if s >= self.config.monitor_band => Recommendation::Monitor,
            _ => Recommendation::NoAction,
        };

        let has_critical = classified
            .iter()
            .any(|c| c.severity.severity == Severity::Critical);
        if has_critical {
            by_score.max(Recommendation::ManualReview)
        } else {
            by_score
        }
    }

    /// Deterministic minimum-confidence verdict for an empty evidence set
    fn insufficient_evidence_assessment(
        &self,
        evaluated_at: DateTime<Utc>,
    ) -> ComprehensiveRiskAssessment {
        ComprehensiveRiskAssessment {
            base_score: 0.0,
            adjustments: Vector::new(),
            final_score: 0.0,
            confidence: self.config.confidence_floor,
            risk_level: RiskLevel::Low,
            recommendation: Recommendation::NoAction,
            category_scores: BTreeMap::new(),
            insufficient_evidence: true,
            evaluated_at,
        }
    }
}
