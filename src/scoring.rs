//! Threshold-scoped risk scoring
//!
//! Maps an aggregated final score onto the discrete risk level for the
//! subject's (org, role, locale) scope using the resolved threshold set,
//! and reports every configured boundary the score breached.

use serde::{Deserialize, Serialize};

use crate::aggregation::ComprehensiveRiskAssessment;
use crate::config::{ThresholdBreach, ThresholdScope, ThresholdTable};
use crate::core::{Recommendation, RiskLevel};

/// Outcome of scoring an assessment against a resolved threshold set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringOutcome {
    pub level: RiskLevel,
    pub recommendation: Recommendation,
    pub breaches: Vec<ThresholdBreach>,
    /// Scope whose thresholds decided the level
    pub resolved_scope: String,
}

/// Scorer over a validated threshold table
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    table: ThresholdTable,
}

impl RiskScorer {
    pub fn new(table: ThresholdTable) -> Self {
        Self { table }
    }

    /// Score an assessment for the given scope
    ///
    /// The aggregator's recommendation is a floor, never lowered here:
    /// organization thresholds may escalate the response but cannot
    /// subvert the critical-finding safety override.
    pub fn score(
        &self,
        assessment: &ComprehensiveRiskAssessment,
        scope: &ThresholdScope,
    ) -> ScoringOutcome {
        let thresholds = self.table.resolve(scope);
        let level = thresholds.classify(assessment.final_score);
        let recommendation = assessment.recommendation.max(level_floor(level));
        ScoringOutcome {
            level,
            recommendation,
            breaches: thresholds.breaches(assessment.final_score),
            resolved_scope: thresholds.scope.describe(),
        }
    }
}

/// Minimum response warranted by a risk level
fn level_floor(level: RiskLevel) -> Recommendation {
    match level {
        RiskLevel::Low => Recommendation::NoAction,
        RiskLevel::Medium => Recommendation::Monitor,
        RiskLevel::High => Recommendation::ManualReview,
        RiskLevel::Critical => Recommendation::Escalate,
    }
}
