//! Engine facade
//!
//! The pure computation entry points consumed by the screening
//! orchestrator and monitoring scheduler. The engine holds only immutable
//! configuration, so one instance is safe to share across threads and
//! across subjects; callers serialize snapshot reads/writes per subject.

use chrono::{DateTime, Utc};
use im::Vector;

use crate::aggregation::{
    AggregationInputs, ComprehensiveRiskAssessment, RiskAggregator,
};
use crate::anomaly::{AnomalyDetector, DeceptionAssessment};
use crate::classify::{ClassifiedFinding, FindingClassifier};
use crate::config::{EngineConfig, ThresholdScope, ThresholdTable};
use crate::connections::{ConnectionAnalysisResult, ConnectionAnalyzer};
use crate::core::{DiscoveredEntity, EntityRelation, Finding, Result, RoleCategory};
use crate::explain::{self, RiskExplanation};
use crate::patterns::{PatternRecognizer, PatternSummary};
use crate::scoring::{RiskScorer, ScoringOutcome};
use crate::temporal::{
    EvolutionSignal, RiskDelta, RiskSnapshot, TemporalTracker, TrendEstimate,
};

/// Everything one full evaluation produces
#[derive(Debug, Clone)]
pub struct SubjectAssessment {
    pub classified: Vec<ClassifiedFinding>,
    pub anomalies: DeceptionAssessment,
    pub patterns: PatternSummary,
    pub connections: ConnectionAnalysisResult,
    pub assessment: ComprehensiveRiskAssessment,
    pub scoring: ScoringOutcome,
    pub delta: RiskDelta,
    pub signals: Vec<EvolutionSignal>,
    pub explanation: RiskExplanation,
}

/// The risk assessment and aggregation engine
///
/// Stateless between calls; every tunable lives in the immutable
/// configuration captured at construction.
#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    config: EngineConfig,
    classifier: FindingClassifier,
    thresholds: ThresholdTable,
}

impl RiskEngine {
    /// Build an engine from a validated configuration and threshold table
    pub fn new(config: EngineConfig, thresholds: ThresholdTable) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            classifier: FindingClassifier::new(),
            thresholds,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify findings and assign severities for the subject's role
    pub fn classify_and_score_findings(
        &self,
        findings: &[Finding],
        role: RoleCategory,
        evaluated_at: DateTime<Utc>,
    ) -> Vec<ClassifiedFinding> {
        findings
            .iter()
            .map(|f| self.classifier.classify(f, role, evaluated_at))
            .collect()
    }

    /// Detect statistical and timeline anomalies
    pub fn detect_anomalies(&self, findings: &[Finding]) -> DeceptionAssessment {
        AnomalyDetector::new(self.config.anomaly.clone()).detect(findings)
    }

    /// Recognize behavioral patterns over the finding timeline
    pub fn recognize_patterns(&self, findings: &[Finding]) -> PatternSummary {
        PatternRecognizer::new(self.config.patterns.clone()).recognize(findings)
    }

    /// Analyze the discovered entity graph
    pub fn analyze_connections(
        &self,
        entities: &[DiscoveredEntity],
        relations: &[EntityRelation],
    ) -> ConnectionAnalysisResult {
        ConnectionAnalyzer::new(self.config.propagation.clone()).analyze(entities, relations)
    }

    /// Combine all signals into one explainable assessment
    pub fn aggregate_risk(
        &self,
        classified: &[ClassifiedFinding],
        anomalies: &DeceptionAssessment,
        patterns: &PatternSummary,
        connections: &ConnectionAnalysisResult,
        evaluated_at: DateTime<Utc>,
    ) -> ComprehensiveRiskAssessment {
        let aggregator = RiskAggregator::new(
            self.config.weights.clone(),
            self.config.aggregation.clone(),
        );
        aggregator.aggregate(&AggregationInputs {
            classified,
            anomalies,
            patterns,
            connections,
            evaluated_at,
        })
    }

    /// Map an assessment onto the resolved threshold set for a scope
    pub fn score_against_thresholds(
        &self,
        assessment: &ComprehensiveRiskAssessment,
        scope: &ThresholdScope,
    ) -> ScoringOutcome {
        RiskScorer::new(self.thresholds.clone()).score(assessment, scope)
    }

    /// Diff a new snapshot against the subject's prior history
    pub fn track_evolution(
        &self,
        new_snapshot: &RiskSnapshot,
        prior: &Vector<RiskSnapshot>,
    ) -> (RiskDelta, Vec<EvolutionSignal>) {
        TemporalTracker::new(self.config.temporal.clone()).track(new_snapshot, prior)
    }

    /// Finite-difference trend estimate over the snapshot history
    pub fn estimate_trend(
        &self,
        new_snapshot: &RiskSnapshot,
        prior: &Vector<RiskSnapshot>,
    ) -> TrendEstimate {
        TemporalTracker::new(self.config.temporal.clone()).trend(new_snapshot, prior)
    }

    /// Full pipeline for one subject evaluation
    ///
    /// The three signal branches are independent, so anomaly/pattern
    /// detection runs in parallel with connection analysis. Parallelism is
    /// an optimization only; results are identical to sequential
    /// evaluation.
    #[allow(clippy::too_many_arguments)]
    pub fn assess(
        &self,
        subject_id: &str,
        findings: &[Finding],
        entities: &[DiscoveredEntity],
        relations: &[EntityRelation],
        role: RoleCategory,
        scope: &ThresholdScope,
        prior: &Vector<RiskSnapshot>,
        evaluated_at: DateTime<Utc>,
    ) -> SubjectAssessment {
        let classified = self.classify_and_score_findings(findings, role, evaluated_at);

        let ((anomalies, patterns), connections) = rayon::join(
            || {
                rayon::join(
                    || self.detect_anomalies(findings),
                    || self.recognize_patterns(findings),
                )
            },
            || self.analyze_connections(entities, relations),
        );

        let assessment =
            self.aggregate_risk(&classified, &anomalies, &patterns, &connections, evaluated_at);
        let scoring = self.score_against_thresholds(&assessment, scope);
        let snapshot = RiskSnapshot::new(subject_id, assessment.clone(), evaluated_at);
        let (delta, signals) = self.track_evolution(&snapshot, prior);
        let explanation = explain::explain(&assessment, &classified);

        SubjectAssessment {
            classified,
            anomalies,
            patterns,
            connections,
            assessment,
            scoring,
            delta,
            signals,
            explanation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EntityKind, FindingCategory, RelationKind, RelationStrength, RiskFlag, Severity};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn empty_subject_produces_floor_verdict_and_no_signals() {
        let engine = RiskEngine::default();
        let result = engine.assess(
            "subject-1",
            &[],
            &[],
            &[],
            RoleCategory::General,
            &ThresholdScope::system(),
            &Vector::new(),
            at(),
        );
        assert_eq!(result.assessment.final_score, 0.0);
        assert_eq!(
            result.assessment.recommendation,
            crate::core::Recommendation::NoAction
        );
        assert!(result.signals.is_empty());
        assert!(result.assessment.insufficient_evidence);
    }

    #[test]
    fn full_pipeline_combines_all_branches() {
        let engine = RiskEngine::default();
        let findings = vec![
            Finding::new("f1", FindingCategory::Criminal, Severity::High, 0.9, at()),
            Finding::new("f2", FindingCategory::Financial, Severity::Medium, 0.8, at()),
        ];
        let entities = vec![
            DiscoveredEntity::new("subject-1", "Subject", EntityKind::Individual),
            DiscoveredEntity::new("shell", "Shell Co", EntityKind::Organization)
                .with_flags(vec![RiskFlag::ShellCompany]),
        ];
        let relations = vec![EntityRelation::new(
            "subject-1",
            "shell",
            RelationKind::CoDirector,
            RelationStrength::Strong,
        )];

        let result = engine.assess(
            "subject-1",
            &findings,
            &entities,
            &relations,
            RoleCategory::Finance,
            &ThresholdScope::system(),
            &Vector::new(),
            at(),
        );

        assert_eq!(result.classified.len(), 2);
        assert!(!result.connections.is_empty());
        assert!(result.assessment.final_score > result.assessment.base_score);
        assert!(result
            .assessment
            .adjustments
            .iter()
            .any(|a| a.signal_id == "connection:network-risk"));
    }

    #[test]
    fn pipeline_matches_sequential_entry_points() {
        let engine = RiskEngine::default();
        let findings = vec![Finding::new(
            "f1",
            FindingCategory::Legal,
            Severity::Medium,
            0.7,
            at(),
        )];
        let result = engine.assess(
            "subject-1",
            &findings,
            &[],
            &[],
            RoleCategory::General,
            &ThresholdScope::system(),
            &Vector::new(),
            at(),
        );

        let classified = engine.classify_and_score_findings(&findings, RoleCategory::General, at());
        let anomalies = engine.detect_anomalies(&findings);
        let patterns = engine.recognize_patterns(&findings);
        let connections = engine.analyze_connections(&[], &[]);
        let assessment =
            engine.aggregate_risk(&classified, &anomalies, &patterns, &connections, at());
        assert_eq!(result.assessment, assessment);
    }
}
