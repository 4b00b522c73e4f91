//! Property tests for the aggregation invariants
//!
//! The scoring pipeline promises bounded outputs, monotonicity under new
//! evidence, deterministic replay, and strict decay along propagation
//! chains. These hold for arbitrary inputs, not just the curated cases.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use riskmap::{
    AggregationInputs, ConnectionAnalysisResult, DeceptionAssessment, DiscoveredEntity,
    EntityKind, EntityRelation, Finding, FindingCategory, FindingClassifier, PatternSummary,
    Recommendation, RelationKind, RelationStrength, RiskAggregator, RiskFlag, RoleCategory,
    Severity, ThresholdScope, ThresholdSet,
};

fn evaluated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap()
}

fn category_strategy() -> impl Strategy<Value = FindingCategory> {
    prop::sample::select(vec![
        FindingCategory::Criminal,
        FindingCategory::Financial,
        FindingCategory::Legal,
        FindingCategory::Employment,
        FindingCategory::Education,
        FindingCategory::Reputation,
        FindingCategory::Identity,
    ])
}

fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop::sample::select(vec![
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ])
}

prop_compose! {
    fn finding_strategy()(
        id in "[a-z]{6}",
        category in category_strategy(),
        severity in severity_strategy(),
        confidence in 0.0f64..=1.0,
        day in 0i64..365,
    ) -> Finding {
        Finding::new(
            id,
            category,
            severity,
            confidence,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
        )
    }
}

fn findings_strategy(max: usize) -> impl Strategy<Value = Vec<Finding>> {
    prop::collection::vec(finding_strategy(), 0..max)
}

fn aggregate_findings_only(findings: &[Finding]) -> riskmap::ComprehensiveRiskAssessment {
    let classifier = FindingClassifier::new();
    let classified: Vec<_> = findings
        .iter()
        .map(|f| classifier.classify(f, RoleCategory::General, evaluated_at()))
        .collect();
    let anomalies = DeceptionAssessment::empty();
    let patterns = PatternSummary::default();
    let connections = ConnectionAnalysisResult::empty();
    RiskAggregator::default().aggregate(&AggregationInputs {
        classified: &classified,
        anomalies: &anomalies,
        patterns: &patterns,
        connections: &connections,
        evaluated_at: evaluated_at(),
    })
}

proptest! {
    #[test]
    fn scores_and_confidence_stay_bounded(findings in findings_strategy(12)) {
        let assessment = aggregate_findings_only(&findings);
        prop_assert!((0.0..=1.0).contains(&assessment.base_score));
        prop_assert!((0.0..=1.0).contains(&assessment.final_score));
        prop_assert!((0.1..=1.0).contains(&assessment.confidence));
        for score in assessment.category_scores.values() {
            prop_assert!((0.0..=1.0).contains(score));
        }
    }

    #[test]
    fn new_evidence_never_lowers_the_score(
        findings in findings_strategy(8),
        extra in finding_strategy(),
    ) {
        let before = aggregate_findings_only(&findings);
        let mut grown = findings.clone();
        grown.push(extra);
        let after = aggregate_findings_only(&grown);
        prop_assert!(after.final_score >= before.final_score - 1e-12);
    }

    #[test]
    fn critical_finding_floors_the_recommendation(
        findings in findings_strategy(6),
        confidence in 0.1f64..=1.0,
    ) {
        let mut grown = findings.clone();
        // Sanctions findings score Critical regardless of source severity
        grown.push(Finding::new(
            "sanct1",
            FindingCategory::Sanctions,
            Severity::Low,
            confidence,
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        ));
        let assessment = aggregate_findings_only(&grown);
        prop_assert!(assessment.recommendation >= Recommendation::ManualReview);
    }

    #[test]
    fn aggregation_replays_identically(findings in findings_strategy(10)) {
        let first = aggregate_findings_only(&findings);
        let second = aggregate_findings_only(&findings);
        let a = serde_json::to_string(&first).unwrap();
        let b = serde_json::to_string(&second).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn propagated_risk_strictly_decays_along_chains(length in 2usize..=5) {
        let mut entities = vec![
            DiscoveredEntity::new("n0", "N0", EntityKind::Individual)
                .with_flags(vec![RiskFlag::Sanctioned]),
        ];
        let mut relations = Vec::new();
        for i in 1..length {
            entities.push(DiscoveredEntity::new(
                format!("n{i}"),
                format!("N{i}"),
                EntityKind::Individual,
            ));
            relations.push(EntityRelation::new(
                format!("n{}", i - 1),
                format!("n{i}"),
                RelationKind::CoDirector,
                RelationStrength::Strong,
            ));
        }

        let config = riskmap::config::PropagationConfig::default();
        let graph = riskmap::ConnectionGraph::build(&entities, &relations);
        let outcome = riskmap::connections::propagation::propagate(&graph, &config);

        let mut previous = 1.0;
        for i in 1..length {
            let risk = outcome.risk_for(&format!("n{i}"));
            let expected = 0.6f64.powi(i as i32);
            prop_assert!((risk - expected).abs() < 1e-9);
            prop_assert!(risk < previous);
            previous = risk;
        }
    }

    #[test]
    fn threshold_validation_accepts_exactly_monotonic_sets(
        low in -0.2f64..=1.2,
        medium in -0.2f64..=1.2,
        high in -0.2f64..=1.2,
        critical in -0.2f64..=1.2,
    ) {
        let set = ThresholdSet {
            scope: ThresholdScope::org("acme"),
            low,
            medium,
            high,
            critical,
        };
        let in_range = [low, medium, high, critical]
            .iter()
            .all(|b| (0.0..=1.0).contains(b));
        let increasing = low < medium && medium < high && high < critical;
        prop_assert_eq!(set.validate().is_ok(), in_range && increasing);
    }
}
