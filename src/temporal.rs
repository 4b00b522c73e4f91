//! Temporal risk evolution tracking
//!
//! Compares a new assessment snapshot against the subject's prior history,
//! producing a delta and evolution signals for downstream monitoring.
//! Snapshot persistence belongs to the caller; the tracker only reads the
//! history it is handed and assumes it comes from a consistent,
//! non-racing read.

use chrono::{DateTime, Duration, Utc};
use im::Vector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregation::ComprehensiveRiskAssessment;
use crate::config::TemporalConfig;
use crate::core::RiskLevel;

/// Category score movement counted as a category shift
const CATEGORY_SHIFT_DELTA: f64 = 0.2;

/// Score movement small enough to count as unchanged for dormancy
const DORMANT_SCORE_DELTA: f64 = 0.05;

/// A captured assessment for one subject at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub subject_id: String,
    pub assessment: ComprehensiveRiskAssessment,
    pub captured_at: DateTime<Utc>,
}

impl RiskSnapshot {
    pub fn new(
        subject_id: impl Into<String>,
        assessment: ComprehensiveRiskAssessment,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            assessment,
            captured_at,
        }
    }

    fn score(&self) -> f64 {
        self.assessment.final_score
    }
}

/// Score and level movement between the latest prior snapshot and the new
/// one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDelta {
    pub score_delta: f64,
    pub previous_level: Option<RiskLevel>,
    pub current_level: RiskLevel,
    /// Per-category score deltas; categories absent before or after count
    /// from/to zero
    pub category_deltas: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvolutionSignalType {
    Spike,
    Dormancy,
    SustainedClimb,
    LevelTransition,
    CategoryShift,
}

impl EvolutionSignalType {
    pub fn display_name(self) -> &'static str {
        match self {
            EvolutionSignalType::Spike => "spike",
            EvolutionSignalType::Dormancy => "dormancy",
            EvolutionSignalType::SustainedClimb => "sustained climb",
            EvolutionSignalType::LevelTransition => "level transition",
            EvolutionSignalType::CategoryShift => "category shift",
        }
    }
}

/// A meaningful change in the subject's risk profile between evaluations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSignal {
    pub signal_type: EvolutionSignalType,
    pub magnitude: f64,
    /// Capture instants of the snapshots that triggered the signal
    pub triggering_snapshots: Vec<DateTime<Utc>>,
}

/// Finite-difference trend estimate over the snapshot history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendEstimate {
    /// Score change per day between the last two snapshots
    pub velocity: f64,
    /// Velocity change per day across the last three snapshots
    pub acceleration: f64,
    /// Confidence in the estimate; degrades with snapshot sparsity
    pub prediction_confidence: f64,
}

/// Tracker; stateless apart from its configuration
#[derive(Debug, Clone, Default)]
pub struct TemporalTracker {
    config: TemporalConfig,
}

impl TemporalTracker {
    pub fn new(config: TemporalConfig) -> Self {
        Self { config }
    }

    /// Diff a new snapshot against the prior history, oldest first
    pub fn track(
        &self,
        new_snapshot: &RiskSnapshot,
        prior: &Vector<RiskSnapshot>,
    ) -> (RiskDelta, Vec<EvolutionSignal>) {
        let history = self.bounded_history(prior);
        let latest_prior = history.last();

        let delta = RiskDelta {
            score_delta: new_snapshot.score() - latest_prior.map(|s| s.score()).unwrap_or(0.0),
            previous_level: latest_prior.map(|s| s.assessment.risk_level),
            current_level: new_snapshot.assessment.risk_level,
            category_deltas: category_deltas(new_snapshot, latest_prior),
        };

        let mut signals = Vec::new();
        if let Some(prior_snapshot) = latest_prior {
            signals.extend(self.detect_spike(new_snapshot, prior_snapshot));
            signals.extend(self.detect_dormancy(new_snapshot, prior_snapshot));
            signals.extend(self.detect_level_transition(new_snapshot, prior_snapshot));
            signals.extend(self.detect_category_shift(&delta, new_snapshot, prior_snapshot));
        }
        signals.extend(self.detect_sustained_climb(new_snapshot, &history));

        (delta, signals)
    }

    /// Trend over the full history including the new snapshot
    pub fn trend(&self, new_snapshot: &RiskSnapshot, prior: &Vector<RiskSnapshot>) -> TrendEstimate {
        let mut scores: Vec<(DateTime<Utc>, f64)> = self
            .bounded_history(prior)
            .iter()
            .map(|s| (s.captured_at, s.score()))
            .collect();
        scores.push((new_snapshot.captured_at, new_snapshot.score()));

        if scores.len() < 2 {
            return TrendEstimate {
                velocity: 0.0,
                acceleration: 0.0,
                prediction_confidence: 0.0,
            };
        }

        let velocity = finite_difference(&scores[scores.len() - 2], &scores[scores.len() - 1]);
        let acceleration = if scores.len() >= 3 {
            let prev_velocity =
                finite_difference(&scores[scores.len() - 3], &scores[scores.len() - 2]);
            let days = day_span(scores[scores.len() - 3].0, scores[scores.len() - 1].0);
            (velocity - prev_velocity) / days
        } else {
            0.0
        };

        TrendEstimate {
            velocity,
            acceleration,
            prediction_confidence: prediction_confidence(&scores),
        }
    }

    /// Keep only the most recent configured number of snapshots
    fn bounded_history<'a>(&self, prior: &'a Vector<RiskSnapshot>) -> Vec<&'a RiskSnapshot> {
        let mut history: Vec<&RiskSnapshot> = prior.iter().collect();
        history.sort_by_key(|s| s.captured_at);
        let excess = history.len().saturating_sub(self.config.max_snapshots);
        history.split_off(excess)
    }

    fn detect_spike(
        &self,
        new_snapshot: &RiskSnapshot,
        prior: &RiskSnapshot,
    ) -> Option<EvolutionSignal> {
        let jump = new_snapshot.score() - prior.score();
        (jump >= self.config.spike_jump).then(|| EvolutionSignal {
            signal_type: EvolutionSignalType::Spike,
            magnitude: jump,
            triggering_snapshots: vec![prior.captured_at, new_snapshot.captured_at],
        })
    }

    fn detect_dormancy(
        &self,
        new_snapshot: &RiskSnapshot,
        prior: &RiskSnapshot,
    ) -> Option<EvolutionSignal> {
        let gap = new_snapshot.captured_at - prior.captured_at;
        let unchanged = (new_snapshot.score() - prior.score()).abs() < DORMANT_SCORE_DELTA;
        (gap >= Duration::days(self.config.dormancy_days) && unchanged).then(|| EvolutionSignal {
            signal_type: EvolutionSignalType::Dormancy,
            magnitude: (gap.num_days() as f64 / 365.0).min(1.0),
            triggering_snapshots: vec![prior.captured_at, new_snapshot.captured_at],
        })
    }

    fn detect_level_transition(
        &self,
        new_snapshot: &RiskSnapshot,
        prior: &RiskSnapshot,
    ) -> Option<EvolutionSignal> {
        let from = prior.assessment.risk_level;
        let to = new_snapshot.assessment.risk_level;
        (from != to).then(|| EvolutionSignal {
            signal_type: EvolutionSignalType::LevelTransition,
            magnitude: (level_rank(from) - level_rank(to)).abs() / 3.0,
            triggering_snapshots: vec![prior.captured_at, new_snapshot.captured_at],
        })
    }

    fn detect_category_shift(
        &self,
        delta: &RiskDelta,
        new_snapshot: &RiskSnapshot,
        prior: &RiskSnapshot,
    ) -> Option<EvolutionSignal> {
        let max_shift = delta
            .category_deltas
            .values()
            .map(|d| d.abs())
            .fold(0.0, f64::max);
        (max_shift >= CATEGORY_SHIFT_DELTA).then(|| EvolutionSignal {
            signal_type: EvolutionSignalType::CategoryShift,
            magnitude: max_shift.min(1.0),
            triggering_snapshots: vec![prior.captured_at, new_snapshot.captured_at],
        })
    }

    /// Strictly monotonic rise over the trailing window including the new
    /// snapshot
    fn detect_sustained_climb(
        &self,
        new_snapshot: &RiskSnapshot,
        history: &[&RiskSnapshot],
    ) -> Option<EvolutionSignal> {
        let window = self.config.sustained_window;
        if history.len() + 1 < window {
            return None;
        }
        let mut scores: Vec<(DateTime<Utc>, f64)> = history
            .iter()
            .rev()
            .take(window - 1)
            .rev()
            .map(|s| (s.captured_at, s.score()))
            .collect();
        scores.push((new_snapshot.captured_at, new_snapshot.score()));

        let climbing = scores.windows(2).all(|w| w[1].1 > w[0].1);
        climbing.then(|| EvolutionSignal {
            signal_type: EvolutionSignalType::SustainedClimb,
            magnitude: (scores[scores.len() - 1].1 - scores[0].1).min(1.0),
            triggering_snapshots: scores.iter().map(|(at, _)| *at).collect(),
        })
    }
}

fn category_deltas(
    new_snapshot: &RiskSnapshot,
    prior: Option<&&RiskSnapshot>,
) -> BTreeMap<String, f64> {
    let empty = BTreeMap::new();
    let before = prior
        .map(|s| &s.assessment.category_scores)
        .unwrap_or(&empty);
    let after = &new_snapshot.assessment.category_scores;

    let mut deltas = BTreeMap::new();
    for (category, score) in after {
        let prior_score = before.get(category).copied().unwrap_or(0.0);
        deltas.insert(category.clone(), score - prior_score);
    }
    for (category, score) in before {
        deltas.entry(category.clone()).or_insert(-score);
    }
    deltas
}

fn finite_difference(from: &(DateTime<Utc>, f64), to: &(DateTime<Utc>, f64)) -> f64 {
    (to.1 - from.1) / day_span(from.0, to.0)
}

fn day_span(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_seconds() as f64 / 86_400.0).max(1.0)
}

/// Confidence degrades with snapshot sparsity: few points or long average
/// gaps both lower it
fn prediction_confidence(scores: &[(DateTime<Utc>, f64)]) -> f64 {
    if scores.len() < 3 {
        return 0.3;
    }
    let total_days = day_span(scores[0].0, scores[scores.len() - 1].0);
    let mean_gap = total_days / (scores.len() - 1) as f64;
    // 30-day cadence keeps full confidence; sparser histories decay
    let sparsity = (30.0 / mean_gap).min(1.0);
    (0.4 + 0.5 * sparsity).min(0.9)
}

fn level_rank(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::Low => 0.0,
        RiskLevel::Medium => 1.0,
        RiskLevel::High => 2.0,
        RiskLevel::Critical => 3.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Recommendation;
    use chrono::TimeZone;

    fn assessment(final_score: f64) -> ComprehensiveRiskAssessment {
        ComprehensiveRiskAssessment {
            base_score: final_score,
            adjustments: Vector::new(),
            final_score,
            confidence: 0.8,
            risk_level: crate::config::SYSTEM_DEFAULT_THRESHOLDS.classify(final_score),
            recommendation: Recommendation::NoAction,
            category_scores: BTreeMap::new(),
            insufficient_evidence: false,
            evaluated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn snapshot(score: f64, day: i64) -> RiskSnapshot {
        RiskSnapshot::new(
            "subject-1",
            assessment(score),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
        )
    }

    #[test]
    fn first_snapshot_has_no_signals() {
        let tracker = TemporalTracker::default();
        let (delta, signals) = tracker.track(&snapshot(0.4, 0), &Vector::new());
        assert_eq!(delta.score_delta, 0.4);
        assert_eq!(delta.previous_level, None);
        assert!(signals.is_empty());
    }

    #[test]
    fn large_jump_triggers_spike() {
        let tracker = TemporalTracker::default();
        let prior = Vector::from(vec![snapshot(0.3, 0)]);
        let (delta, signals) = tracker.track(&snapshot(0.8, 30), &prior);
        assert!((delta.score_delta - 0.5).abs() < 1e-9);
        assert!(signals
            .iter()
            .any(|s| s.signal_type == EvolutionSignalType::Spike));
    }

    #[test]
    fn small_jump_is_not_a_spike() {
        let tracker = TemporalTracker::default();
        let prior = Vector::from(vec![snapshot(0.3, 0)]);
        let (_, signals) = tracker.track(&snapshot(0.35, 30), &prior);
        assert!(signals
            .iter()
            .all(|s| s.signal_type != EvolutionSignalType::Spike));
    }

    #[test]
    fn level_transition_fires_both_directions() {
        let tracker = TemporalTracker::default();
        let prior = Vector::from(vec![snapshot(0.6, 0)]);
        let (_, signals) = tracker.track(&snapshot(0.1, 30), &prior);
        let transition = signals
            .iter()
            .find(|s| s.signal_type == EvolutionSignalType::LevelTransition)
            .expect("transition detected");
        assert!(transition.magnitude > 0.0);
    }

    #[test]
    fn monotonic_rise_is_sustained_climb() {
        let tracker = TemporalTracker::default();
        let prior = Vector::from(vec![snapshot(0.2, 0), snapshot(0.3, 30)]);
        let (_, signals) = tracker.track(&snapshot(0.4, 60), &prior);
        assert!(signals
            .iter()
            .any(|s| s.signal_type == EvolutionSignalType::SustainedClimb));

        // A dip breaks the climb
        let prior = Vector::from(vec![snapshot(0.2, 0), snapshot(0.5, 30)]);
        let (_, signals) = tracker.track(&snapshot(0.4, 60), &prior);
        assert!(signals
            .iter()
            .all(|s| s.signal_type != EvolutionSignalType::SustainedClimb));
    }

    #[test]
    fn long_quiet_gap_is_dormancy() {
        let tracker = TemporalTracker::default();
        let prior = Vector::from(vec![snapshot(0.3, 0)]);
        let (_, signals) = tracker.track(&snapshot(0.31, 200), &prior);
        assert!(signals
            .iter()
            .any(|s| s.signal_type == EvolutionSignalType::Dormancy));
    }

    #[test]
    fn category_shift_detected() {
        let tracker = TemporalTracker::default();
        let mut before = assessment(0.3);
        before
            .category_scores
            .insert("financial".to_string(), 0.3);
        let prior = Vector::from(vec![RiskSnapshot::new(
            "subject-1",
            before,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        )]);

        let mut after = assessment(0.35);
        after.category_scores.insert("financial".to_string(), 0.3);
        after.category_scores.insert("criminal".to_string(), 0.4);
        let new_snapshot = RiskSnapshot::new(
            "subject-1",
            after,
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
        );

        let (delta, signals) = tracker.track(&new_snapshot, &prior);
        assert_eq!(delta.category_deltas["criminal"], 0.4);
        assert_eq!(delta.category_deltas["financial"], 0.0);
        assert!(signals
            .iter()
            .any(|s| s.signal_type == EvolutionSignalType::CategoryShift));
    }

    #[test]
    fn velocity_and_acceleration_by_finite_differences() {
        let tracker = TemporalTracker::default();
        let prior = Vector::from(vec![snapshot(0.2, 0), snapshot(0.3, 10)]);
        let trend = tracker.trend(&snapshot(0.6, 20), &prior);
        // Last two points: +0.3 over 10 days
        assert!((trend.velocity - 0.03).abs() < 1e-9);
        // Velocity rose from 0.01/day to 0.03/day over the 20-day span
        assert!(trend.acceleration > 0.0);
        assert!(trend.prediction_confidence > 0.5);
    }

    #[test]
    fn sparse_history_lowers_prediction_confidence() {
        let tracker = TemporalTracker::default();
        let dense = Vector::from(vec![snapshot(0.2, 0), snapshot(0.3, 20)]);
        let sparse = Vector::from(vec![snapshot(0.2, 0), snapshot(0.3, 600)]);
        let dense_trend = tracker.trend(&snapshot(0.4, 40), &dense);
        let sparse_trend = tracker.trend(&snapshot(0.4, 1200), &sparse);
        assert!(sparse_trend.prediction_confidence < dense_trend.prediction_confidence);
    }

    #[test]
    fn history_bounded_by_max_snapshots() {
        let config = TemporalConfig {
            max_snapshots: 2,
            ..TemporalConfig::default()
        };
        let tracker = TemporalTracker::new(config);
        // Oldest snapshot falls outside the retained window, so the climb
        // window only sees the last two plus the new one
        let prior = Vector::from(vec![
            snapshot(0.9, 0),
            snapshot(0.2, 30),
            snapshot(0.3, 60),
        ]);
        let (_, signals) = tracker.track(&snapshot(0.4, 90), &prior);
        assert!(signals
            .iter()
            .any(|s| s.signal_type == EvolutionSignalType::SustainedClimb));
    }
}
