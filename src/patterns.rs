//! Behavioral pattern recognition over the finding timeline
//!
//! Four pattern families: escalation, frequency clustering, cross-domain
//! co-occurrence, and full-history temporal trend. Overlapping patterns are
//! reported independently; double-counting is resolved by the aggregator,
//! not here.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::PatternConfig;
use crate::core::{Finding, FindingCategory, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternType {
    Escalation,
    FrequencyAnomaly,
    CrossDomain,
    TemporalTrend,
}

impl PatternType {
    pub fn display_name(self) -> &'static str {
        match self {
            PatternType::Escalation => "escalation",
            PatternType::FrequencyAnomaly => "frequency anomaly",
            PatternType::CrossDomain => "cross-domain",
            PatternType::TemporalTrend => "temporal trend",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

/// One matched pattern with the findings that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern_type: PatternType,
    pub matched_findings: Vec<String>,
    pub direction: TrendDirection,
    /// Strength of the pattern, in [0, 1]
    pub magnitude: f64,
}

/// All patterns matched over one finding set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternSummary {
    pub patterns: Vec<Pattern>,
}

impl PatternSummary {
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Combine overlapping pattern magnitudes without double counting:
    /// noisy-or over the individual magnitudes, bounded by 1.0
    pub fn combined_magnitude(&self) -> f64 {
        1.0 - self
            .patterns
            .iter()
            .map(|p| 1.0 - p.magnitude.clamp(0.0, 1.0))
            .product::<f64>()
    }

    /// Confidence grows with the breadth of matched evidence
    pub fn confidence(&self) -> f64 {
        if self.patterns.is_empty() {
            return 0.0;
        }
        let matched: usize = self.patterns.iter().map(|p| p.matched_findings.len()).sum();
        (0.4 + 0.05 * matched as f64).min(0.9)
    }
}

/// Recognizer over the chronological finding history
#[derive(Debug, Clone, Default)]
pub struct PatternRecognizer {
    config: PatternConfig,
}

impl PatternRecognizer {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    pub fn recognize(&self, findings: &[Finding]) -> PatternSummary {
        let mut ordered: Vec<&Finding> = findings.iter().collect();
        ordered.sort_by_key(|f| (f.discovered_at, f.id.clone()));

        let mut patterns = Vec::new();
        patterns.extend(self.detect_escalation(&ordered));
        patterns.extend(self.detect_frequency_anomaly(&ordered));
        patterns.extend(self.detect_cross_domain(&ordered));
        patterns.extend(self.detect_temporal_trend(&ordered));
        PatternSummary { patterns }
    }

    /// Severity strictly increasing over at least three chronologically
    /// ordered findings in the same category
    fn detect_escalation(&self, ordered: &[&Finding]) -> Vec<Pattern> {
        let mut by_category: HashMap<FindingCategory, Vec<&Finding>> = HashMap::new();
        for f in ordered {
            by_category.entry(f.category).or_default().push(f);
        }

        let mut patterns = Vec::new();
        for (_, group) in by_category {
            let mut run: Vec<&Finding> = Vec::new();
            for f in group {
                match run.last() {
                    Some(prev) if f.severity > prev.severity => run.push(f),
                    Some(_) => {
                        if run.len() >= 3 {
                            patterns.push(escalation_pattern(&run));
                        }
                        run = vec![f];
                    }
                    None => run.push(f),
                }
            }
            if run.len() >= 3 {
                patterns.push(escalation_pattern(&run));
            }
        }
        patterns.sort_by(|a, b| a.matched_findings.cmp(&b.matched_findings));
        patterns
    }

    /// Density within a rolling window exceeding a configured multiple of
    /// the subject's baseline rate
    fn detect_frequency_anomaly(&self, ordered: &[&Finding]) -> Vec<Pattern> {
        if ordered.len() < 3 {
            return Vec::new();
        }
        let span_days = (ordered[ordered.len() - 1].discovered_at - ordered[0].discovered_at)
            .num_days()
            .max(1) as f64;
        let baseline_rate = ordered.len() as f64 / span_days;

        let window = Duration::days(self.config.frequency_window_days);
        let window_days = self.config.frequency_window_days as f64;

        // Anchor the window at each finding and take the densest position
        let mut best: Option<(f64, Vec<String>)> = None;
        for anchor in ordered {
            let start = anchor.discovered_at - window;
            let in_window: Vec<String> = ordered
                .iter()
                .filter(|f| f.discovered_at > start && f.discovered_at <= anchor.discovered_at)
                .map(|f| f.id.clone())
                .collect();
            let rate = in_window.len() as f64 / window_days;
            if best.as_ref().map(|(r, _)| rate > *r).unwrap_or(true) {
                best = Some((rate, in_window));
            }
        }

        let Some((peak_rate, matched)) = best else {
            return Vec::new();
        };
        let ratio = peak_rate / baseline_rate;
        if ratio < self.config.frequency_multiplier || matched.len() < 3 {
            return Vec::new();
        }

        vec![Pattern {
            pattern_type: PatternType::FrequencyAnomaly,
            matched_findings: matched,
            direction: TrendDirection::Rising,
            magnitude: (ratio / (self.config.frequency_multiplier * 2.0)).min(0.9),
        }]
    }

    /// Individually sub-threshold findings across distinct categories
    /// within a bounded window, jointly indicative
    fn detect_cross_domain(&self, ordered: &[&Finding]) -> Vec<Pattern> {
        let sub_threshold: Vec<&Finding> = ordered
            .iter()
            .copied()
            .filter(|f| f.severity <= Severity::Medium)
            .collect();
        if sub_threshold.len() < 2 {
            return Vec::new();
        }

        let window = Duration::days(self.config.cross_domain_window_days);
        let mut best: Option<(usize, Vec<String>)> = None;
        for anchor in &sub_threshold {
            let start = anchor.discovered_at - window;
            let in_window: Vec<&Finding> = sub_threshold
                .iter()
                .copied()
                .filter(|f| {
                    f.discovered_at > start && f.discovered_at <= anchor.discovered_at
                })
                .collect();
            let categories: std::collections::HashSet<FindingCategory> =
                in_window.iter().map(|f| f.category).collect();
            if categories.len() >= self.config.cross_domain_min_categories {
                let ids: Vec<String> = in_window.iter().map(|f| f.id.clone()).collect();
                if best
                    .as_ref()
                    .map(|(n, _)| categories.len() > *n)
                    .unwrap_or(true)
                {
                    best = Some((categories.len(), ids));
                }
            }
        }

        match best {
            Some((category_count, matched)) => vec![Pattern {
                pattern_type: PatternType::CrossDomain,
                matched_findings: matched,
                direction: TrendDirection::Flat,
                magnitude: (0.2 + 0.1 * category_count as f64).min(0.7),
            }],
            None => Vec::new(),
        }
    }

    /// Monotonic severity drift over the full history, not just a window
    fn detect_temporal_trend(&self, ordered: &[&Finding]) -> Vec<Pattern> {
        if ordered.len() < 3 {
            return Vec::new();
        }
        let severities: Vec<Severity> = ordered.iter().map(|f| f.severity).collect();
        let rising = severities.windows(2).all(|w| w[0] <= w[1]);
        let falling = severities.windows(2).all(|w| w[0] >= w[1]);
        let moved = severities.first() != severities.last();

        let direction = match (rising, falling, moved) {
            (true, _, true) => TrendDirection::Rising,
            (_, true, true) => TrendDirection::Falling,
            _ => return Vec::new(),
        };

        let drift = (severities[severities.len() - 1].weight() - severities[0].weight()).abs();
        vec![Pattern {
            pattern_type: PatternType::TemporalTrend,
            matched_findings: ordered.iter().map(|f| f.id.clone()).collect(),
            direction,
            magnitude: (0.3 + drift / 2.0).min(0.8),
        }]
    }
}

fn escalation_pattern(run: &[&Finding]) -> Pattern {
    Pattern {
        pattern_type: PatternType::Escalation,
        matched_findings: run.iter().map(|f| f.id.clone()).collect(),
        direction: TrendDirection::Rising,
        magnitude: (0.5 + 0.1 * (run.len() as f64 - 3.0)).min(0.8),
    }
}
