//! Engine configuration
//!
//! All tunables arrive as one immutable [`EngineConfig`] value passed into
//! each call. There is no module-level mutable state; the lazily built
//! system defaults are read-only.

mod loader;
pub mod thresholds;

pub use loader::{load_config_file, parse_config};
pub use thresholds::{
    ThresholdBreach, ThresholdScope, ThresholdSet, ThresholdTable, SYSTEM_DEFAULT_THRESHOLDS,
};

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result};

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub weights: SignalWeights,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub propagation: PropagationConfig,

    #[serde(default)]
    pub patterns: PatternConfig,

    #[serde(default)]
    pub anomaly: AnomalyConfig,

    #[serde(default)]
    pub temporal: TemporalConfig,
}

impl EngineConfig {
    /// Validate all sections, rejecting out-of-range values at load time
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.aggregation.validate()?;
        self.propagation.validate()?;
        self.temporal.validate()?;
        Ok(())
    }
}

/// Relative trust in each signal class feeding aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalWeights {
    /// Weight applied to the anomaly/deception signal (0.0-1.0)
    #[serde(default = "default_anomaly_weight")]
    pub anomaly: f64,

    /// Weight applied to the behavioral pattern signal (0.0-1.0)
    #[serde(default = "default_pattern_weight")]
    pub pattern: f64,

    /// Weight applied to the network connection signal (0.0-1.0)
    #[serde(default = "default_connection_weight")]
    pub connection: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            anomaly: default_anomaly_weight(),
            pattern: default_pattern_weight(),
            connection: default_connection_weight(),
        }
    }
}

impl SignalWeights {
    fn is_valid_weight(weight: f64) -> bool {
        (0.0..=1.0).contains(&weight)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, w) in [
            ("anomaly", self.anomaly),
            ("pattern", self.pattern),
            ("connection", self.connection),
        ] {
            if !Self::is_valid_weight(w) {
                return Err(EngineError::configuration(format!(
                    "signal weight `{name}` must be in [0, 1], got {w}"
                )));
            }
        }
        Ok(())
    }
}

fn default_anomaly_weight() -> f64 {
    0.25
}
fn default_pattern_weight() -> f64 {
    0.20
}
fn default_connection_weight() -> f64 {
    0.25
}

/// Base-score curve and recommendation bands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Saturation constant of the base-score curve: larger values need more
    /// severity mass to approach 1.0
    #[serde(default = "default_saturation_k")]
    pub saturation_k: f64,

    /// Confidence reported for the insufficient-evidence assessment
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,

    /// Final score at or above which the engine recommends monitoring
    #[serde(default = "default_monitor_band")]
    pub monitor_band: f64,

    /// Final score at or above which the engine recommends manual review
    #[serde(default = "default_review_band")]
    pub review_band: f64,

    /// Final score at or above which the engine recommends escalation
    #[serde(default = "default_escalate_band")]
    pub escalate_band: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            saturation_k: default_saturation_k(),
            confidence_floor: default_confidence_floor(),
            monitor_band: default_monitor_band(),
            review_band: default_review_band(),
            escalate_band: default_escalate_band(),
        }
    }
}

impl AggregationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.saturation_k <= 0.0 {
            return Err(EngineError::configuration(format!(
                "saturation_k must be positive, got {}",
                self.saturation_k
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(EngineError::configuration(format!(
                "confidence_floor must be in [0, 1], got {}",
                self.confidence_floor
            )));
        }
        if !(self.monitor_band < self.review_band && self.review_band < self.escalate_band) {
            return Err(EngineError::configuration(
                "recommendation bands must satisfy monitor < review < escalate",
            ));
        }
        Ok(())
    }
}

fn default_saturation_k() -> f64 {
    4.0
}
fn default_confidence_floor() -> f64 {
    0.1
}
fn default_monitor_band() -> f64 {
    0.25
}
fn default_review_band() -> f64 {
    0.55
}
fn default_escalate_band() -> f64 {
    0.8
}

/// Risk propagation tunables for the connection analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationConfig {
    /// Multiplicative reduction applied at each relationship hop (0.0-1.0,
    /// exclusive of 1.0 so decay is strictly decreasing)
    #[serde(default = "default_hop_decay")]
    pub hop_decay: f64,

    /// Propagation stops once remaining risk falls below this floor
    #[serde(default = "default_epsilon_floor")]
    pub epsilon_floor: f64,

    /// Hard cap on traversal depth, guarding large/cyclic graphs
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Propagated or intrinsic risk above which a connection is surfaced
    #[serde(default = "default_risky_threshold")]
    pub risky_threshold: f64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            hop_decay: default_hop_decay(),
            epsilon_floor: default_epsilon_floor(),
            max_hops: default_max_hops(),
            risky_threshold: default_risky_threshold(),
        }
    }
}

impl PropagationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0 < self.hop_decay && self.hop_decay < 1.0) {
            return Err(EngineError::configuration(format!(
                "hop_decay must be in (0, 1), got {}",
                self.hop_decay
            )));
        }
        if !(0.0..=1.0).contains(&self.epsilon_floor) {
            return Err(EngineError::configuration(format!(
                "epsilon_floor must be in [0, 1], got {}",
                self.epsilon_floor
            )));
        }
        if self.max_hops == 0 {
            return Err(EngineError::configuration("max_hops must be at least 1"));
        }
        Ok(())
    }
}

fn default_hop_decay() -> f64 {
    0.6
}
fn default_epsilon_floor() -> f64 {
    0.05
}
fn default_max_hops() -> usize {
    5
}
fn default_risky_threshold() -> f64 {
    0.3
}

/// Pattern recognizer tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Rolling window used by the frequency detector, in days
    #[serde(default = "default_frequency_window_days")]
    pub frequency_window_days: i64,

    /// Multiple of the subject's baseline rate that counts as a frequency
    /// anomaly
    #[serde(default = "default_frequency_multiplier")]
    pub frequency_multiplier: f64,

    /// Window within which sub-threshold findings across categories are
    /// treated as jointly indicative, in days
    #[serde(default = "default_cross_domain_window_days")]
    pub cross_domain_window_days: i64,

    /// Minimum distinct categories for a cross-domain pattern
    #[serde(default = "default_cross_domain_min_categories")]
    pub cross_domain_min_categories: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            frequency_window_days: default_frequency_window_days(),
            frequency_multiplier: default_frequency_multiplier(),
            cross_domain_window_days: default_cross_domain_window_days(),
            cross_domain_min_categories: default_cross_domain_min_categories(),
        }
    }
}

fn default_frequency_window_days() -> i64 {
    90
}
fn default_frequency_multiplier() -> f64 {
    3.0
}
fn default_cross_domain_window_days() -> i64 {
    180
}
fn default_cross_domain_min_categories() -> usize {
    2
}

/// Anomaly detector tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Bonus added per co-occurring anomaly, scaled by its likelihood
    #[serde(default = "default_reinforcement_bonus")]
    pub reinforcement_bonus: f64,

    /// Findings per category beyond which the subject is a statistical
    /// outlier against the typical profile
    #[serde(default = "default_outlier_category_count")]
    pub outlier_category_count: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            reinforcement_bonus: default_reinforcement_bonus(),
            outlier_category_count: default_outlier_category_count(),
        }
    }
}

fn default_reinforcement_bonus() -> f64 {
    0.10
}
fn default_outlier_category_count() -> usize {
    4
}

/// Temporal tracker tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalConfig {
    /// Absolute score jump within one evaluation cycle that counts as a
    /// spike
    #[serde(default = "default_spike_jump")]
    pub spike_jump: f64,

    /// Number of trailing snapshots that must move monotonically for a
    /// sustained climb
    #[serde(default = "default_sustained_window")]
    pub sustained_window: usize,

    /// Days without new findings before the subject is considered dormant
    #[serde(default = "default_dormancy_days")]
    pub dormancy_days: i64,

    /// Maximum snapshots retained for delta computation
    #[serde(default = "default_max_snapshots")]
    pub max_snapshots: usize,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            spike_jump: default_spike_jump(),
            sustained_window: default_sustained_window(),
            dormancy_days: default_dormancy_days(),
            max_snapshots: default_max_snapshots(),
        }
    }
}

impl TemporalConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.spike_jump) {
            return Err(EngineError::configuration(format!(
                "spike_jump must be in [0, 1], got {}",
                self.spike_jump
            )));
        }
        if self.sustained_window < 2 {
            return Err(EngineError::configuration(
                "sustained_window needs at least 2 snapshots",
            ));
        }
        Ok(())
    }
}

fn default_spike_jump() -> f64 {
    0.3
}
fn default_sustained_window() -> usize {
    3
}
fn default_dormancy_days() -> i64 {
    180
}
fn default_max_snapshots() -> usize {
    24
}
