// Export modules for library usage
pub mod aggregation;
pub mod anomaly;
pub mod classify;
pub mod config;
pub mod connections;
pub mod core;
pub mod engine;
pub mod explain;
pub mod patterns;
pub mod scoring;
pub mod severity;
pub mod temporal;

// Re-export commonly used types
pub use crate::core::{
    DateRange, DiscoveredEntity, EngineError, EntityKind, EntityRelation, Finding,
    FindingCategory, Recommendation, RelationKind, RelationStrength, Result, RiskFlag, RiskLevel,
    RoleCategory, Severity,
};

pub use crate::aggregation::{
    AggregationInputs, ComprehensiveRiskAssessment, RiskAdjustment, RiskAggregator, SignalKind,
};

pub use crate::anomaly::{Anomaly, AnomalyDetector, AnomalyType, DeceptionAssessment};

pub use crate::classify::{ClassifiedFinding, FindingClassifier};

pub use crate::config::{
    load_config_file, parse_config, EngineConfig, ThresholdBreach, ThresholdScope, ThresholdSet,
    ThresholdTable,
};

pub use crate::connections::{
    ConnectionAction, ConnectionAnalysisResult, ConnectionAnalyzer, ConnectionGraph, GraphMetrics,
    PropagationPath, RiskConnection,
};

pub use crate::engine::{RiskEngine, SubjectAssessment};

pub use crate::explain::{explain, RiskDistribution, RiskExplanation, RiskFactorDisplay};

pub use crate::patterns::{Pattern, PatternRecognizer, PatternSummary, PatternType, TrendDirection};

pub use crate::scoring::{RiskScorer, ScoringOutcome};

pub use crate::severity::{SeverityCalculator, SeverityContext, SeverityDecision};

pub use crate::temporal::{
    EvolutionSignal, EvolutionSignalType, RiskDelta, RiskSnapshot, TemporalTracker, TrendEstimate,
};
