//! Entity connection analysis
//!
//! Builds a graph from discovered entities and relations, computes
//! topology metrics, propagates risk outward from intrinsically risky
//! nodes with per-hop decay, and surfaces connections whose risk exceeds
//! the configured threshold.

pub mod graph;
pub mod metrics;
pub mod propagation;

pub use graph::ConnectionGraph;
pub use metrics::{GraphMetrics, NodeMetrics};
pub use propagation::{PropagationOutcome, PropagationPath};

use serde::{Deserialize, Serialize};

use crate::config::PropagationConfig;
use crate::core::{DiscoveredEntity, EntityRelation};

/// Action tag attached to a surfaced risky connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConnectionAction {
    Monitor,
    EnhancedDueDiligence,
    Escalate,
}

impl ConnectionAction {
    fn for_risk(risk: f64) -> Self {
        match risk {
            r if r >= 0.7 => ConnectionAction::Escalate,
            r if r >= 0.5 => ConnectionAction::EnhancedDueDiligence,
            _ => ConnectionAction::Monitor,
        }
    }
}

/// A node whose intrinsic or propagated risk exceeded the threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConnection {
    pub entity_id: String,
    pub entity_name: String,
    pub intrinsic_risk: f64,
    pub propagated_risk: f64,
    pub action: ConnectionAction,
}

impl RiskConnection {
    /// The stronger of intrinsic and propagated risk
    pub fn risk(&self) -> f64 {
        self.intrinsic_risk.max(self.propagated_risk)
    }
}

/// Full output of connection analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionAnalysisResult {
    pub metrics: GraphMetrics,
    pub risky_connections: Vec<RiskConnection>,
    pub propagation_paths: Vec<PropagationPath>,
}

impl ConnectionAnalysisResult {
    pub fn empty() -> Self {
        Self {
            metrics: GraphMetrics::default(),
            risky_connections: Vec::new(),
            propagation_paths: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.risky_connections.is_empty()
    }

    /// Network risk magnitude for aggregation: the strongest surfaced
    /// connection, 0.0 when nothing crossed the threshold
    pub fn network_risk(&self) -> f64 {
        self.risky_connections
            .iter()
            .map(|c| c.risk())
            .fold(0.0, f64::max)
    }

    /// Confidence grows with how much of the graph backs the signal
    pub fn confidence(&self) -> f64 {
        if self.risky_connections.is_empty() {
            return 0.0;
        }
        let evidence = self.metrics.edge_count + self.risky_connections.len();
        (0.45 + 0.05 * evidence as f64).min(0.9)
    }
}

/// Connection analyzer; pure given its configuration
#[derive(Debug, Clone, Default)]
pub struct ConnectionAnalyzer {
    config: PropagationConfig,
}

impl ConnectionAnalyzer {
    pub fn new(config: PropagationConfig) -> Self {
        Self { config }
    }

    /// Analyze an entity graph end to end
    ///
    /// Total over its input: relations referencing undeclared entities are
    /// skipped with a warning rather than failing the analysis.
    pub fn analyze(
        &self,
        entities: &[DiscoveredEntity],
        relations: &[EntityRelation],
    ) -> ConnectionAnalysisResult {
        if entities.is_empty() {
            return ConnectionAnalysisResult::empty();
        }

        let graph = ConnectionGraph::build(entities, relations);
        let metrics = metrics::compute(&graph);
        let outcome = propagation::propagate(&graph, &self.config);

        let mut risky_connections: Vec<RiskConnection> = graph
            .entities()
            .map(|entity| {
                let propagated = outcome.risk_for(&entity.id);
                RiskConnection {
                    entity_id: entity.id.clone(),
                    entity_name: entity.name.clone(),
                    intrinsic_risk: entity.intrinsic_risk(),
                    propagated_risk: propagated,
                    action: ConnectionAction::for_risk(entity.intrinsic_risk().max(propagated)),
                }
            })
            .filter(|c| c.risk() >= self.config.risky_threshold)
            .collect();
        risky_connections.sort_by(|a, b| {
            b.risk()
                .partial_cmp(&a.risk())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });

        ConnectionAnalysisResult {
            metrics,
            risky_connections,
            propagation_paths: outcome.paths,
        }
    }
}
