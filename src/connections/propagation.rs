//! Risk propagation across the entity graph
//!
//! Breadth-first traversal outward from every intrinsically risky node.
//! Each hop multiplies the carried risk by the hop decay and the edge's
//! relation/strength multiplier, so propagated risk is strictly
//! decreasing with distance. Traversal stops at an epsilon floor or a hop
//! cap, whichever comes first; hitting the cap is a warning condition,
//! not an error. Cycles terminate because visited state is keyed by
//! (node, remaining hop budget) and a revisit must strictly improve the
//! carried risk, which still permits a node to be reached again along a
//! shorter or stronger alternate path.

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use super::graph::ConnectionGraph;
use crate::config::PropagationConfig;

/// One propagation route from a risk source to a reached entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationPath {
    pub source_id: String,
    pub target_id: String,
    pub hops: usize,
    /// Entity ids along the route, source first
    pub route: Vec<String>,
    /// Risk remaining after per-hop decay, in [0, 1]
    pub risk: f64,
}

/// Result of propagating from all seeds
#[derive(Debug, Clone, Default)]
pub struct PropagationOutcome {
    /// Strongest propagated risk received per entity id
    pub propagated: HashMap<String, f64>,
    /// Best route per (source, target) pair, strongest first
    pub paths: Vec<PropagationPath>,
    /// Whether any traversal exhausted the hop budget
    pub hop_cap_reached: bool,
}

impl PropagationOutcome {
    pub fn risk_for(&self, entity_id: &str) -> f64 {
        self.propagated.get(entity_id).copied().unwrap_or(0.0)
    }
}

/// Propagate intrinsic risk outward from every flagged node
pub fn propagate(graph: &ConnectionGraph, config: &PropagationConfig) -> PropagationOutcome {
    let mut outcome = PropagationOutcome::default();
    let mut best_paths: HashMap<(String, String), PropagationPath> = HashMap::new();

    for seed in graph.risk_seeds() {
        propagate_from(graph, config, seed, &mut outcome, &mut best_paths);
    }

    if outcome.hop_cap_reached {
        log::warn!(
            "risk propagation hit the {}-hop cap; remaining risk discarded",
            config.max_hops
        );
    }

    let mut paths: Vec<PropagationPath> = best_paths.into_values().collect();
    paths.sort_by(|a, b| {
        b.risk
            .partial_cmp(&a.risk)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                (a.source_id.as_str(), a.target_id.as_str())
                    .cmp(&(b.source_id.as_str(), b.target_id.as_str()))
            })
    });
    outcome.paths = paths;
    outcome
}

fn propagate_from(
    graph: &ConnectionGraph,
    config: &PropagationConfig,
    seed: NodeIndex,
    outcome: &mut PropagationOutcome,
    best_paths: &mut HashMap<(String, String), PropagationPath>,
) {
    let g = graph.graph();
    let source_id = graph.entity(seed).id.clone();
    let intrinsic = graph.entity(seed).intrinsic_risk();

    // (node, remaining budget, carried risk, route so far). Visited state
    // is keyed by (node, remaining budget) and holds the strongest risk
    // carried there so far; a later arrival that improves on it is
    // re-expanded so downstream nodes also see the stronger route.
    let mut queue: VecDeque<(NodeIndex, usize, f64, Vec<NodeIndex>)> = VecDeque::new();
    let mut best_seen: HashMap<(NodeIndex, usize), f64> = HashMap::new();
    queue.push_back((seed, config.max_hops, intrinsic, vec![seed]));
    best_seen.insert((seed, config.max_hops), intrinsic);

    while let Some((node, budget, risk, route)) = queue.pop_front() {
        let mut edges = g.edges_directed(node, Direction::Outgoing).peekable();
        if budget == 0 {
            if edges.peek().is_some() && risk * config.hop_decay >= config.epsilon_floor {
                outcome.hop_cap_reached = true;
            }
            continue;
        }

        for edge in edges {
            let neighbor = edge.target();
            let next_risk = risk * config.hop_decay * edge.weight().multiplier();
            if next_risk < config.epsilon_floor {
                continue;
            }
            let state = (neighbor, budget - 1);
            match best_seen.get(&state) {
                Some(&seen) if seen >= next_risk => continue,
                _ => {
                    best_seen.insert(state, next_risk);
                }
            }

            let neighbor_id = graph.entity(neighbor).id.clone();
            let mut next_route = route.clone();
            next_route.push(neighbor);

            if neighbor != seed {
                let entry = outcome.propagated.entry(neighbor_id.clone()).or_insert(0.0);
                if next_risk > *entry {
                    *entry = next_risk;
                }
                let key = (source_id.clone(), neighbor_id.clone());
                let candidate = PropagationPath {
                    source_id: source_id.clone(),
                    target_id: neighbor_id,
                    hops: next_route.len() - 1,
                    route: next_route
                        .iter()
                        .map(|&n| graph.entity(n).id.clone())
                        .collect(),
                    risk: next_risk,
                };
                match best_paths.get(&key) {
                    Some(existing) if existing.risk >= candidate.risk => {}
                    _ => {
                        best_paths.insert(key, candidate);
                    }
                }
            }

            queue.push_back((neighbor, budget - 1, next_risk, next_route));
        }
    }
}
