//! Topology metrics for the entity graph
//!
//! Degree, local clustering coefficient, and betweenness centrality
//! identify structurally significant nodes. Betweenness counts shortest
//! paths through each node over unit edge weights.

use petgraph::algo::dijkstra;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::graph::ConnectionGraph;

/// Per-node structural measures
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub degree: usize,
    /// Fraction of neighbor pairs that are themselves connected, in [0, 1]
    pub clustering_coefficient: f64,
    /// Normalized betweenness centrality, in [0, 1]
    pub betweenness_centrality: f64,
}

/// Whole-graph topology summary
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub node_metrics: HashMap<String, NodeMetrics>,
}

impl GraphMetrics {
    /// Entities whose centrality marks them as structurally significant
    pub fn significant_nodes(&self, centrality_floor: f64) -> Vec<&str> {
        let mut nodes: Vec<(&str, f64)> = self
            .node_metrics
            .iter()
            .filter(|(_, m)| m.betweenness_centrality >= centrality_floor)
            .map(|(id, m)| (id.as_str(), m.betweenness_centrality))
            .collect();
        nodes.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        nodes.into_iter().map(|(id, _)| id).collect()
    }
}

/// Compute all topology metrics for a graph
pub fn compute(graph: &ConnectionGraph) -> GraphMetrics {
    let g = graph.graph();
    let nodes: Vec<NodeIndex> = g.node_indices().collect();

    let neighborhoods: HashMap<NodeIndex, HashSet<NodeIndex>> = nodes
        .iter()
        .map(|&n| (n, undirected_neighbors(graph, n)))
        .collect();

    // All-pairs shortest distances over unit weights, one dijkstra per
    // node; petgraph hands back its own map type, so re-collect each
    let distances: HashMap<NodeIndex, HashMap<NodeIndex, usize>> = nodes
        .iter()
        .map(|&n| (n, dijkstra(g, n, None, |_| 1usize).into_iter().collect()))
        .collect();

    let node_metrics = nodes
        .iter()
        .map(|&n| {
            let neighbors = &neighborhoods[&n];
            let metrics = NodeMetrics {
                degree: neighbors.len(),
                clustering_coefficient: clustering_coefficient(neighbors, &neighborhoods),
                betweenness_centrality: betweenness(n, &nodes, &distances),
            };
            (graph.entity(n).id.clone(), metrics)
        })
        .collect();

    GraphMetrics {
        node_count: graph.node_count(),
        edge_count: graph.relation_count(),
        node_metrics,
    }
}

/// Neighbors reachable in either direction, self-loops excluded
fn undirected_neighbors(graph: &ConnectionGraph, node: NodeIndex) -> HashSet<NodeIndex> {
    let g = graph.graph();
    g.neighbors_undirected(node).filter(|&m| m != node).collect()
}

/// Fraction of neighbor pairs that are themselves adjacent
fn clustering_coefficient(
    neighbors: &HashSet<NodeIndex>,
    neighborhoods: &HashMap<NodeIndex, HashSet<NodeIndex>>,
) -> f64 {
    let k = neighbors.len();
    if k < 2 {
        return 0.0;
    }
    let neighbor_list: Vec<NodeIndex> = neighbors.iter().copied().collect();
    let mut linked = 0usize;
    for (i, &a) in neighbor_list.iter().enumerate() {
        for &b in neighbor_list.iter().skip(i + 1) {
            if neighborhoods[&a].contains(&b) {
                linked += 1;
            }
        }
    }
    linked as f64 / (k * (k - 1) / 2) as f64
}

/// Normalized count of shortest (s, d) paths passing through `target`
fn betweenness(
    target: NodeIndex,
    nodes: &[NodeIndex],
    distances: &HashMap<NodeIndex, HashMap<NodeIndex, usize>>,
) -> f64 {
    let n = nodes.len();
    if n <= 2 {
        return 0.0;
    }

    let mut through = 0usize;
    for &source in nodes {
        if source == target {
            continue;
        }
        let from_source = &distances[&source];
        let Some(&source_to_target) = from_source.get(&target) else {
            continue;
        };
        for &dest in nodes {
            if dest == source || dest == target {
                continue;
            }
            if let (Some(&source_to_dest), Some(&target_to_dest)) =
                (from_source.get(&dest), distances[&target].get(&dest))
            {
                if source_to_target + target_to_dest == source_to_dest {
                    through += 1;
                }
            }
        }
    }

    through as f64 / ((n - 1) * (n - 2)) as f64
}
