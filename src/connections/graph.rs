//! Entity graph construction
//!
//! Nodes are keyed by entity id through an index map; edges carry the
//! relation kind and strength. Symmetric relations are materialized as a
//! directed edge in each direction so propagation only ever walks
//! outgoing edges. The petgraph arena representation sidesteps ownership
//! cycles entirely.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::core::{DiscoveredEntity, EntityRelation, RelationKind, RelationStrength};

/// Edge payload: the relation that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationEdge {
    pub kind: RelationKind,
    pub strength: RelationStrength,
}

impl RelationEdge {
    /// Risk transmitted across this edge relative to a perfect tie
    pub fn multiplier(&self) -> f64 {
        self.kind.risk_multiplier() * self.strength.multiplier()
    }
}

/// Directed entity graph with id-based node lookup
#[derive(Debug, Clone)]
pub struct ConnectionGraph {
    graph: DiGraph<DiscoveredEntity, RelationEdge>,
    node_map: HashMap<String, NodeIndex>,
}

impl ConnectionGraph {
    /// Build the graph, skipping relations that reference undeclared
    /// entities
    pub fn build(entities: &[DiscoveredEntity], relations: &[EntityRelation]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for entity in entities {
            let node = graph.add_node(entity.clone());
            node_map.insert(entity.id.clone(), node);
        }

        for relation in relations {
            let (Some(&source), Some(&target)) = (
                node_map.get(&relation.source),
                node_map.get(&relation.target),
            ) else {
                log::warn!(
                    "skipping relation {} -> {}: unknown entity id",
                    relation.source,
                    relation.target
                );
                continue;
            };
            let edge = RelationEdge {
                kind: relation.kind,
                strength: relation.strength,
            };
            graph.add_edge(source, target, edge);
            if relation.kind.is_symmetric() {
                graph.add_edge(target, source, edge);
            }
        }

        Self { graph, node_map }
    }

    pub fn graph(&self) -> &DiGraph<DiscoveredEntity, RelationEdge> {
        &self.graph
    }

    pub fn node(&self, entity_id: &str) -> Option<NodeIndex> {
        self.node_map.get(entity_id).copied()
    }

    pub fn entity(&self, node: NodeIndex) -> &DiscoveredEntity {
        &self.graph[node]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Unique relations, counting a symmetric pair once
    pub fn relation_count(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        for edge in self.graph.edge_indices() {
            if let Some((a, b)) = self.graph.edge_endpoints(edge) {
                let key = if a <= b { (a, b) } else { (b, a) };
                seen.insert(key);
            }
        }
        seen.len()
    }

    /// All entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = &DiscoveredEntity> {
        self.graph.node_indices().map(|n| &self.graph[n])
    }

    /// Nodes carrying intrinsic risk, the propagation seeds
    pub fn risk_seeds(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&n| self.graph[n].intrinsic_risk() > 0.0)
            .collect()
    }
}
