// Copyright 2025 Procflow Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Velocity-Verlet style force simulation.
//!
//! Each tick applies five forces scaled by a decaying alpha: a rank force
//! pulling every node toward its lane x position, a weak centering force
//! toward the canvas midline, pairwise charge repulsion with a cutoff
//! radius, spring tension along links toward a rest distance, and a
//! collision pass enforcing minimum separation. Velocities decay each tick
//! so the system settles instead of oscillating.
//!
//! Positions are transient: they belong to the engine for the lifetime of
//! one render pass and are rebuilt from scratch when the simplified graph
//! changes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use procflow_core::SimplifiedGraph;

/// Minimum squared distance used when two nodes coincide, so force
/// directions stay defined.
const EPSILON: f64 = 1e-6;

/// Force constants and canvas geometry for one layout run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Rest length of link springs
    pub link_distance: f64,
    pub link_strength: f64,
    /// Negative for repulsion
    pub charge_strength: f64,
    /// Charge is ignored beyond this separation
    pub charge_max_distance: f64,
    /// Pull toward the discovery-order lane position
    pub rank_strength: f64,
    /// Pull toward the vertical midline
    pub center_strength: f64,
    /// Minimum separation enforced between node centers
    pub collision_radius: f64,
    pub collision_strength: f64,
    /// Fraction of alpha lost per tick
    pub alpha_decay: f64,
    /// Fraction of velocity lost per tick
    pub velocity_decay: f64,
    /// Synchronous ticks run by `settle`
    pub settle_ticks: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1600.0,
            canvas_height: 900.0,
            link_distance: 220.0,
            link_strength: 0.7,
            charge_strength: -2000.0,
            charge_max_distance: 600.0,
            rank_strength: 1.2,
            center_strength: 0.15,
            collision_radius: 140.0,
            collision_strength: 1.0,
            alpha_decay: 0.04,
            velocity_decay: 0.7,
            settle_ticks: 500,
        }
    }
}

/// One positioned node. `x`/`y` are owned by the engine; consumers read
/// them after `settle` or between drag ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: String,
    /// Discovery-order index within the simplified node set
    pub rank: usize,
    pub x: f64,
    pub y: f64,
    vx: f64,
    vy: f64,
    /// Pin position while the node is dragged
    pinned: Option<(f64, f64)>,
}

/// Iterative force-directed layout over a simplified graph
#[derive(Debug)]
pub struct LayoutEngine {
    config: LayoutConfig,
    nodes: Vec<LayoutNode>,
    node_index: HashMap<String, usize>,
    /// Links resolved to node indices; unresolvable endpoints are skipped
    /// at construction
    links: Vec<(usize, usize)>,
    alpha: f64,
}

impl LayoutEngine {
    /// Seed nodes on their lane positions and resolve link endpoints.
    ///
    /// Initial y positions fan out from the midline by rank parity so the
    /// charge force has an asymmetry to work with; a perfectly collinear
    /// start leaves repulsion pushing along a single axis.
    pub fn new(graph: &SimplifiedGraph, config: LayoutConfig) -> Self {
        let count = graph.nodes.len().max(1);
        let step = (config.canvas_width * 0.8) / count as f64;

        let mut node_index = HashMap::with_capacity(graph.nodes.len());
        let nodes: Vec<LayoutNode> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(rank, node)| {
                node_index.insert(node.id.clone(), rank);
                let spread = if rank % 2 == 0 { -1.0 } else { 1.0 };
                LayoutNode {
                    id: node.id.clone(),
                    rank,
                    x: config.canvas_width * 0.1 + rank as f64 * step,
                    y: config.canvas_height / 2.0 + spread * (20.0 + rank as f64 * 5.0),
                    vx: 0.0,
                    vy: 0.0,
                    pinned: None,
                }
            })
            .collect();

        let links: Vec<(usize, usize)> = graph
            .links
            .iter()
            .filter_map(|link| {
                match (node_index.get(&link.source), node_index.get(&link.target)) {
                    (Some(&s), Some(&t)) => Some((s, t)),
                    _ => {
                        debug!(
                            source = %link.source,
                            target = %link.target,
                            "Skipping link with unresolved endpoint"
                        );
                        None
                    }
                }
            })
            .collect();

        Self {
            config,
            nodes,
            node_index,
            links,
            alpha: 1.0,
        }
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn position(&self, id: &str) -> Option<(f64, f64)> {
        self.node_index
            .get(id)
            .map(|&idx| (self.nodes[idx].x, self.nodes[idx].y))
    }

    /// Run the synchronous settling burst. One call per dataset change.
    pub fn settle(&mut self) {
        for _ in 0..self.config.settle_ticks {
            self.tick();
        }
        debug!(
            node_count = self.nodes.len(),
            link_count = self.links.len(),
            alpha = self.alpha,
            "Layout settled"
        );
    }

    /// Advance the simulation one step.
    pub fn tick(&mut self) {
        self.alpha *= 1.0 - self.config.alpha_decay;

        self.apply_rank_and_center();
        self.apply_charge();
        self.apply_links();

        let retain = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            node.vx *= retain;
            node.vy *= retain;
            node.x += node.vx;
            node.y += node.vy;
            if let Some((fx, fy)) = node.pinned {
                node.x = fx;
                node.y = fy;
                node.vx = 0.0;
                node.vy = 0.0;
            }
        }

        self.apply_collision();
    }

    /// Pin a node for dragging and reheat the simulation so neighbors
    /// follow.
    pub fn begin_drag(&mut self, id: &str) {
        if let Some(&idx) = self.node_index.get(id) {
            let node = &mut self.nodes[idx];
            node.pinned = Some((node.x, node.y));
            self.alpha = self.alpha.max(0.1);
        }
    }

    /// Move a pinned node; ticks once so connected nodes react.
    pub fn drag_to(&mut self, id: &str, x: f64, y: f64) {
        if let Some(&idx) = self.node_index.get(id) {
            if self.nodes[idx].pinned.is_some() {
                self.nodes[idx].pinned = Some((x, y));
                self.nodes[idx].x = x;
                self.nodes[idx].y = y;
                self.tick();
            }
        }
    }

    /// Release a pinned node.
    pub fn end_drag(&mut self, id: &str) {
        if let Some(&idx) = self.node_index.get(id) {
            self.nodes[idx].pinned = None;
        }
    }

    /// Lane pull along x plus weak centering along y
    fn apply_rank_and_center(&mut self) {
        let count = self.nodes.len().max(1);
        let step = (self.config.canvas_width * 0.8) / count as f64;
        let mid_y = self.config.canvas_height / 2.0;

        for node in &mut self.nodes {
            let target_x = self.config.canvas_width * 0.1 + node.rank as f64 * step;
            node.vx += (target_x - node.x) * self.config.rank_strength * self.alpha;
            node.vy += (mid_y - node.y) * self.config.center_strength * self.alpha;
        }
    }

    /// Pairwise repulsion with a cutoff radius
    fn apply_charge(&mut self) {
        let cutoff_sq = self.config.charge_max_distance * self.config.charge_max_distance;

        for i in 0..self.nodes.len() {
            for j in (i + 1)..self.nodes.len() {
                let dx = self.nodes[j].x - self.nodes[i].x;
                let dy = self.nodes[j].y - self.nodes[i].y;
                let dist_sq = (dx * dx + dy * dy).max(EPSILON);
                if dist_sq > cutoff_sq {
                    continue;
                }
                let dist = dist_sq.sqrt();
                // negative strength pushes the pair apart
                let force = self.config.charge_strength * self.alpha / dist_sq;
                let fx = (dx / dist) * force;
                let fy = (dy / dist) * force;
                self.nodes[i].vx += fx;
                self.nodes[i].vy += fy;
                self.nodes[j].vx -= fx;
                self.nodes[j].vy -= fy;
            }
        }
    }

    /// Spring tension along links toward the rest distance
    fn apply_links(&mut self) {
        for &(source, target) in &self.links {
            if source == target {
                continue;
            }
            let dx = self.nodes[target].x - self.nodes[source].x;
            let dy = self.nodes[target].y - self.nodes[source].y;
            let dist = (dx * dx + dy * dy).max(EPSILON).sqrt();
            let displacement = dist - self.config.link_distance;
            let force = displacement / dist * self.config.link_strength * self.alpha * 0.5;
            let fx = dx * force;
            let fy = dy * force;
            self.nodes[source].vx += fx;
            self.nodes[source].vy += fy;
            self.nodes[target].vx -= fx;
            self.nodes[target].vy -= fy;
        }
    }

    /// Push overlapping pairs apart to the minimum separation. Applied to
    /// positions directly so the constraint holds even at low alpha.
    fn apply_collision(&mut self) {
        let min_dist = self.config.collision_radius;

        for i in 0..self.nodes.len() {
            for j in (i + 1)..self.nodes.len() {
                let dx = self.nodes[j].x - self.nodes[i].x;
                let dy = self.nodes[j].y - self.nodes[i].y;
                let dist = (dx * dx + dy * dy).max(EPSILON).sqrt();
                if dist >= min_dist {
                    continue;
                }
                let overlap = (min_dist - dist) / 2.0 * self.config.collision_strength;
                let ox = (dx / dist) * overlap;
                let oy = (dy / dist) * overlap;
                if self.nodes[i].pinned.is_none() {
                    self.nodes[i].x -= ox;
                    self.nodes[i].y -= oy;
                }
                if self.nodes[j].pinned.is_none() {
                    self.nodes[j].x += ox;
                    self.nodes[j].y += oy;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use procflow_core::{build_graph, simplify, Event};

    fn chain_graph(activities: &[&str]) -> SimplifiedGraph {
        let mut events = Vec::new();
        for (i, activity) in activities.iter().enumerate() {
            events.push(Event::new(
                "c1",
                *activity,
                Utc.with_ymd_and_hms(2025, 1, 1, 0, i as u32, 0).unwrap(),
            ));
        }
        simplify(&build_graph(&events), 1.0)
    }

    fn settled_engine(activities: &[&str]) -> LayoutEngine {
        let mut engine = LayoutEngine::new(&chain_graph(activities), LayoutConfig::default());
        engine.settle();
        engine
    }

    #[test]
    fn test_lanes_keep_discovery_order() {
        let engine = settled_engine(&["A", "B", "C", "D", "E"]);
        let xs: Vec<f64> = engine.nodes().iter().map(|n| n.x).collect();
        for pair in xs.windows(2) {
            assert!(
                pair[0] < pair[1],
                "lane order violated: {:?}",
                engine
                    .nodes()
                    .iter()
                    .map(|n| (n.id.clone(), n.x))
                    .collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_minimum_separation_holds() {
        let engine = settled_engine(&["A", "B", "C", "D"]);
        let nodes = engine.nodes();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let dx = nodes[i].x - nodes[j].x;
                let dy = nodes[i].y - nodes[j].y;
                let dist = (dx * dx + dy * dy).sqrt();
                assert!(
                    dist >= 139.0,
                    "{} and {} are {dist:.1} apart",
                    nodes[i].id,
                    nodes[j].id
                );
            }
        }
    }

    #[test]
    fn test_positions_stay_finite() {
        let engine = settled_engine(&["A", "B", "C", "D", "E", "F", "G", "H"]);
        for node in engine.nodes() {
            assert!(node.x.is_finite() && node.y.is_finite(), "{}", node.id);
        }
    }

    #[test]
    fn test_drag_pins_node() {
        let mut engine = settled_engine(&["A", "B", "C"]);
        engine.begin_drag("B");
        engine.drag_to("B", 42.0, 77.0);
        let (x, y) = engine.position("B").unwrap();
        assert_eq!((x, y), (42.0, 77.0));

        // further ticks must not move a pinned node
        engine.tick();
        engine.tick();
        assert_eq!(engine.position("B").unwrap(), (42.0, 77.0));

        engine.end_drag("B");
        engine.tick();
        assert_ne!(engine.position("B").unwrap(), (42.0, 77.0));
    }

    #[test]
    fn test_drag_without_begin_is_ignored() {
        let mut engine = settled_engine(&["A", "B"]);
        let before = engine.position("A").unwrap();
        engine.drag_to("A", 0.0, 0.0);
        assert_eq!(engine.position("A").unwrap(), before);
    }

    #[test]
    fn test_unknown_node_position_is_none() {
        let engine = settled_engine(&["A", "B"]);
        assert!(engine.position("nope").is_none());
    }

    #[test]
    fn test_single_node_graph_settles() {
        let engine = settled_engine(&["Only"]);
        assert_eq!(engine.nodes().len(), 1);
        let node = &engine.nodes()[0];
        assert!(node.x.is_finite() && node.y.is_finite());
    }

    #[test]
    fn test_self_loop_does_not_blow_up() {
        // A -> A -> B gives a self loop link on A
        let events = vec![
            Event::new("c", "A", Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            Event::new("c", "A", Utc.with_ymd_and_hms(2025, 1, 1, 0, 1, 0).unwrap()),
            Event::new("c", "B", Utc.with_ymd_and_hms(2025, 1, 1, 0, 2, 0).unwrap()),
        ];
        let graph = simplify(&build_graph(&events), 1.0);
        let mut engine = LayoutEngine::new(&graph, LayoutConfig::default());
        engine.settle();
        for node in engine.nodes() {
            assert!(node.x.is_finite() && node.y.is_finite());
        }
    }
}
