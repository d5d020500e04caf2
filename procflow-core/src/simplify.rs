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

//! Edge-weight graph simplification.
//!
//! Dense logs render as spaghetti; keeping only the heaviest share of
//! links recovers the dominant flow. Simplification is a pure function of
//! the graph and the ratio, recomputed whenever either changes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::graph::{ProcessGraph, ProcessLink, ProcessNode};

/// Lowest resolution exposed on the control surface
pub const MIN_RATIO: f64 = 0.05;

/// Full-detail resolution
pub const MAX_RATIO: f64 = 1.0;

/// A reduced view of a process graph: the kept links and the nodes they
/// touch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedGraph {
    pub nodes: Vec<ProcessNode>,
    pub links: Vec<ProcessLink>,
}

/// Keep the heaviest `ratio` share of links plus the nodes they touch.
///
/// At least one link survives any positive ratio. The first and last
/// discovered nodes survive every cut so the diagram keeps visible
/// start/end anchors. The weight sort is stable: links of equal weight
/// keep discovery order, which makes the kept set at a smaller ratio a
/// prefix of the kept set at a larger one.
pub fn simplify(graph: &ProcessGraph, ratio: f64) -> SimplifiedGraph {
    let ratio = ratio.clamp(MIN_RATIO, MAX_RATIO);

    if graph.links.is_empty() {
        return SimplifiedGraph {
            nodes: graph.nodes.clone(),
            links: Vec::new(),
        };
    }

    let mut links = graph.links.clone();
    links.sort_by(|a, b| b.weight.cmp(&a.weight));
    let limit = ((ratio * links.len() as f64).ceil() as usize).max(1);
    links.truncate(limit);

    let mut kept: HashSet<&str> = links
        .iter()
        .flat_map(|l| [l.source.as_str(), l.target.as_str()])
        .collect();
    if let (Some(first), Some(last)) = (graph.nodes.first(), graph.nodes.last()) {
        kept.insert(first.id.as_str());
        kept.insert(last.id.as_str());
    }

    let nodes = graph
        .nodes
        .iter()
        .filter(|n| kept.contains(n.id.as_str()))
        .cloned()
        .collect();

    SimplifiedGraph { nodes, links }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::graph::build_graph;
    use chrono::{TimeZone, Utc};

    /// Three cases walking A->B->C->D with an extra A->B hop, so weights
    /// separate cleanly: A->B = 4, B->C = 3, C->D = 3.
    fn sample_graph() -> ProcessGraph {
        let mut events = Vec::new();
        let mut minute = 0u32;
        let mut push = |case: &str, activity: &str, events: &mut Vec<Event>| {
            events.push(Event::new(
                case,
                activity,
                Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 0).unwrap(),
            ));
            minute += 1;
        };
        for case in ["c1", "c2", "c3"] {
            for activity in ["A", "B", "C", "D"] {
                push(case, activity, &mut events);
            }
        }
        push("c4", "A", &mut events);
        push("c4", "B", &mut events);
        build_graph(&events)
    }

    #[test]
    fn test_full_ratio_keeps_everything() {
        let graph = sample_graph();
        let simplified = simplify(&graph, 1.0);
        assert_eq!(simplified.links.len(), graph.links.len());
        assert_eq!(simplified.nodes.len(), graph.nodes.len());
    }

    #[test]
    fn test_minimum_one_link_survives() {
        let graph = sample_graph();
        let simplified = simplify(&graph, 0.05);
        assert_eq!(simplified.links.len(), 1);
        assert_eq!(simplified.links[0].source, "A");
        assert_eq!(simplified.links[0].target, "B");
    }

    #[test]
    fn test_smaller_ratio_is_prefix_of_larger() {
        let graph = sample_graph();
        let small = simplify(&graph, 0.34);
        let large = simplify(&graph, 0.67);
        assert!(small.links.len() <= large.links.len());
        assert_eq!(&large.links[..small.links.len()], &small.links[..]);
    }

    #[test]
    fn test_anchor_nodes_always_survive() {
        let graph = sample_graph();
        // first discovered is A, last discovered is D
        let simplified = simplify(&graph, 0.05);
        let ids: HashSet<&str> = simplified.nodes.iter().map(|n| n.id.as_str()).collect();
        assert!(ids.contains("A"));
        assert!(ids.contains("D"));
        // D only survives through the anchor rule at this ratio
        assert!(!simplified
            .links
            .iter()
            .any(|l| l.source == "D" || l.target == "D"));
    }

    #[test]
    fn test_linkless_graph_passes_through() {
        let events = vec![Event::new(
            "solo",
            "Only",
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        )];
        let graph = build_graph(&events);
        let simplified = simplify(&graph, 0.5);
        assert_eq!(simplified.nodes.len(), 1);
        assert!(simplified.links.is_empty());
    }

    #[test]
    fn test_out_of_range_ratio_is_clamped() {
        let graph = sample_graph();
        assert_eq!(simplify(&graph, 7.5).links.len(), graph.links.len());
        assert_eq!(simplify(&graph, -1.0).links.len(), 1);
    }
}
