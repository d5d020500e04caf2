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

//! Process graph reconstruction.
//!
//! Aggregates a globally ordered event stream into per-case traces, the
//! distinct-activity node set, and weighted directed transition links.
//! Discovery order is preserved everywhere so repeated builds over the same
//! log produce identical output.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::event::Event;

/// A distinct activity observed in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessNode {
    /// Node id; equals the activity name
    pub id: String,
    /// Display label
    pub label: String,
    /// Optional high-level grouping for presentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A directed transition between two activities.
///
/// Links are deduplicated: every case observed making the same consecutive
/// step increments one shared weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessLink {
    pub source: String,
    pub target: String,
    pub weight: u64,
}

/// One end-to-end process instance: the ordered events sharing a case id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseTrace {
    pub case_id: String,
    pub events: Vec<Event>,
}

impl CaseTrace {
    /// Lead time in milliseconds between the first and last event. Traces
    /// with fewer than two events have no lead time; counting them as zero
    /// would bias the duration distribution.
    pub fn lead_time_ms(&self) -> Option<i64> {
        if self.events.len() < 2 {
            return None;
        }
        let first = self.events.first()?.timestamp;
        let last = self.events.last()?.timestamp;
        Some((last - first).num_milliseconds())
    }

    /// Number of consecutive transitions in this trace
    pub fn transition_count(&self) -> usize {
        self.events.len().saturating_sub(1)
    }
}

/// Node and link sets plus per-case traces for one event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessGraph {
    pub nodes: Vec<ProcessNode>,
    pub links: Vec<ProcessLink>,
    pub cases: Vec<CaseTrace>,
}

impl ProcessGraph {
    /// Sum of all link weights; equals the total transition count across
    /// every trace.
    pub fn total_weight(&self) -> u64 {
        self.links.iter().map(|l| l.weight).sum()
    }
}

/// Aggregate globally sorted events into nodes, weighted links, and
/// per-case traces.
///
/// Events must already be sorted by timestamp: grouping preserves the
/// stream order inside each case, so consecutive positions in a trace are
/// exactly the observed transitions. A case with a single event
/// contributes a node and a trace but no links.
pub fn build_graph(events: &[Event]) -> ProcessGraph {
    let mut nodes: Vec<ProcessNode> = Vec::new();
    let mut node_index: HashMap<String, usize> = HashMap::new();

    let mut cases: Vec<CaseTrace> = Vec::new();
    let mut case_index: HashMap<String, usize> = HashMap::new();

    for event in events {
        if !node_index.contains_key(&event.activity) {
            node_index.insert(event.activity.clone(), nodes.len());
            nodes.push(ProcessNode {
                id: event.activity.clone(),
                label: event.activity.clone(),
                category: None,
            });
        }

        let case_slot = match case_index.get(&event.case_id) {
            Some(&idx) => idx,
            None => {
                case_index.insert(event.case_id.clone(), cases.len());
                cases.push(CaseTrace {
                    case_id: event.case_id.clone(),
                    events: Vec::new(),
                });
                cases.len() - 1
            }
        };
        cases[case_slot].events.push(event.clone());
    }

    let mut link_order: Vec<(String, String)> = Vec::new();
    let mut link_weights: HashMap<(String, String), u64> = HashMap::new();
    for case in &cases {
        for pair in case.events.windows(2) {
            let key = (pair[0].activity.clone(), pair[1].activity.clone());
            match link_weights.get_mut(&key) {
                Some(weight) => *weight += 1,
                None => {
                    link_weights.insert(key.clone(), 1);
                    link_order.push(key);
                }
            }
        }
    }

    let links: Vec<ProcessLink> = link_order
        .into_iter()
        .map(|key| {
            let weight = link_weights[&key];
            ProcessLink {
                source: key.0,
                target: key.1,
                weight,
            }
        })
        .collect();

    debug!(
        node_count = nodes.len(),
        link_count = links.len(),
        case_count = cases.len(),
        "Built process graph"
    );

    ProcessGraph {
        nodes,
        links,
        cases,
    }
}
