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

//! The dataset boundary object.
//!
//! A `Dataset` bundles everything the presentation layer consumes: the
//! node/link sets, the per-case traces, and aggregate statistics. It is
//! built in one pass from raw log text and replaced wholesale on the next
//! ingest; nothing mutates it in place.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::graph::{build_graph, CaseTrace, ProcessLink, ProcessNode};
use crate::parser::parse_log;
use crate::stats::{compute_stats, DatasetStats};

/// A fully built dataset: the sole contract between the core and any
/// consumer (flow map, panels, exporters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub description: String,
    pub nodes: Vec<ProcessNode>,
    pub links: Vec<ProcessLink>,
    pub cases: Vec<CaseTrace>,
    pub stats: DatasetStats,
}

impl Dataset {
    /// Parse raw log text and build the complete dataset.
    ///
    /// Construction is all-or-nothing: any error leaves no partial dataset
    /// behind, so a failed ingest cannot disturb a previously active one.
    pub fn from_log(id: &str, name: &str, raw: &str) -> Result<Dataset> {
        let events = parse_log(raw)?;
        let graph = build_graph(&events);
        let stats = compute_stats(&events, &graph);

        info!(
            dataset = name,
            events = stats.events,
            cases = stats.cases,
            activities = stats.activities,
            "Built dataset"
        );

        Ok(Dataset {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("{} events across {} cases", stats.events, stats.cases),
            nodes: graph.nodes,
            links: graph.links,
            cases: graph.cases,
            stats,
        })
    }

    /// Serialize for handoff to an external consumer or store.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
