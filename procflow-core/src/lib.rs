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

//! Procflow Core
//!
//! Event-log ingestion and process-graph reconstruction: parsing raw
//! delimited text into validated events, aggregating them into per-case
//! traces and a weighted directed transition graph, computing duration
//! statistics, and reducing the graph by edge weight for display.

pub mod dataset;
pub mod demo;
pub mod error;
pub mod event;
pub mod graph;
pub mod parser;
pub mod simplify;
pub mod stats;
pub mod validate;

pub use dataset::Dataset;
pub use demo::{demo_log, DemoLog, DEMO_LOGS};
pub use error::{ProcflowError, Result};
pub use event::Event;
pub use graph::{build_graph, CaseTrace, ProcessGraph, ProcessLink, ProcessNode};
pub use parser::parse_log;
pub use simplify::{simplify, SimplifiedGraph, MAX_RATIO, MIN_RATIO};
pub use stats::{compute_stats, format_duration, DatasetStats, DoraMetrics};
pub use validate::{validate_dataset, ValidationReport};
