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

//! Case-duration statistics and derived dashboard metrics.
//!
//! Core figures (mean/median lead time, observed span) follow directly
//! from the traces. The derived figures are deliberately plain,
//! deterministic formulas so repeated runs over the same log always
//! produce the same labels:
//!
//! - efficiency: share of the observed span *not* consumed by the mean
//!   case, scaled to 0-100
//! - ROI label: `$25/mo` per case
//! - throughput: events per observed day (spans under a day count as one)
//! - failure rate: cases whose final activity carries a failure marker
//! - delivery labels: case-count banding plus mean-derived lead time and
//!   restore time (0.4x mean)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::graph::ProcessGraph;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// A case whose final activity contains one of these markers counts as
/// failed. Covers the Spanish-language logs this tool grew up on plus the
/// obvious English forms.
const FAILURE_MARKERS: &[&str] = &["rechazo", "error", "falla", "reject", "fail"];

/// Delivery-flow labels in the style of DORA reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoraMetrics {
    /// Case-count banding: more than 20 cases is "high", more than 10 is
    /// "medium", anything else "low"
    pub deployment_frequency: String,
    /// Mean lead time, formatted
    pub lead_time: String,
    /// Failed-case share, formatted as a percentage
    pub failure_rate: String,
    /// Restore estimate: 0.4x the mean lead time, formatted
    pub time_to_restore: String,
}

/// Aggregate statistics for one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub events: usize,
    pub cases: usize,
    pub activities: usize,
    /// Mean lead time across cases with at least two events, in ms
    pub mean_duration_ms: i64,
    /// Median lead time across cases with at least two events, in ms
    pub median_duration_ms: i64,
    /// Formatted mean lead time
    pub mean_duration: String,
    /// Formatted median lead time
    pub median_duration: String,
    /// Earliest retained event timestamp
    pub start: Option<DateTime<Utc>>,
    /// Latest retained event timestamp
    pub end: Option<DateTime<Utc>>,
    /// 0-100 efficiency score
    pub efficiency: u8,
    /// Monthly return estimate label
    pub roi: String,
    /// Events-per-day label
    pub throughput: String,
    /// Failed-case share in [0, 1]
    pub failure_rate: f64,
    pub dora: DoraMetrics,
}

impl DatasetStats {
    /// Observed time span in milliseconds; zero when the log holds a
    /// single instant.
    pub fn span_ms(&self) -> i64 {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (end - start).num_milliseconds(),
            _ => 0,
        }
    }
}

/// Compute dataset statistics from the retained events and their graph.
///
/// Cases with fewer than two events are excluded from the duration
/// distribution but still counted in the case total. The span is the
/// global min/max across all retained events, not per-case bounds.
pub fn compute_stats(events: &[Event], graph: &ProcessGraph) -> DatasetStats {
    let start = events.iter().map(|e| e.timestamp).min();
    let end = events.iter().map(|e| e.timestamp).max();
    let span_ms = match (start, end) {
        (Some(start), Some(end)) => (end - start).num_milliseconds(),
        _ => 0,
    };

    let mut durations: Vec<i64> = graph.cases.iter().filter_map(|c| c.lead_time_ms()).collect();
    durations.sort_unstable();

    let mean_ms = if durations.is_empty() {
        0
    } else {
        durations.iter().sum::<i64>() / durations.len() as i64
    };
    let median_ms = median(&durations);

    let failed = graph
        .cases
        .iter()
        .filter(|c| {
            c.events
                .last()
                .map(|e| is_failure_activity(&e.activity))
                .unwrap_or(false)
        })
        .count();
    let failure_rate = if graph.cases.is_empty() {
        0.0
    } else {
        failed as f64 / graph.cases.len() as f64
    };

    let dora = DoraMetrics {
        deployment_frequency: frequency_band(graph.cases.len()).to_string(),
        lead_time: format_duration(mean_ms),
        failure_rate: format!("{:.1}%", failure_rate * 100.0),
        time_to_restore: format_duration((mean_ms as f64 * 0.4) as i64),
    };

    DatasetStats {
        events: events.len(),
        cases: graph.cases.len(),
        activities: graph.nodes.len(),
        mean_duration_ms: mean_ms,
        median_duration_ms: median_ms,
        mean_duration: format_duration(mean_ms),
        median_duration: format_duration(median_ms),
        start,
        end,
        efficiency: efficiency_score(mean_ms, span_ms),
        roi: format!("${}/mo", graph.cases.len() * 25),
        throughput: throughput_label(events.len(), span_ms),
        failure_rate,
        dora,
    }
}

/// Median of an ascending-sorted duration list; the two middle values are
/// averaged for even counts.
fn median(sorted: &[i64]) -> i64 {
    if sorted.is_empty() {
        return 0;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2
    } else {
        sorted[mid]
    }
}

fn is_failure_activity(activity: &str) -> bool {
    let lowered = activity.to_lowercase();
    FAILURE_MARKERS.iter().any(|marker| lowered.contains(marker))
}

fn frequency_band(cases: usize) -> &'static str {
    if cases > 20 {
        "high"
    } else if cases > 10 {
        "medium"
    } else {
        "low"
    }
}

/// Share of the observed span not consumed by the mean case, on a 0-100
/// scale. Instantaneous cases score 100; a mean that fills (or exceeds)
/// the whole span scores 0.
fn efficiency_score(mean_ms: i64, span_ms: i64) -> u8 {
    if span_ms <= 0 {
        return 100;
    }
    let pressure = (mean_ms.max(0) * 100) / span_ms;
    (100 - pressure.clamp(0, 100)) as u8
}

/// Events per observed day. Spans shorter than one day count as a full
/// day so short logs do not report absurd rates.
fn throughput_label(events: usize, span_ms: i64) -> String {
    let days = (span_ms as f64 / MS_PER_DAY as f64).max(1.0);
    format!("{:.1} ev/day", events as f64 / days)
}

/// Format a millisecond duration as its two largest non-zero units among
/// days, hours, minutes, and seconds. Non-positive and sub-second inputs
/// render as "0s".
pub fn format_duration(ms: i64) -> String {
    const UNITS: &[(&str, i64)] = &[
        ("d", MS_PER_DAY),
        ("h", MS_PER_HOUR),
        ("m", MS_PER_MINUTE),
        ("s", MS_PER_SECOND),
    ];

    if ms <= 0 {
        return "0s".to_string();
    }

    let mut parts = Vec::with_capacity(2);
    let mut rest = ms;
    for (suffix, size) in UNITS {
        let value = rest / size;
        rest %= size;
        if value > 0 {
            parts.push(format!("{value}{suffix}"));
            if parts.len() == 2 {
                break;
            }
        }
    }

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}
