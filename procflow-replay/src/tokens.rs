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

//! Per-tick token derivation.
//!
//! A token is the visual marker of one in-flight case. Tokens are derived
//! fresh from the simulated time on every tick and never stored: the trace
//! is the source of truth, so scrubbing backwards needs no bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use procflow_core::CaseTrace;

/// A transition taking longer than this share of the observed span is
/// flagged as a bottleneck.
pub const CRITICAL_SPAN_FRACTION: f64 = 0.15;

/// One in-flight case at one instant of simulated time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveToken {
    pub case_id: String,
    /// Activity the case is leaving
    pub source: String,
    /// Activity the case is moving toward
    pub target: String,
    /// Position along the transition edge in [0,1]
    pub fraction: f64,
    /// True when this transition's duration marks it as a bottleneck
    pub critical: bool,
}

/// Derive the active token for one case, or `None` when the case has not
/// started yet or has already finished at the given instant.
///
/// The fraction is the share of the transition's duration already elapsed,
/// clamped to [0,1]; a zero-duration transition reports exactly 1.0.
pub fn active_token(
    case: &CaseTrace,
    simulated_time: DateTime<Utc>,
    span_ms: i64,
) -> Option<ActiveToken> {
    // latest event at or before the simulated instant
    let reached = case
        .events
        .partition_point(|e| e.timestamp <= simulated_time);
    if reached == 0 || reached >= case.events.len() {
        return None;
    }

    let current = &case.events[reached - 1];
    let next = &case.events[reached];

    let edge_ms = (next.timestamp - current.timestamp).num_milliseconds();
    let fraction = if edge_ms <= 0 {
        1.0
    } else {
        let elapsed = (simulated_time - current.timestamp).num_milliseconds();
        (elapsed as f64 / edge_ms as f64).clamp(0.0, 1.0)
    };

    let critical = span_ms > 0 && edge_ms as f64 > span_ms as f64 * CRITICAL_SPAN_FRACTION;

    Some(ActiveToken {
        case_id: case.case_id.clone(),
        source: current.activity.clone(),
        target: next.activity.clone(),
        fraction,
        critical,
    })
}

/// Derive tokens for every in-flight case at one instant.
pub fn active_tokens(
    cases: &[CaseTrace],
    simulated_time: DateTime<Utc>,
    span_ms: i64,
) -> Vec<ActiveToken> {
    cases
        .iter()
        .filter_map(|case| active_token(case, simulated_time, span_ms))
        .collect()
}
