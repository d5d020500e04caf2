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

//! Event records produced by the log parser.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single event-log row: one activity executed for one case.
///
/// Events are immutable once parsed; everything downstream (traces, graph,
/// statistics, replay) is derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Case (process instance) identifier
    pub case_id: String,
    /// Activity name; becomes a node id in the process graph
    pub activity: String,
    /// Executing resource, when the log carries that column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Event completion time
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Construct an event without a resource attribution
    pub fn new(
        case_id: impl Into<String>,
        activity: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            activity: activity.into(),
            resource: None,
            timestamp,
        }
    }
}
