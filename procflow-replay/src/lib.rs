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

//! Procflow Replay
//!
//! Time-synchronized replay of event logs over a process graph. A single
//! simulated clock maps a [0,1] progress scalar onto the dataset's
//! observed time span; every frame, each in-flight case resolves to one
//! token positioned along its current transition edge. The session
//! container owns all mutable replay state (dataset, clock, resolution) so
//! playback controls and dataset swaps go through one code path.

pub mod clock;
pub mod path;
pub mod session;
pub mod tokens;

pub use clock::{ClockState, ReplayClock, MAX_SPEED, MIN_SPEED};
pub use path::{token_position, EdgePath};
pub use session::{IngestTicket, ReplaySession};
pub use tokens::{active_tokens, ActiveToken};
