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

//! Procflow Layout
//!
//! Force-directed arrangement of simplified process graphs. Nodes are
//! pulled into discovery-order lanes along the x axis so the diagram reads
//! as pipeline progression, while repulsion, link tension, and collision
//! constraints keep the picture legible. The simulation settles in one
//! synchronous burst at dataset load and only re-ticks while a node is
//! being dragged.

pub mod simulation;
pub mod viewport;

pub use simulation::{LayoutConfig, LayoutEngine, LayoutNode};
pub use viewport::{fit_transform, Bounds, ViewTransform};
