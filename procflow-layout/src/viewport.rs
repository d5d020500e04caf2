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

//! Fit-to-view transform.
//!
//! Computes a translate+scale that centers the laid-out graph in the
//! viewport. Pure viewport arithmetic: node positions and the underlying
//! dataset are untouched, so fitting can run on every resize without a
//! layout pass.

use serde::{Deserialize, Serialize};

use crate::simulation::LayoutNode;

/// Padding kept between the graph bounds and the viewport edge
const FIT_PADDING: f64 = 150.0;

/// Fitted content fills this share of the padded viewport
const FIT_FILL: f64 = 0.8;

/// The fitted view never zooms in past natural size
const MAX_SCALE: f64 = 1.0;

/// Axis-aligned bounding box of laid-out node centers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounding box over node centers; `None` when there are no nodes.
    pub fn of(nodes: &[LayoutNode]) -> Option<Bounds> {
        let first = nodes.first()?;
        let mut bounds = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for node in &nodes[1..] {
            bounds.min_x = bounds.min_x.min(node.x);
            bounds.min_y = bounds.min_y.min(node.y);
            bounds.max_x = bounds.max_x.max(node.x);
            bounds.max_y = bounds.max_y.max(node.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Viewport transform: scale about the origin, then translate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    /// Map a layout-space point into viewport space
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.scale + self.translate_x,
            y * self.scale + self.translate_y,
        )
    }
}

/// Compute the transform that centers the node set in a viewport.
///
/// Degenerate inputs (no nodes, all nodes coincident, zero-sized viewport)
/// fall back to the identity transform rather than producing infinities.
pub fn fit_transform(nodes: &[LayoutNode], viewport_width: f64, viewport_height: f64) -> ViewTransform {
    let bounds = match Bounds::of(nodes) {
        Some(b) => b,
        None => return ViewTransform::IDENTITY,
    };

    let padded_width = viewport_width - FIT_PADDING;
    let padded_height = viewport_height - FIT_PADDING;
    if bounds.width() <= 0.0 && bounds.height() <= 0.0 {
        // single point: center it at natural scale
        let (mid_x, mid_y) = bounds.center();
        return ViewTransform {
            translate_x: viewport_width / 2.0 - mid_x,
            translate_y: viewport_height / 2.0 - mid_y,
            scale: 1.0,
        };
    }
    if padded_width <= 0.0 || padded_height <= 0.0 {
        return ViewTransform::IDENTITY;
    }

    let stretch = (bounds.width() / padded_width).max(bounds.height() / padded_height);
    let scale = (FIT_FILL / stretch).min(MAX_SCALE);

    let (mid_x, mid_y) = bounds.center();
    ViewTransform {
        translate_x: viewport_width / 2.0 - mid_x * scale,
        translate_y: viewport_height / 2.0 - mid_y * scale,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{LayoutConfig, LayoutEngine};
    use chrono::{TimeZone, Utc};
    use procflow_core::{build_graph, simplify, Event};

    fn laid_out_nodes(count: usize) -> Vec<LayoutNode> {
        let mut events = Vec::new();
        for i in 0..count {
            events.push(Event::new(
                "c1",
                format!("step-{i}"),
                Utc.with_ymd_and_hms(2025, 1, 1, 0, i as u32, 0).unwrap(),
            ));
        }
        let graph = simplify(&build_graph(&events), 1.0);
        let mut engine = LayoutEngine::new(&graph, LayoutConfig::default());
        engine.settle();
        engine.nodes().to_vec()
    }

    #[test]
    fn test_fit_centers_content() {
        let nodes = laid_out_nodes(6);
        let transform = fit_transform(&nodes, 1200.0, 800.0);
        let bounds = Bounds::of(&nodes).unwrap();
        let (mid_x, mid_y) = bounds.center();
        let (cx, cy) = transform.apply(mid_x, mid_y);
        assert!((cx - 600.0).abs() < 1e-6);
        assert!((cy - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_fit_keeps_content_inside_viewport() {
        let nodes = laid_out_nodes(8);
        let (width, height) = (1000.0, 700.0);
        let transform = fit_transform(&nodes, width, height);
        for node in &nodes {
            let (x, y) = transform.apply(node.x, node.y);
            assert!((0.0..=width).contains(&x), "x={x}");
            assert!((0.0..=height).contains(&y), "y={y}");
        }
    }

    #[test]
    fn test_scale_never_exceeds_natural_size() {
        // two nearby nodes in a huge viewport must not be blown up
        let nodes = {
            let mut n = laid_out_nodes(2);
            n[0].x = 0.0;
            n[0].y = 0.0;
            n[1].x = 10.0;
            n[1].y = 10.0;
            n
        };
        let transform = fit_transform(&nodes, 4000.0, 4000.0);
        assert_eq!(transform.scale, MAX_SCALE);
    }

    #[test]
    fn test_empty_node_set_is_identity() {
        assert_eq!(fit_transform(&[], 800.0, 600.0), ViewTransform::IDENTITY);
    }

    #[test]
    fn test_single_point_is_centered_unscaled() {
        let mut nodes = laid_out_nodes(1);
        nodes[0].x = 300.0;
        nodes[0].y = 200.0;
        let transform = fit_transform(&nodes, 800.0, 600.0);
        assert_eq!(transform.scale, 1.0);
        assert_eq!(transform.apply(300.0, 200.0), (400.0, 300.0));
    }

    #[test]
    fn test_degenerate_viewport_is_identity() {
        let nodes = laid_out_nodes(3);
        assert_eq!(fit_transform(&nodes, 100.0, 80.0), ViewTransform::IDENTITY);
    }
}
