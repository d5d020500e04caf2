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

//! Edge path geometry.
//!
//! Transition edges render as shallow circular arcs (radius 1.5x the
//! chord) bowing to one side of the straight connection; near-vertical
//! chords fall back to a straight segment. Token placement needs
//! point-at-length rather than point-at-parameter, so each path is
//! flattened once into a polyline with cumulative arc lengths and then
//! interpolated linearly within segments.

use serde::{Deserialize, Serialize};

use procflow_layout::LayoutEngine;

use crate::tokens::ActiveToken;

/// Arc radius as a multiple of the chord length
const RADIUS_FACTOR: f64 = 1.5;

/// Chords with less horizontal travel than this render straight
const STRAIGHT_THRESHOLD: f64 = 40.0;

/// Flattening resolution
const ARC_SEGMENTS: usize = 32;

/// A flattened edge path with cumulative lengths for point-at-length
/// lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgePath {
    points: Vec<(f64, f64)>,
    cumulative: Vec<f64>,
    total: f64,
}

impl EdgePath {
    /// Build the path between two laid-out node positions.
    pub fn between(source: (f64, f64), target: (f64, f64)) -> EdgePath {
        let dx = target.0 - source.0;
        let dy = target.1 - source.1;
        let chord = (dx * dx + dy * dy).sqrt();

        if chord < f64::EPSILON || dx.abs() < STRAIGHT_THRESHOLD {
            return Self::from_points(vec![source, target]);
        }

        let radius = chord * RADIUS_FACTOR;
        // center sits perpendicular to the chord midpoint, on the side
        // that bows the arc upward for left-to-right edges
        let mid = ((source.0 + target.0) / 2.0, (source.1 + target.1) / 2.0);
        let offset = (radius * radius - (chord / 2.0) * (chord / 2.0)).sqrt();
        let normal = (dy / chord, -dx / chord);
        let center = (mid.0 - normal.0 * offset, mid.1 - normal.1 * offset);

        let start_angle = (source.1 - center.1).atan2(source.0 - center.0);
        let end_angle = (target.1 - center.1).atan2(target.0 - center.0);

        // minor arc from source to target
        let mut sweep = end_angle - start_angle;
        if sweep > std::f64::consts::PI {
            sweep -= 2.0 * std::f64::consts::PI;
        } else if sweep < -std::f64::consts::PI {
            sweep += 2.0 * std::f64::consts::PI;
        }

        let points = (0..=ARC_SEGMENTS)
            .map(|i| {
                let angle = start_angle + sweep * (i as f64 / ARC_SEGMENTS as f64);
                (
                    center.0 + radius * angle.cos(),
                    center.1 + radius * angle.sin(),
                )
            })
            .collect();
        Self::from_points(points)
    }

    fn from_points(points: Vec<(f64, f64)>) -> EdgePath {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cumulative.push(0.0);
        for pair in points.windows(2) {
            let dx = pair[1].0 - pair[0].0;
            let dy = pair[1].1 - pair[0].1;
            total += (dx * dx + dy * dy).sqrt();
            cumulative.push(total);
        }
        EdgePath {
            points,
            cumulative,
            total,
        }
    }

    pub fn total_length(&self) -> f64 {
        self.total
    }

    /// Point at an arc-length distance from the start, clamped to the
    /// path ends.
    pub fn point_at_length(&self, length: f64) -> (f64, f64) {
        if self.total <= 0.0 {
            return self.points[0];
        }
        let length = length.clamp(0.0, self.total);

        let segment = self
            .cumulative
            .partition_point(|&c| c <= length)
            .min(self.points.len() - 1);
        let (prev_len, prev) = (self.cumulative[segment - 1], self.points[segment - 1]);
        let (next_len, next) = (self.cumulative[segment], self.points[segment]);

        let segment_len = next_len - prev_len;
        if segment_len <= 0.0 {
            return prev;
        }
        let t = (length - prev_len) / segment_len;
        (prev.0 + (next.0 - prev.0) * t, prev.1 + (next.1 - prev.1) * t)
    }

    /// Point at a fractional position in [0,1] along the path.
    pub fn point_at_fraction(&self, fraction: f64) -> (f64, f64) {
        self.point_at_length(fraction.clamp(0.0, 1.0) * self.total)
    }
}

/// Map a token onto its rendered edge path.
///
/// Returns `None` when either endpoint is absent from the current layout,
/// which happens when simplification dropped the activity after the token
/// was derived. The token is simply not drawn that frame.
pub fn token_position(layout: &LayoutEngine, token: &ActiveToken) -> Option<(f64, f64)> {
    let source = layout.position(&token.source)?;
    let target = layout.position(&token.target)?;
    Some(EdgePath::between(source, target).point_at_fraction(token.fraction))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-6 && (a.1 - b.1).abs() < 1e-6
    }

    #[test]
    fn test_endpoints_are_exact() {
        let path = EdgePath::between((0.0, 0.0), (300.0, 100.0));
        assert!(close(path.point_at_fraction(0.0), (0.0, 0.0)));
        assert!(close(path.point_at_fraction(1.0), (300.0, 100.0)));
    }

    #[test]
    fn test_near_vertical_chord_is_straight() {
        let path = EdgePath::between((100.0, 0.0), (110.0, 400.0));
        // straight segment: midpoint of the chord at half length
        assert!(close(path.point_at_fraction(0.5), (105.0, 200.0)));
        let chord = (10.0f64 * 10.0 + 400.0 * 400.0).sqrt();
        assert!((path.total_length() - chord).abs() < 1e-6);
    }

    #[test]
    fn test_arc_is_longer_than_chord() {
        let path = EdgePath::between((0.0, 0.0), (300.0, 0.0));
        assert!(path.total_length() > 300.0);
        // radius 1.5x chord subtends 2*asin(1/3) of circumference
        let expected = 2.0 * (1.0f64 / 3.0).asin() * 450.0;
        assert!((path.total_length() - expected).abs() < 1.0);
    }

    #[test]
    fn test_arc_bows_off_the_chord() {
        let path = EdgePath::between((0.0, 0.0), (300.0, 0.0));
        let (_, y) = path.point_at_fraction(0.5);
        // sagitta of the r = 1.5c arc
        let sagitta = 450.0 - (450.0f64 * 450.0 - 150.0 * 150.0).sqrt();
        assert!((y.abs() - sagitta).abs() < 1.0, "midpoint y = {y}");
    }

    #[test]
    fn test_length_is_monotone_along_path() {
        let path = EdgePath::between((0.0, 0.0), (250.0, 120.0));
        let mut last_x = f64::MIN;
        for i in 0..=10 {
            let (x, _) = path.point_at_fraction(i as f64 / 10.0);
            assert!(x > last_x, "x must advance along a left-to-right arc");
            last_x = x;
        }
    }

    #[test]
    fn test_out_of_range_lengths_clamp() {
        let path = EdgePath::between((0.0, 0.0), (300.0, 0.0));
        assert!(close(path.point_at_length(-50.0), path.point_at_fraction(0.0)));
        assert!(close(
            path.point_at_length(path.total_length() + 50.0),
            path.point_at_fraction(1.0)
        ));
    }

    #[test]
    fn test_coincident_endpoints_degenerate_gracefully() {
        let path = EdgePath::between((42.0, 42.0), (42.0, 42.0));
        assert_eq!(path.total_length(), 0.0);
        assert_eq!(path.point_at_fraction(0.5), (42.0, 42.0));
    }

    #[test]
    fn test_half_length_point_is_half_way() {
        let path = EdgePath::between((0.0, 0.0), (300.0, 80.0));
        let half = path.point_at_length(path.total_length() / 2.0);
        let also_half = path.point_at_fraction(0.5);
        assert!(close(half, also_half));
    }

    #[test]
    fn test_token_position_skips_missing_endpoints() {
        use chrono::{TimeZone, Utc};
        use procflow_core::{build_graph, simplify, Event};
        use procflow_layout::LayoutConfig;

        let events = vec![
            Event::new("c", "A", Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            Event::new("c", "B", Utc.with_ymd_and_hms(2025, 1, 1, 0, 1, 0).unwrap()),
        ];
        let graph = simplify(&build_graph(&events), 1.0);
        let mut layout = LayoutEngine::new(&graph, LayoutConfig::default());
        layout.settle();

        let token = ActiveToken {
            case_id: "c".to_string(),
            source: "A".to_string(),
            target: "B".to_string(),
            fraction: 0.0,
            critical: false,
        };
        // at fraction 0 the token sits on its source node
        let position = token_position(&layout, &token).unwrap();
        assert!(close(position, layout.position("A").unwrap()));

        // an endpoint the layout does not know is skipped, not an error
        let ghost = ActiveToken {
            target: "Ghost".to_string(),
            ..token
        };
        assert!(token_position(&layout, &ghost).is_none());
    }
}
