//! Achsparallele Bounding-Boxen je Geometrie-Primitiv.

use glam::DVec2;

use crate::core::{GeometryPrimitive, RoadNetwork};
use crate::shared::{BBoxApproximation, CompilerOptions};

/// Eine Zeile der BBox-Tabelle: `[x_min, y_min, x_max, y_max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBoxEntry {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BBoxEntry {
    /// Spaltenreihenfolge der Tabelle.
    pub fn to_row(&self) -> [f64; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }

    fn enclosing(points: &[DVec2], pad: f64) -> Self {
        let min = points.iter().copied().fold(DVec2::splat(f64::INFINITY), DVec2::min);
        let max = points
            .iter()
            .copied()
            .fold(DVec2::splat(f64::NEG_INFINITY), DVec2::max);
        Self {
            x_min: min.x - pad,
            y_min: min.y - pad,
            x_max: max.x + pad,
            y_max: max.y + pad,
        }
    }
}

/// Bounding-Box eines Primitivs mit halber Nennbreite `half_width`.
pub fn primitive_bbox(
    primitive: &GeometryPrimitive,
    half_width: f64,
    approximation: BBoxApproximation,
) -> BBoxEntry {
    let start = primitive.start();
    let end = primitive.end();

    match approximation {
        // Bei negativer Laufrichtung kann x_min > x_max sein
        BBoxApproximation::StartEnd => BBoxEntry {
            x_min: start.x - half_width,
            y_min: start.y - half_width,
            x_max: end.x + half_width,
            y_max: end.y + half_width,
        },
        BBoxApproximation::Extent => BBoxEntry::enclosing(&[start, end], half_width),
        BBoxApproximation::Footprint => {
            let offset = primitive.lateral() * half_width;
            BBoxEntry::enclosing(
                &[start + offset, start - offset, end + offset, end - offset],
                0.0,
            )
        }
    }
}

/// Eine Box pro Primitiv in Dokumentreihenfolge, ohne Deduplizierung.
pub fn extract_bboxes(network: &RoadNetwork, options: &CompilerOptions) -> Vec<BBoxEntry> {
    let half_width = options.bbox_nominal_width / 2.0;
    network
        .roads
        .iter()
        .flat_map(|road| road.geometry.iter())
        .map(|primitive| primitive_bbox(primitive, half_width, options.bbox_approximation))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn assert_bbox(actual: BBoxEntry, expected: [f64; 4]) {
        for (a, e) in actual.to_row().iter().zip(expected) {
            assert_relative_eq!(*a, e, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_start_end_nominal_width() {
        let primitive = GeometryPrimitive::line(0.0, 0.0, 0.0, 10.0);
        let bbox = primitive_bbox(&primitive, 1.75, BBoxApproximation::StartEnd);
        assert_bbox(bbox, [-1.75, -1.75, 11.75, 1.75]);
    }

    #[test]
    fn test_start_end_can_invert_for_westward_heading() {
        let primitive = GeometryPrimitive::line(10.0, 0.0, PI, 10.0);
        let bbox = primitive_bbox(&primitive, 1.75, BBoxApproximation::StartEnd);
        assert!(bbox.x_min > bbox.x_max);

        let bbox = primitive_bbox(&primitive, 1.75, BBoxApproximation::Extent);
        assert_bbox(bbox, [-1.75, -1.75, 11.75, 1.75]);
    }

    #[test]
    fn test_footprint_follows_heading() {
        let primitive = GeometryPrimitive::line(0.0, 0.0, FRAC_PI_2, 4.0);
        let bbox = primitive_bbox(&primitive, 1.0, BBoxApproximation::Footprint);
        assert_bbox(bbox, [-1.0, 0.0, 1.0, 4.0]);

        let diagonal = GeometryPrimitive::line(0.0, 0.0, FRAC_PI_4, 2.0_f64.sqrt());
        let bbox = primitive_bbox(&diagonal, 0.0, BBoxApproximation::Footprint);
        assert_bbox(bbox, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_extract_one_row_per_primitive() {
        let network = RoadNetwork {
            name: None,
            roads: vec![
                crate::core::RoadSegment {
                    geometry: vec![
                        GeometryPrimitive::line(0.0, 0.0, 0.0, 1.0),
                        GeometryPrimitive::line(1.0, 0.0, 0.0, 1.0),
                    ],
                    ..Default::default()
                },
                crate::core::RoadSegment::default(),
            ],
        };
        let boxes = extract_bboxes(&network, &CompilerOptions::default());
        assert_eq!(boxes.len(), 2);
        assert_relative_eq!(boxes[1].x_min, 1.0 - 1.75);
    }
}
