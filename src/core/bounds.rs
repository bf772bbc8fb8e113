//! Welt-Begrenzungsrechteck eines Straßennetzes (BoundsCalculator).

use super::road::RoadNetwork;

/// Achsparalleles Rechteck in Weltkoordinaten. Invariante: `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl MapBounds {
    /// Ersatz-Bounds, wenn keine Geometrie gefunden wurde.
    pub const FALLBACK: MapBounds = MapBounds {
        min_x: 0.0,
        max_x: 1.0,
        min_y: 0.0,
        max_y: 1.0,
    };

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Kleinstes Rechteck, das beide enthält.
    pub fn union(&self, other: &MapBounds) -> MapBounds {
        MapBounds {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Vergrößert das Rechteck auf allen vier Seiten um `margin`.
    pub fn inflate(&self, margin: f64) -> MapBounds {
        MapBounds {
            min_x: self.min_x - margin,
            max_x: self.max_x + margin,
            min_y: self.min_y - margin,
            max_y: self.max_y + margin,
        }
    }

    /// Prüft ob ein Punkt (inklusive Rand) im Rechteck liegt.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Ergebnis der Bounds-Berechnung. Ein Dokument ohne Geometrie ergibt `Degenerate`,
/// nie eine winzige `Measured`-Karte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundsOutcome {
    Measured(MapBounds),
    Degenerate,
}

impl BoundsOutcome {
    /// Liefert die gemessenen Bounds oder [`MapBounds::FALLBACK`].
    pub fn resolve(&self) -> MapBounds {
        match self {
            BoundsOutcome::Measured(bounds) => *bounds,
            BoundsOutcome::Degenerate => MapBounds::FALLBACK,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, BoundsOutcome::Degenerate)
    }

    /// Kombiniert zwei Ergebnisse; degenerierte Dokumente tragen nichts bei.
    pub fn merge(self, other: BoundsOutcome) -> BoundsOutcome {
        match (self, other) {
            (BoundsOutcome::Measured(a), BoundsOutcome::Measured(b)) => {
                BoundsOutcome::Measured(a.union(&b))
            }
            (BoundsOutcome::Measured(a), BoundsOutcome::Degenerate)
            | (BoundsOutcome::Degenerate, BoundsOutcome::Measured(a)) => {
                BoundsOutcome::Measured(a)
            }
            (BoundsOutcome::Degenerate, BoundsOutcome::Degenerate) => BoundsOutcome::Degenerate,
        }
    }
}

/// Sammelt Endpunkte und Spur-Ränder über ein oder mehrere Dokumente.
///
/// Endpunkte werden zu einer engen Hülle gefaltet; die Spur-Ränder
/// (`|laneOffset| + |width|` je Spur-Record) werden aufsummiert und erst in
/// [`BoundsCalculator::finish`] symmetrisch auf alle vier Seiten angewendet.
#[derive(Debug, Clone, Default)]
pub struct BoundsCalculator {
    extent: Option<MapBounds>,
    margin: f64,
}

impl BoundsCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Berechnet die Bounds eines einzelnen Dokuments.
    pub fn compute(network: &RoadNetwork) -> BoundsOutcome {
        let mut calculator = Self::new();
        calculator.accumulate(network);
        calculator.finish()
    }

    /// Faltet alle Primitive und Spuren eines Dokuments ein.
    pub fn accumulate(&mut self, network: &RoadNetwork) {
        for road in &network.roads {
            for primitive in &road.geometry {
                let start = primitive.start();
                let end = primitive.end();
                self.fold_point(start.x, start.y);
                self.fold_point(end.x, end.y);
            }

            for lane in road.lanes() {
                self.margin += road.lane_offset.abs() + lane.width_or_zero().abs();
            }
        }
    }

    fn fold_point(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            log::warn!("Nicht-endlicher Geometriepunkt ({}, {}) ignoriert", x, y);
            return;
        }
        let point = MapBounds {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        };
        self.extent = Some(match self.extent {
            Some(extent) => extent.union(&point),
            None => point,
        });
    }

    /// Enge Hülle der Endpunkte ohne Spur-Ränder.
    pub fn tight_extent(&self) -> Option<MapBounds> {
        self.extent
    }

    /// Summierter Spur-Rand.
    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn finish(&self) -> BoundsOutcome {
        match self.extent {
            Some(extent) => {
                let bounds = extent.inflate(self.margin);
                log::debug!(
                    "Bounds: min_x={:.3}, max_x={:.3}, min_y={:.3}, max_y={:.3} (Rand {:.3})",
                    bounds.min_x,
                    bounds.max_x,
                    bounds.min_y,
                    bounds.max_y,
                    self.margin
                );
                BoundsOutcome::Measured(bounds)
            }
            None => {
                log::warn!("Keine gültigen Bounds gefunden, verwende Standard (0, 1, 0, 1)");
                BoundsOutcome::Degenerate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::road::{GeometryPrimitive, LaneRecord, LaneSection, RoadSegment};
    use approx::assert_relative_eq;

    fn road_with(primitives: Vec<GeometryPrimitive>, widths: &[f64]) -> RoadSegment {
        RoadSegment {
            id: "1".to_string(),
            geometry: primitives,
            lane_sections: vec![LaneSection {
                s: 0.0,
                lanes: widths
                    .iter()
                    .enumerate()
                    .map(|(i, w)| LaneRecord::driving(&format!("-{}", i + 1), *w))
                    .collect(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_single_lane_inflates_symmetrically() {
        let network = RoadNetwork {
            name: None,
            roads: vec![road_with(
                vec![GeometryPrimitive::line(0.0, 0.0, 0.0, 10.0)],
                &[3.5],
            )],
        };

        let bounds = BoundsCalculator::compute(&network).resolve();
        assert_relative_eq!(bounds.min_x, -3.5);
        assert_relative_eq!(bounds.max_x, 13.5);
        assert_relative_eq!(bounds.min_y, -3.5);
        assert_relative_eq!(bounds.max_y, 3.5);
    }

    #[test]
    fn test_margins_accumulate_over_lanes_and_offset() {
        let mut road = road_with(
            vec![GeometryPrimitive::line(0.0, 0.0, 0.0, 10.0)],
            &[3.0, 2.0],
        );
        road.lane_offset = -0.5;
        let network = RoadNetwork {
            name: None,
            roads: vec![road],
        };

        let mut calculator = BoundsCalculator::new();
        calculator.accumulate(&network);
        assert_relative_eq!(calculator.margin(), 6.0);
    }

    #[test]
    fn test_empty_network_is_degenerate() {
        let outcome = BoundsCalculator::compute(&RoadNetwork::default());
        assert!(outcome.is_degenerate());
        assert_eq!(outcome.resolve(), MapBounds::FALLBACK);
    }

    #[test]
    fn test_lanes_without_geometry_stay_degenerate() {
        let network = RoadNetwork {
            name: None,
            roads: vec![road_with(Vec::new(), &[3.5])],
        };
        assert!(BoundsCalculator::compute(&network).is_degenerate());
    }

    #[test]
    fn test_endpoints_inside_bounds_for_all_headings() {
        let primitives: Vec<GeometryPrimitive> = (0..16)
            .map(|i| {
                let heading = i as f64 * std::f64::consts::PI / 8.0;
                GeometryPrimitive::line(i as f64 * 3.0, -(i as f64), heading, 5.0 + i as f64)
            })
            .collect();
        let network = RoadNetwork {
            name: None,
            roads: vec![road_with(primitives.clone(), &[])],
        };

        let bounds = BoundsCalculator::compute(&network).resolve();
        assert!(bounds.min_x <= bounds.max_x);
        assert!(bounds.min_y <= bounds.max_y);
        for primitive in &primitives {
            let (start, end) = (primitive.start(), primitive.end());
            assert!(bounds.contains(start.x, start.y));
            assert!(bounds.contains(end.x, end.y));
        }
    }

    #[test]
    fn test_merge_ignores_degenerate_documents() {
        let measured = BoundsOutcome::Measured(MapBounds {
            min_x: 5.0,
            max_x: 6.0,
            min_y: 5.0,
            max_y: 6.0,
        });
        let merged = measured.merge(BoundsOutcome::Degenerate);
        assert_eq!(merged, measured);
        assert!(BoundsOutcome::Degenerate
            .merge(BoundsOutcome::Degenerate)
            .is_degenerate());
    }
}
