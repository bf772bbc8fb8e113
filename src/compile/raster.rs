//! Rasterisierung der Spurflächen in Befahrbarkeits- und Höhenraster.
//!
//! Beide Raster teilen sich eine Traversierung: pro Straße und Primitiv wird
//! die Referenzlinie in Schritten der Rasterauflösung abgelaufen, an jedem
//! Schritt werden für jede befahrbare Spur Querversätze von `-width` bis
//! `+width` abgetastet.

use glam::DVec2;

use crate::core::{GeometryPrimitive, HeightGrid, OccupancyGrid, RoadNetwork};
use crate::shared::CompilerOptions;

/// Zähler für geschriebene und verworfene Abtastpunkte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    /// Punkte, die auf eine Rasterzelle gefallen sind
    pub samples_written: usize,
    /// Punkte außerhalb des Rasters (still verworfen)
    pub samples_dropped: usize,
}

impl RasterStats {
    fn record(&mut self, hit: bool) {
        if hit {
            self.samples_written += 1;
        } else {
            self.samples_dropped += 1;
        }
    }
}

/// Längsschritte `0..floor(length / step)`; das Primitiv-Ende selbst wird
/// nicht abgetastet. 0 bei ungültigen Werten.
fn along_count(length: f64, step: f64) -> usize {
    let steps = length / step;
    if steps.is_finite() && steps >= 0.0 {
        steps.floor() as usize
    } else {
        0
    }
}

/// Querschritte `0..=floor(span / step)`, beide Ränder eingeschlossen.
fn across_count(span: f64, step: f64) -> usize {
    let steps = span / step;
    if steps.is_finite() && steps >= 0.0 {
        steps.floor() as usize + 1
    } else {
        0
    }
}

/// Abtastpunkte einer Spur entlang eines Primitivs.
///
/// Längs: `s = i * resolution` für `i = 0..floor(length / resolution)`.
/// Quer: `w = -width + k * resolution` für `k = 0..=floor(2 * width / resolution)`,
/// projiziert mit `(x + w * sin h, y - w * cos h)`.
pub fn lane_samples(
    primitive: &GeometryPrimitive,
    width: f64,
    resolution: f64,
) -> impl Iterator<Item = DVec2> + '_ {
    let half = width.abs();
    let lateral = primitive.lateral();
    let along = along_count(primitive.length, resolution);
    let across = across_count(2.0 * half, resolution);

    (0..along).flat_map(move |i| {
        let center = primitive.point_at(i as f64 * resolution);
        (0..across).map(move |k| center + lateral * (-half + k as f64 * resolution))
    })
}

/// Schreibt alle befahrbaren Spuren eines Dokuments in beide Raster.
///
/// Befahrbarkeit: Spurtyp in `options.drivable_lane_types` und Breite ≠ 0.
/// Das Höhenraster erhält die konstante Höhe des Primitivs; Primitive ohne
/// Höhenangabe schreiben nur ins Befahrbarkeitsraster. Bei Überlappung gewinnt
/// das zuletzt bearbeitete Primitiv (Dokumentreihenfolge).
pub fn rasterize_network(
    network: &RoadNetwork,
    options: &CompilerOptions,
    occupancy: &mut OccupancyGrid,
    height: &mut HeightGrid,
) -> RasterStats {
    let resolution = occupancy.grid().geometry().resolution;
    let mut stats = RasterStats::default();

    for road in &network.roads {
        let widths: Vec<f64> = road
            .lanes()
            .filter(|lane| options.is_drivable(&lane.lane_type))
            .map(|lane| lane.width_or_zero())
            .filter(|width| *width != 0.0 && width.is_finite())
            .collect();
        if widths.is_empty() {
            continue;
        }

        for primitive in &road.geometry {
            let elevation = road.elevation_for(primitive);

            for &width in &widths {
                for point in lane_samples(primitive, width, resolution) {
                    stats.record(occupancy.mark(point));
                    if let Some(z) = elevation {
                        height.write(point, z);
                    }
                }
            }
        }
    }

    log::trace!(
        "Raster: {} Abtastpunkte geschrieben, {} außerhalb",
        stats.samples_written,
        stats.samples_dropped
    );
    stats
}
