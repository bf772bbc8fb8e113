//! Affine Transformation Welt → Raster/Graph-lokal (nur Translation).

use glam::DVec2;

use super::bounds::MapBounds;

/// Homogene 3×3-Matrix, zeilenweise gespeichert.
///
/// Aktuell reine Translation um `(-min_x, -min_y)`. Die Raster-Auflösung ist
/// nicht enthalten und muss beim Umrechnen in Zellindizes separat bekannt sein.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformMatrix {
    pub rows: [[f64; 3]; 3],
}

impl TransformMatrix {
    /// Matrix, die `(min_x, min_y)` auf den Ursprung abbildet.
    pub fn from_bounds(bounds: &MapBounds) -> Self {
        Self::translation(-bounds.min_x, -bounds.min_y)
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            rows: [[1.0, 0.0, tx], [0.0, 1.0, ty], [0.0, 0.0, 1.0]],
        }
    }

    /// Wendet die Matrix auf einen Weltpunkt an.
    pub fn apply(&self, point: DVec2) -> DVec2 {
        let m = &self.rows;
        let x = m[0][0] * point.x + m[0][1] * point.y + m[0][2];
        let y = m[1][0] * point.x + m[1][1] * point.y + m[1][2];
        let w = m[2][0] * point.x + m[2][1] * point.y + m[2][2];
        DVec2::new(x / w, y / w)
    }

    /// Matrix als flaches Array (zeilenweise) für den Export.
    pub fn to_row_major(&self) -> [f64; 9] {
        let mut out = [0.0; 9];
        for (i, row) in self.rows.iter().enumerate() {
            out[i * 3..i * 3 + 3].copy_from_slice(row);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_corner_maps_to_origin() {
        let bounds = MapBounds {
            min_x: -3.5,
            max_x: 13.5,
            min_y: -3.5,
            max_y: 3.5,
        };
        let transform = TransformMatrix::from_bounds(&bounds);
        assert_eq!(transform.apply(DVec2::new(-3.5, -3.5)), DVec2::ZERO);

        let far = transform.apply(DVec2::new(bounds.max_x, bounds.max_y));
        assert!(far.x >= 0.0 && far.y >= 0.0);
    }

    #[test]
    fn test_row_major_layout() {
        let transform = TransformMatrix::translation(2.0, -4.0);
        assert_eq!(
            transform.to_row_major(),
            [1.0, 0.0, 2.0, 0.0, 1.0, -4.0, 0.0, 0.0, 1.0]
        );
    }
}
